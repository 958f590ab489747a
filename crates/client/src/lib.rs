//! HTTP transport for apiparity.
//!
//! Blocking reqwest client (no Tokio runtime required). Implements the
//! engine's [`Transport`](apiparity_engine::Transport) seam: every call
//! resolves to a `RawResponse`, never to an error.

mod client;

pub use client::{decode_body, ClientError, HttpTransport, DEFAULT_TIMEOUT_SECS, USER_AGENT};
