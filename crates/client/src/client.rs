use std::thread;
use std::time::Duration;

use apiparity_engine::{ComparisonTarget, EndpointRequest, HttpMethod, RawResponse, Transport};
use serde_json::{json, Value};

// ── Constants ───────────────────────────────────────────────────────

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const USER_AGENT: &str = concat!("apiparity/", env!("CARGO_PKG_VERSION"));

// ── Errors ──────────────────────────────────────────────────────────

/// Failure to set up the transport. Individual calls never error.
#[derive(Debug)]
pub enum ClientError {
    /// The underlying HTTP client could not be built (TLS backend, etc.)
    Build(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Build(msg) => write!(f, "cannot build HTTP client: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

// ── HttpTransport ───────────────────────────────────────────────────

/// Blocking transport with a fixed per-call timeout.
///
/// Transport failures (refused, timeout, DNS) become status 0. With
/// `retries > 0` a failed call is retried after an exponential backoff;
/// HTTP error statuses are never retried since they are outcomes to compare.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            timeout,
            retries: 0,
            backoff: Duration::from_secs(1),
        })
    }

    pub fn with_default_timeout() -> Result<Self, ClientError> {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Extra attempts after a transport failure, starting at `backoff`
    /// and doubling each time.
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    fn build(
        &self,
        target: &ComparisonTarget,
        request: &EndpointRequest,
    ) -> reqwest::blocking::RequestBuilder {
        let url = target.url_for(&request.path);
        let mut req = match request.method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
            HttpMethod::Put => self.http.put(&url),
            HttpMethod::Patch => self.http.patch(&url),
            HttpMethod::Delete => self.http.delete(&url),
        };

        for (name, value) in &target.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !request.params.is_empty() {
            req = req.query(&request.params);
        }
        // Sent on any method, DELETE included, so both targets see one request.
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        req
    }

    fn send_once(&self, target: &ComparisonTarget, request: &EndpointRequest) -> RawResponse {
        let resp = match self.build(target, request).send() {
            Ok(resp) => resp,
            Err(e) => return RawResponse::transport_failure(self.describe(&e)),
        };

        let status = resp.status().as_u16();
        match resp.text() {
            Ok(text) => RawResponse::new(status, decode_body(&text)),
            Err(e) => RawResponse {
                status_code: status,
                body: Some(json!({ "raw": "" })),
                error: Some(format!("failed to read response body: {e}")),
            },
        }
    }

    fn describe(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("timed out after {}s: {e}", self.timeout.as_secs_f64())
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, target: &ComparisonTarget, request: &EndpointRequest) -> RawResponse {
        let mut backoff = self.backoff;
        let mut attempt = 0;

        loop {
            let resp = self.send_once(target, request);
            if !resp.is_transport_failure() || attempt >= self.retries {
                return resp;
            }
            attempt += 1;
            log::warn!(
                "{} {} {}: retry {}/{} in {:?} ({})",
                target.name,
                request.method,
                request.path,
                attempt,
                self.retries,
                backoff,
                resp.error.as_deref().unwrap_or("transport failure"),
            );
            thread::sleep(backoff);
            backoff *= 2;
        }
    }
}

/// Parse a response body as JSON; anything else becomes `{"raw": text}`.
pub fn decode_body(text: &str) -> Value {
    let trimmed = text.trim_start_matches('\u{feff}');
    serde_json::from_str(trimmed).unwrap_or_else(|_| json!({ "raw": text }))
}

// ── Tests ───────────────────────────────────────────────────────────
