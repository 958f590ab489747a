// Run configuration loading

pub mod credentials;
pub mod error;
pub mod run;

pub use credentials::{lookup_token, TokenLookup, TokenSource};
pub use apiparity_samples::EndpointSpec;
pub use error::ConfigError;
pub use run::{RunConfig, RunSettings, SampleSettings, TargetConfig};
