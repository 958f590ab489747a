//! `apiparity-samples`: realistic inputs for endpoint comparisons.
//!
//! Read-only sample identifiers (SQLite or static lists), path-template
//! expansion, request payload synthesis, and the case planner that turns
//! an endpoint catalog into comparison cases.

pub mod error;
pub mod payload;
pub mod plan;
pub mod source;
pub mod template;

pub use error::SampleError;
pub use plan::{
    build_cases, default_catalog, default_scenarios, EndpointSpec, Plan, PlanOptions, SkippedCase,
};
pub use source::{SampleCache, SampleKeySource, SqliteSamples, StaticSamples, RESOURCE_TABLES};
pub use template::{expand_path, placeholders, probe_path, NIL_GID};
