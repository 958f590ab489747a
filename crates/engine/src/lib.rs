//! `apiparity-engine`: response parity engine.
//!
//! Pure engine crate: receives raw responses through the [`Transport`]
//! seam, returns comparison outcomes, summaries and remediation advice.
//! No HTTP client, no CLI. The only I/O is reading and writing report files.

pub mod aggregate;
pub mod compare;
pub mod differ;
pub mod error;
pub mod keypath;
pub mod model;
pub mod normalize;
pub mod remediation;
pub mod scenario;
pub mod sweep;

pub use aggregate::{load_report, write_json_atomic, ResultAggregator};
pub use compare::{unwrap_envelope, BodyComparison, EndpointComparator, Transport};
pub use differ::{diff, Change, ChangeKind, StructuralDelta};
pub use error::ReportError;
pub use keypath::collect_key_paths;
pub use model::{
    ComparisonOutcome, ComparisonReport, ComparisonTarget, EndpointRequest, HttpMethod,
    OutcomeKind, RawResponse, Summary,
};
pub use normalize::{normalize, IgnoreFieldSet, Normalizer, DEFAULT_IGNORE_FIELDS};
pub use remediation::{analyze, Analysis, Issue};
pub use scenario::{run_scenarios, ScenarioReport, ScenarioResult, StatusScenario};
pub use sweep::{CancelFlag, Sweep, SweepCase, SweepStats};
