//! Expected-status checks: both targets must return the same, expected code.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::write_json_atomic;
use crate::compare::{EndpointComparator, Transport};
use crate::error::ReportError;
use crate::model::{EndpointRequest, HttpMethod};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusScenario {
    pub description: String,
    pub method: HttpMethod,
    pub path: String,
    pub expected_status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl StatusScenario {
    pub fn get(description: &str, path: &str, expected_status: u16) -> Self {
        Self {
            description: description.to_string(),
            method: HttpMethod::Get,
            path: path.to_string(),
            expected_status,
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub description: String,
    pub method: HttpMethod,
    pub endpoint: String,
    pub expected_status: u16,
    pub local_status: u16,
    pub reference_status: u16,
    pub status_match: bool,
    pub expected_match: bool,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.status_match && self.expected_match
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub timestamp: String,
    pub total: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub details: Vec<ScenarioResult>,
}

impl ScenarioReport {
    pub fn persist(&self, path: &Path) -> Result<(), ReportError> {
        write_json_atomic(path, self)
    }
}

pub fn run_scenarios<T: Transport>(
    comparator: &EndpointComparator<T>,
    scenarios: &[StatusScenario],
) -> ScenarioReport {
    let details: Vec<ScenarioResult> = scenarios
        .iter()
        .map(|sc| {
            let request = EndpointRequest {
                method: sc.method,
                path: sc.path.clone(),
                params: Default::default(),
                body: sc.body.clone(),
            };
            let (local, reference) = comparator.fetch_both(&request);
            let result = ScenarioResult {
                description: sc.description.clone(),
                method: sc.method,
                endpoint: sc.path.clone(),
                expected_status: sc.expected_status,
                local_status: local.status_code,
                reference_status: reference.status_code,
                // Plain equality: a 0/0 pair still fails expected_match.
                status_match: local.status_code == reference.status_code,
                expected_match: local.status_code == sc.expected_status
                    && reference.status_code == sc.expected_status,
            };
            if !result.passed() {
                log::warn!(
                    "{}: local={} reference={} expected={}",
                    sc.description,
                    result.local_status,
                    result.reference_status,
                    sc.expected_status
                );
            }
            result
        })
        .collect();

    let matches = details.iter().filter(|r| r.passed()).count();
    ScenarioReport {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        total: details.len(),
        matches,
        mismatches: details.len() - matches,
        details,
    }
}
