use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::differ::StructuralDelta;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Methods that remove data on the target.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// One logical request, issued identically against both targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRequest {
    pub method: HttpMethod,
    /// Path relative to the target's base URL, e.g. `/projects/123`.
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl EndpointRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

// ---------------------------------------------------------------------------
// Targets + raw responses
// ---------------------------------------------------------------------------

/// An HTTP base URL plus default headers. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonTarget {
    pub name: String,
    pub base_url: String,
    pub headers: BTreeMap<String, String>,
}

impl ComparisonTarget {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {token}"))
    }

    /// Absolute URL for a logical path: plain concatenation of base and path.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

/// Result of one HTTP call. `status_code == 0` marks a transport failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: Option<Value>,
    pub error: Option<String>,
}

impl RawResponse {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body: Some(body),
            error: None,
        }
    }

    pub fn transport_failure(error: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            body: None,
            error: Some(error.into()),
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status_code == 0
    }

    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Regular endpoint comparison.
    #[default]
    Endpoint,
    /// Same route with a nonexistent identifier; only status parity matters.
    NotFoundProbe,
}

/// Result of comparing one endpoint across both targets.
///
/// `body_diff`, `missing_fields` and `extra_fields` are either all present
/// (both statuses were 200 and bodies were compared) or all absent.
/// Absent serializes as `null`, which is distinct from an empty diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub endpoint: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub kind: OutcomeKind,
    pub local_status: u16,
    pub reference_status: u16,
    pub status_match: bool,
    pub body_diff: Option<StructuralDelta>,
    pub missing_fields: Option<BTreeSet<String>>,
    pub extra_fields: Option<BTreeSet<String>>,
    pub overall_match: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_body: Option<Value>,
}

impl ComparisonOutcome {
    /// True when bodies were compared (both targets answered 200).
    pub fn body_compared(&self) -> bool {
        self.body_diff.is_some()
    }

    pub fn has_value_differences(&self) -> bool {
        self.body_diff.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// The match verdict implied by the other fields.
    pub fn derived_match(&self) -> bool {
        self.status_match
            && !self.has_value_differences()
            && self.missing_fields.as_ref().map_or(true, BTreeSet::is_empty)
            && self.extra_fields.as_ref().map_or(true, BTreeSet::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Summary + Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "total_tests")]
    pub total: usize,
    pub matches: usize,
    #[serde(rename = "differences")]
    pub mismatches: usize,
}

/// The persisted artifact of a run. Its JSON shape is a stable contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub timestamp: String,
    pub summary: Summary,
    pub results: Vec<ComparisonOutcome>,
}
