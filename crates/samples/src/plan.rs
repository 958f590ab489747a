//! Turns an endpoint catalog into concrete comparison cases.

use std::collections::BTreeMap;

use apiparity_engine::{EndpointRequest, HttpMethod, StatusScenario, SweepCase};
use serde::Deserialize;

use crate::error::SampleError;
use crate::payload::{create_payload, update_payload};
use crate::source::SampleCache;
use crate::template::{expand_path, is_parameterized, probe_path, NIL_GID};

const CATALOG: &str = include_str!("catalog.toml");

/// One catalog entry: a method and a path template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndpointSpec {
    pub method: HttpMethod,
    /// Path template, e.g. `/projects/{project_gid}`.
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Explicit request body; write methods get a synthesized one otherwise.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

impl EndpointSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    /// Leave DELETE endpoints out.
    pub skip_destructive: bool,
    /// Add a nil-identifier probe after each parameterized GET.
    pub probe_not_found: bool,
    /// `limit` for list GETs that carry no params of their own.
    pub list_limit: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            skip_destructive: false,
            probe_not_found: true,
            list_limit: 5,
        }
    }
}

/// A catalog entry that produced no case.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCase {
    pub method: HttpMethod,
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub cases: Vec<SweepCase>,
    pub skipped: Vec<SkippedCase>,
}

impl Plan {
    fn skip(&mut self, spec: &EndpointSpec, reason: String) {
        log::warn!("skipping {} {}: {reason}", spec.method, spec.path);
        self.skipped.push(SkippedCase {
            method: spec.method,
            path: spec.path.clone(),
            reason,
        });
    }
}

/// Expand every spec into a request, in catalog order. Probes follow the
/// endpoint they were derived from.
pub fn build_cases(specs: &[EndpointSpec], cache: &SampleCache, options: &PlanOptions) -> Plan {
    let mut plan = Plan::default();

    for spec in specs {
        if options.skip_destructive && spec.method.is_destructive() {
            plan.skip(spec, "destructive".to_string());
            continue;
        }

        match expand_path(&spec.path, cache) {
            Ok(path) => {
                let request = build_request(spec, path, cache, options);
                plan.cases.push(SweepCase::endpoint(request));
            }
            Err(name) => plan.skip(spec, format!("no sample key for {{{name}}}")),
        }

        if options.probe_not_found && spec.method == HttpMethod::Get {
            match probe_path(&spec.path, cache) {
                Some(Ok(path)) => plan
                    .cases
                    .push(SweepCase::not_found_probe(EndpointRequest::get(path))),
                Some(Err(name)) => {
                    log::debug!("no not-found probe for {}: {{{name}}} unresolved", spec.path)
                }
                None => {}
            }
        }
    }

    plan
}

fn build_request(
    spec: &EndpointSpec,
    path: String,
    cache: &SampleCache,
    options: &PlanOptions,
) -> EndpointRequest {
    let mut request = EndpointRequest::new(spec.method, path);
    request.params = spec.params.clone();

    match spec.method {
        HttpMethod::Get => {
            if !is_parameterized(&spec.path) && request.params.is_empty() {
                request
                    .params
                    .insert("limit".to_string(), options.list_limit.to_string());
            }
            for filter in ["workspace", "team"] {
                if !spec.path.contains(filter) || request.params.contains_key(filter) {
                    continue;
                }
                if let Some(gid) = cache.first(filter) {
                    request.params.insert(filter.to_string(), gid.to_string());
                }
            }
        }
        HttpMethod::Post => {
            request.body = Some(
                spec.body
                    .clone()
                    .unwrap_or_else(|| create_payload(&spec.path, cache)),
            );
        }
        HttpMethod::Put | HttpMethod::Patch => {
            request.body = Some(spec.body.clone().unwrap_or_else(update_payload));
        }
        HttpMethod::Delete => {}
    }

    request
}

/// Representative routes, used when a run config lists no endpoints.
pub fn default_catalog() -> Result<Vec<EndpointSpec>, SampleError> {
    #[derive(Deserialize)]
    struct Catalog {
        endpoints: Vec<EndpointSpec>,
    }

    let catalog: Catalog =
        toml::from_str(CATALOG).map_err(|e| SampleError::Catalog(e.to_string()))?;
    Ok(catalog.endpoints)
}

/// Status scenarios run when a config lists none.
pub fn default_scenarios() -> Vec<StatusScenario> {
    vec![
        StatusScenario::get("List workspaces", "/workspaces", 200),
        StatusScenario::get("Current user", "/users/me", 200),
        StatusScenario::get(
            "Unknown project",
            &format!("/projects/{NIL_GID}"),
            404,
        ),
        StatusScenario::get("Malformed task identifier", "/tasks/invalid-gid", 404),
    ]
}
