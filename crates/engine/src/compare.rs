use std::collections::{BTreeMap, BTreeSet};
use std::thread;

use serde_json::Value;

use crate::differ::{diff, StructuralDelta};
use crate::keypath::collect_key_paths;
use crate::model::{
    ComparisonOutcome, ComparisonTarget, EndpointRequest, HttpMethod, OutcomeKind, RawResponse,
};
use crate::normalize::Normalizer;

/// Sends one request to one target.
///
/// Implementations never fail: a transport problem becomes a
/// [`RawResponse`] with `status_code == 0` and an error string.
pub trait Transport: Send + Sync {
    fn send(&self, target: &ComparisonTarget, request: &EndpointRequest) -> RawResponse;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, target: &ComparisonTarget, request: &EndpointRequest) -> RawResponse {
        (**self).send(target, request)
    }
}

/// `{"data": x, ...}` yields `x`; any other value yields itself.
pub fn unwrap_envelope(body: &Value) -> &Value {
    match body {
        Value::Object(map) => match map.get("data") {
            Some(inner) => inner,
            None => body,
        },
        _ => body,
    }
}

/// Orchestrates one comparison between the local and reference targets.
pub struct EndpointComparator<T> {
    transport: T,
    local: ComparisonTarget,
    reference: ComparisonTarget,
    normalizer: Normalizer,
}

impl<T: Transport> EndpointComparator<T> {
    pub fn new(transport: T, local: ComparisonTarget, reference: ComparisonTarget) -> Self {
        Self {
            transport,
            local,
            reference,
            normalizer: Normalizer::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn local(&self) -> &ComparisonTarget {
        &self.local
    }

    pub fn reference(&self) -> &ComparisonTarget {
        &self.reference
    }

    pub fn compare(
        &self,
        method: HttpMethod,
        path: &str,
        params: BTreeMap<String, String>,
        body: Option<Value>,
    ) -> ComparisonOutcome {
        let request = EndpointRequest {
            method,
            path: path.to_string(),
            params,
            body,
        };
        self.compare_request(&request, OutcomeKind::Endpoint)
    }

    pub fn compare_request(
        &self,
        request: &EndpointRequest,
        kind: OutcomeKind,
    ) -> ComparisonOutcome {
        let (local, reference) = self.fetch_both(request);
        log::debug!(
            "{} {}: local={} reference={}",
            request.method,
            request.path,
            local.status_code,
            reference.status_code
        );
        self.assemble(request, kind, local, reference)
    }

    /// Issue the request against both targets concurrently.
    /// Returns `(local, reference)`.
    pub fn fetch_both(&self, request: &EndpointRequest) -> (RawResponse, RawResponse) {
        thread::scope(|s| {
            let reference = s.spawn(|| self.transport.send(&self.reference, request));
            let local = s.spawn(|| self.transport.send(&self.local, request));
            let local = local
                .join()
                .unwrap_or_else(|_| RawResponse::transport_failure("local request panicked"));
            let reference = reference
                .join()
                .unwrap_or_else(|_| RawResponse::transport_failure("reference request panicked"));
            (local, reference)
        })
    }

    /// Outcome for a request that never produced responses.
    pub(crate) fn failed_outcome(
        &self,
        request: &EndpointRequest,
        kind: OutcomeKind,
        error: &str,
    ) -> ComparisonOutcome {
        self.assemble(
            request,
            kind,
            RawResponse::transport_failure(error),
            RawResponse::transport_failure(error),
        )
    }

    fn assemble(
        &self,
        request: &EndpointRequest,
        kind: OutcomeKind,
        local: RawResponse,
        reference: RawResponse,
    ) -> ComparisonOutcome {
        // Status 0 never counts as agreement, even when both sides failed.
        let status_match = local.status_code == reference.status_code
            && !local.is_transport_failure()
            && !reference.is_transport_failure();

        let bodies = if local.is_ok() && reference.is_ok() {
            Some(self.compare_bodies(
                reference.body.as_ref().unwrap_or(&Value::Null),
                local.body.as_ref().unwrap_or(&Value::Null),
            ))
        } else {
            None
        };

        let (body_diff, missing_fields, extra_fields) = match bodies {
            Some(b) => (Some(b.delta), Some(b.missing), Some(b.extra)),
            None => (None, None, None),
        };

        let mut outcome = ComparisonOutcome {
            endpoint: request.path.clone(),
            method: request.method,
            kind,
            local_status: local.status_code,
            reference_status: reference.status_code,
            status_match,
            body_diff,
            missing_fields,
            extra_fields,
            overall_match: false,
            local_error: local.error,
            reference_error: reference.error,
            local_body: local.body,
            reference_body: reference.body,
        };
        outcome.overall_match = outcome.derived_match();
        outcome
    }

    /// Key-path sets and value diff on the unwrapped, normalized bodies.
    pub fn compare_bodies(&self, reference: &Value, local: &Value) -> BodyComparison {
        let reference = self.normalizer.normalize(unwrap_envelope(reference));
        let local = self.normalizer.normalize(unwrap_envelope(local));

        let ref_paths = collect_key_paths(&reference, "");
        let local_paths = collect_key_paths(&local, "");

        BodyComparison {
            missing: ref_paths.difference(&local_paths).cloned().collect(),
            extra: local_paths.difference(&ref_paths).cloned().collect(),
            delta: diff(&reference, &local),
        }
    }
}

/// Both views of a body comparison. They overlap on purpose: a missing
/// field usually also shows up as a `removed` change.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyComparison {
    pub missing: BTreeSet<String>,
    pub extra: BTreeSet<String>,
    pub delta: StructuralDelta,
}

impl BodyComparison {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.delta.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Canned responses keyed by target name.
    pub(crate) struct FixedTransport {
        pub local: RawResponse,
        pub reference: RawResponse,
        pub seen: Mutex<Vec<(String, EndpointRequest)>>,
    }

    impl FixedTransport {
        pub(crate) fn new(local: RawResponse, reference: RawResponse) -> Self {
            Self {
                local,
                reference,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for FixedTransport {
        fn send(&self, target: &ComparisonTarget, request: &EndpointRequest) -> RawResponse {
            self.seen
                .lock()
                .unwrap()
                .push((target.name.clone(), request.clone()));
            if target.name == "local" {
                self.local.clone()
            } else {
                self.reference.clone()
            }
        }
    }

    pub(crate) fn comparator(
        local: RawResponse,
        reference: RawResponse,
    ) -> EndpointComparator<FixedTransport> {
        EndpointComparator::new(
            FixedTransport::new(local, reference),
            ComparisonTarget::new("local", "http://local"),
            ComparisonTarget::new("reference", "http://reference"),
        )
    }

    /// Panics when asked to reach the named target.
    pub(crate) struct PanickingTransport {
        pub fails: &'static str,
    }

    impl Transport for PanickingTransport {
        fn send(&self, target: &ComparisonTarget, _request: &EndpointRequest) -> RawResponse {
            if target.name == self.fails {
                panic!("transport for {} blew up", target.name);
            }
            RawResponse::new(200, json!({"data": {"gid": "1"}}))
        }
    }

    pub(crate) fn panicking_comparator(
        fails: &'static str,
    ) -> EndpointComparator<PanickingTransport> {
        EndpointComparator::new(
            PanickingTransport { fails },
            ComparisonTarget::new("local", "http://local"),
            ComparisonTarget::new("reference", "http://reference"),
        )
    }

    fn get(c: &EndpointComparator<FixedTransport>) -> ComparisonOutcome {
        c.compare(HttpMethod::Get, "/projects/1", BTreeMap::new(), None)
    }

    #[test]
    fn envelope_unwrap_two_branches() {
        assert_eq!(unwrap_envelope(&json!({"data": [1]})), &json!([1]));
        assert_eq!(unwrap_envelope(&json!({"name": "x"})), &json!({"name": "x"}));
        assert_eq!(unwrap_envelope(&json!([1, 2])), &json!([1, 2]));
        assert_eq!(unwrap_envelope(&json!({"data": null})), &Value::Null);
    }

    #[test]
    fn volatile_fields_do_not_fail_the_match() {
        let c = comparator(
            RawResponse::new(200, json!({"gid": "2", "name": "Foo"})),
            RawResponse::new(200, json!({"gid": "1", "name": "Foo"})),
        );
        let o = get(&c);
        assert!(o.body_diff.as_ref().unwrap().is_empty());
        assert!(o.missing_fields.as_ref().unwrap().is_empty());
        assert!(o.extra_fields.as_ref().unwrap().is_empty());
        assert!(o.overall_match);
    }

    #[test]
    fn missing_field_is_reported() {
        let c = comparator(
            RawResponse::new(200, json!({"name": "Foo"})),
            RawResponse::new(200, json!({"name": "Foo", "color": "blue"})),
        );
        let o = get(&c);
        assert_eq!(o.missing_fields.unwrap(), BTreeSet::from(["color".to_string()]));
        assert!(o.extra_fields.unwrap().is_empty());
        assert!(!o.overall_match);
    }

    #[test]
    fn extra_field_is_reported() {
        let c = comparator(
            RawResponse::new(200, json!({"name": "Foo", "extra": 1})),
            RawResponse::new(200, json!({"name": "Foo"})),
        );
        let o = get(&c);
        assert_eq!(o.extra_fields.unwrap(), BTreeSet::from(["extra".to_string()]));
        assert!(o.missing_fields.unwrap().is_empty());
        assert!(!o.overall_match);
    }

    #[test]
    fn both_not_found_skips_body_comparison() {
        let c = comparator(
            RawResponse::new(404, json!({"errors": [{"message": "a"}]})),
            RawResponse::new(404, json!({"errors": [{"message": "b"}]})),
        );
        let o = get(&c);
        assert!(o.status_match);
        assert!(o.body_diff.is_none());
        assert!(o.missing_fields.is_none());
        assert!(o.overall_match);
    }

    #[test]
    fn status_mismatch_fails_without_body_comparison() {
        let c = comparator(
            RawResponse::new(200, json!({"data": {}})),
            RawResponse::new(404, json!({"errors": []})),
        );
        let o = get(&c);
        assert!(!o.status_match);
        assert!(o.body_diff.is_none());
        assert!(!o.overall_match);
    }

    #[test]
    fn reordered_list_matches() {
        let c = comparator(
            RawResponse::new(200, json!({"data": [{"name": "B"}, {"name": "A"}]})),
            RawResponse::new(200, json!({"data": [{"name": "A"}, {"name": "B"}]})),
        );
        let o = get(&c);
        assert!(o.overall_match);
    }

    #[test]
    fn transport_failure_is_a_recorded_mismatch() {
        let c = comparator(
            RawResponse::transport_failure("connection refused"),
            RawResponse::new(200, json!({"data": {}})),
        );
        let o = get(&c);
        assert_eq!(o.local_status, 0);
        assert_eq!(o.local_error.as_deref(), Some("connection refused"));
        assert!(!o.overall_match);
    }

    #[test]
    fn both_sides_unreachable_is_not_a_match() {
        let c = comparator(
            RawResponse::transport_failure("timed out"),
            RawResponse::transport_failure("connection refused"),
        );
        let o = get(&c);
        assert!(!o.status_match);
        assert!(!o.overall_match);
        assert_eq!(o.reference_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn envelope_is_unwrapped_per_side() {
        let c = comparator(
            RawResponse::new(200, json!({"name": "Foo"})),
            RawResponse::new(200, json!({"data": {"name": "Foo"}})),
        );
        assert!(get(&c).overall_match);
    }

    #[test]
    fn both_targets_receive_the_same_request() {
        let c = comparator(RawResponse::new(200, json!({})), RawResponse::new(200, json!({})));
        let mut params = BTreeMap::new();
        params.insert("limit".to_string(), "5".to_string());
        c.compare(HttpMethod::Post, "/tasks", params, Some(json!({"data": {"name": "t"}})));
        let seen = c.transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, seen[1].1);
        let mut names: Vec<_> = seen.iter().map(|(n, _)| n.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["local", "reference"]);
    }

    #[test]
    fn local_side_panic_becomes_transport_failure() {
        let c = panicking_comparator("local");
        let o = c.compare(HttpMethod::Get, "/projects/1", BTreeMap::new(), None);
        assert_eq!(o.local_status, 0);
        assert_eq!(o.reference_status, 200);
        assert_eq!(o.local_error.as_deref(), Some("local request panicked"));
        assert!(!o.status_match);
        assert!(!o.overall_match);
    }

    #[test]
    fn reference_side_panic_becomes_transport_failure() {
        let c = panicking_comparator("reference");
        let o = c.compare(HttpMethod::Get, "/projects/1", BTreeMap::new(), None);
        assert_eq!(o.local_status, 200);
        assert_eq!(o.reference_status, 0);
        assert_eq!(o.reference_error.as_deref(), Some("reference request panicked"));
        assert!(!o.overall_match);
    }
}
