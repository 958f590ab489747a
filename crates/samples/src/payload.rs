// Request bodies for write operations.

use serde_json::{json, Value};

use crate::source::SampleCache;

/// Minimal create body for the resource a POST path targets, wrapped in
/// the `{"data": ...}` envelope. The first matching resource word wins.
pub fn create_payload(path: &str, cache: &SampleCache) -> Value {
    let workspace = || gid_or_null(cache, "workspace");

    let data = if path.contains("project") {
        json!({"name": "Test Project", "workspace": workspace()})
    } else if path.contains("task") {
        json!({"name": "Test Task", "workspace": workspace()})
    } else if path.contains("goal") {
        json!({"name": "Test Goal", "workspace": workspace()})
    } else if path.contains("portfolio") {
        json!({"name": "Test Portfolio", "workspace": workspace()})
    } else if path.contains("tag") {
        json!({"name": "Test Tag", "workspace": workspace()})
    } else if path.contains("team") {
        json!({"name": "Test Team", "organization": workspace()})
    } else if path.contains("section") {
        json!({"name": "Test Section"})
    } else if path.contains("stor") {
        json!({"text": "Test story"})
    } else if path.contains("webhook") {
        json!({
            "resource": gid_or_null(cache, "project"),
            "target": "https://example.com/webhook",
        })
    } else {
        json!({"name": "Test Resource"})
    };

    json!({ "data": data })
}

pub fn update_payload() -> Value {
    json!({"data": {"name": "Updated Name"}})
}

fn gid_or_null(cache: &SampleCache, kind: &str) -> Value {
    cache
        .first(kind)
        .map(|gid| Value::String(gid.to_string()))
        .unwrap_or(Value::Null)
}
