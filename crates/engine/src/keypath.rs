use std::collections::BTreeSet;

use serde_json::Value;

/// Flatten `value` into every key path it contains (`a.b`, `a[0].b`).
///
/// A mapping emits one path per key and recurses into container values.
/// A sequence emits nothing for itself and recurses per index.
pub fn collect_key_paths(value: &Value, prefix: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect_into(value, prefix, &mut out);
    out
}

fn collect_into(value: &Value, prefix: &str, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = join_key(prefix, key);
                if child.is_object() || child.is_array() {
                    collect_into(child, &path, out);
                }
                out.insert(path);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_into(child, &join_index(prefix, i), out);
            }
        }
        _ => {}
    }
}

pub(crate) fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

pub(crate) fn join_index(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

/// Paths present in `reference` but not in `local`.
pub fn missing_fields(reference: &Value, local: &Value) -> BTreeSet<String> {
    let r = collect_key_paths(reference, "");
    let l = collect_key_paths(local, "");
    r.difference(&l).cloned().collect()
}

/// Paths present in `local` but not in `reference`.
pub fn extra_fields(reference: &Value, local: &Value) -> BTreeSet<String> {
    let r = collect_key_paths(reference, "");
    let l = collect_key_paths(local, "");
    l.difference(&r).cloned().collect()
}
