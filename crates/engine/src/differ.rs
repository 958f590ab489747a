//! Deep value diff between two normalized payloads.
//!
//! Mappings are compared key by key. Sequences are compared as multisets:
//! exact matches pair up regardless of position, then leftover containers
//! of the same shape are paired in order and diffed recursively.

use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::keypath::{join_index, join_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    TypeChanged,
    ValueChanged,
    /// Present only in the local payload.
    Added,
    /// Present only in the reference payload.
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeChanged => "type_changed",
            Self::ValueChanged => "value_changed",
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

/// One difference at one key path. `old_value` is the reference side,
/// `new_value` the local side; a JSON `null` is kept as `Some(Null)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub path: String,
    pub kind: ChangeKind,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub old_value: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub new_value: Option<Value>,
}

fn present_value<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

impl Change {
    fn removed(path: String, old: &Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Removed,
            old_value: Some(old.clone()),
            new_value: None,
        }
    }

    fn added(path: String, new: &Value) -> Self {
        Self {
            path,
            kind: ChangeKind::Added,
            old_value: None,
            new_value: Some(new.clone()),
        }
    }

    fn changed(path: String, kind: ChangeKind, old: &Value, new: &Value) -> Self {
        Self {
            path,
            kind,
            old_value: Some(old.clone()),
            new_value: Some(new.clone()),
        }
    }
}

/// Ordered list of changes. Empty means the payloads are equivalent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralDelta(Vec<Change>);

impl StructuralDelta {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.0.iter()
    }

    pub fn changes(&self) -> &[Change] {
        &self.0
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.0.iter().filter(|c| c.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a StructuralDelta {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Diff two already-normalized values. Field names get no special treatment.
pub fn diff(reference: &Value, local: &Value) -> StructuralDelta {
    let mut out = Vec::new();
    diff_into(reference, local, "", &mut out);
    StructuralDelta(out)
}

fn diff_into(reference: &Value, local: &Value, path: &str, out: &mut Vec<Change>) {
    match (reference, local) {
        (Value::Object(r), Value::Object(l)) => {
            for (key, rv) in r {
                let child = join_key(path, key);
                match l.get(key) {
                    Some(lv) => diff_into(rv, lv, &child, out),
                    None => out.push(Change::removed(child, rv)),
                }
            }
            for (key, lv) in l {
                if !r.contains_key(key) {
                    out.push(Change::added(join_key(path, key), lv));
                }
            }
        }
        (Value::Array(r), Value::Array(l)) => diff_unordered(r, l, path, out),
        _ if reference == local => {}
        _ if type_name(reference) != type_name(local) => {
            out.push(Change::changed(
                path.to_string(),
                ChangeKind::TypeChanged,
                reference,
                local,
            ));
        }
        _ => out.push(Change::changed(
            path.to_string(),
            ChangeKind::ValueChanged,
            reference,
            local,
        )),
    }
}

fn diff_unordered(reference: &[Value], local: &[Value], path: &str, out: &mut Vec<Change>) {
    // Pass 1: exact multiset matches.
    let mut by_form: HashMap<String, VecDeque<usize>> = HashMap::new();
    for (i, v) in local.iter().enumerate() {
        by_form.entry(canonical(v)).or_default().push_back(i);
    }

    let mut local_used = vec![false; local.len()];
    let mut ref_left = Vec::new();
    for (i, v) in reference.iter().enumerate() {
        match by_form.get_mut(&canonical(v)).and_then(VecDeque::pop_front) {
            Some(j) => local_used[j] = true,
            None => ref_left.push(i),
        }
    }

    // Pass 2: same-shape containers, in order.
    for i in ref_left {
        let rv = &reference[i];
        let partner = (0..local.len())
            .find(|&j| !local_used[j] && same_container(rv, &local[j]));
        match partner {
            Some(j) => {
                local_used[j] = true;
                diff_into(rv, &local[j], &join_index(path, i), out);
            }
            None => out.push(Change::removed(join_index(path, i), rv)),
        }
    }

    for (j, lv) in local.iter().enumerate() {
        if !local_used[j] {
            out.push(Change::added(join_index(path, j), lv));
        }
    }
}

fn same_container(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}

/// Type label used for type-change detection.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Order-independent textual form: object keys sorted, array elements sorted.
fn canonical(value: &Value) -> String {
    let mut s = String::new();
    write_canonical(value, &mut s);
    s
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, String)> =
                map.iter().map(|(k, v)| (k, canonical(v))).collect();
            entries.sort();
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}:{v}", Value::String((*k).clone()));
            }
            out.push('}');
        }
        Value::Array(items) => {
            let mut forms: Vec<String> = items.iter().map(canonical).collect();
            forms.sort();
            out.push('[');
            out.push_str(&forms.join(","));
            out.push(']');
        }
        // -0.0 == 0.0 under Value equality; the canonical text must agree.
        Value::Number(n) if n.as_f64() == Some(0.0) && n.is_f64() => out.push_str("0.0"),
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}
