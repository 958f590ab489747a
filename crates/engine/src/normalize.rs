use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Volatile fields that never take part in a comparison by default.
pub const DEFAULT_IGNORE_FIELDS: &[&str] = &[
    "gid",
    "id",
    "created_at",
    "updated_at",
    "modified_at",
    "created_by",
    "modified_by",
];

/// Field names stripped at every depth before comparing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreFieldSet(BTreeSet<String>);

impl Default for IgnoreFieldSet {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_FIELDS.iter().copied())
    }
}

impl IgnoreFieldSet {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// A set that ignores nothing.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalizer bound to one ignore set for the lifetime of a run.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    ignore: IgnoreFieldSet,
}

impl Normalizer {
    pub fn new(ignore: IgnoreFieldSet) -> Self {
        Self { ignore }
    }

    pub fn ignore_fields(&self) -> &IgnoreFieldSet {
        &self.ignore
    }

    pub fn normalize(&self, value: &Value) -> Value {
        normalize(value, &self.ignore)
    }
}

/// Copy of `value` with every ignored key removed at every depth.
///
/// Arrays keep their length and order. Scalars are cloned unchanged.
pub fn normalize(value: &Value, ignore: &IgnoreFieldSet) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                if ignore.contains(key) {
                    continue;
                }
                out.insert(key.clone(), normalize(child, ignore));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| normalize(v, ignore)).collect()),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
    }
}
