use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};

use crate::error::SampleError;

/// Resource kind → table holding rows of that kind (each with a `gid` column).
pub const RESOURCE_TABLES: &[(&str, &str)] = &[
    ("workspace", "workspaces"),
    ("user", "users"),
    ("team", "teams"),
    ("project", "projects"),
    ("task", "tasks"),
    ("goal", "goals"),
    ("portfolio", "portfolios"),
    ("tag", "tags"),
    ("section", "sections"),
    ("story", "stories"),
    ("status_update", "status_updates"),
    ("project_status", "project_statuses"),
    ("project_brief", "project_briefs"),
    ("webhook", "webhooks"),
    ("job", "jobs"),
    ("custom_field", "custom_fields"),
    ("rate", "rates"),
    ("task_template", "task_templates"),
    ("time_tracking_entry", "time_tracking_entries"),
    ("budget", "budgets"),
    ("allocation", "allocations"),
    ("attachment", "attachments"),
    ("access_request", "access_requests"),
    ("project_membership", "project_memberships"),
    ("portfolio_membership", "portfolio_memberships"),
];

/// Read-only lookup of realistic identifiers for path parameters.
pub trait SampleKeySource {
    fn get_sample_keys(&self, kind: &str, limit: usize) -> Result<Vec<String>, SampleError>;

    /// Resource kinds this source can answer for.
    fn kinds(&self) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// Static lists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StaticSamples {
    keys: BTreeMap<String, Vec<String>>,
}

impl StaticSamples {
    pub fn new(keys: BTreeMap<String, Vec<String>>) -> Self {
        Self { keys }
    }
}

impl SampleKeySource for StaticSamples {
    fn get_sample_keys(&self, kind: &str, limit: usize) -> Result<Vec<String>, SampleError> {
        Ok(self
            .keys
            .get(kind)
            .map(|v| v.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn kinds(&self) -> Vec<String> {
        self.keys.keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

pub struct SqliteSamples {
    conn: Connection,
    tables: BTreeMap<String, String>,
}

impl SqliteSamples {
    /// Open `path` read-only with the default kind → table map.
    pub fn open(path: &Path) -> Result<Self, SampleError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| SampleError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let tables = RESOURCE_TABLES
            .iter()
            .map(|(k, t)| (k.to_string(), t.to_string()))
            .collect();
        Ok(Self { conn, tables })
    }

    pub fn with_table(mut self, kind: &str, table: &str) -> Self {
        self.tables.insert(kind.to_string(), table.to_string());
        self
    }
}

impl SampleKeySource for SqliteSamples {
    fn get_sample_keys(&self, kind: &str, limit: usize) -> Result<Vec<String>, SampleError> {
        let table = self
            .tables
            .get(kind)
            .ok_or_else(|| SampleError::UnknownKind(kind.to_string()))?;
        let query_err = |e: rusqlite::Error| SampleError::Query {
            table: table.clone(),
            message: e.to_string(),
        };

        let sql = format!("SELECT gid FROM \"{}\" LIMIT ?1", table.replace('"', "\"\""));
        let mut stmt = self.conn.prepare(&sql).map_err(query_err)?;
        let rows = stmt
            .query_map([limit as i64], |row| row.get::<_, SqlValue>(0))
            .map_err(query_err)?;

        let mut keys = Vec::new();
        for value in rows {
            match value.map_err(query_err)? {
                SqlValue::Text(s) => keys.push(s),
                SqlValue::Integer(n) => keys.push(n.to_string()),
                SqlValue::Real(f) => keys.push(f.to_string()),
                SqlValue::Null | SqlValue::Blob(_) => {}
            }
        }
        Ok(keys)
    }

    fn kinds(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Sample keys loaded once per run, per resource kind.
#[derive(Debug, Clone, Default)]
pub struct SampleCache {
    keys: BTreeMap<String, Vec<String>>,
}

impl SampleCache {
    /// Load up to `per_kind` keys for every kind `source` knows.
    /// Failing kinds are logged and left empty.
    pub fn load(source: &dyn SampleKeySource, per_kind: usize) -> Self {
        let mut keys = BTreeMap::new();
        for kind in source.kinds() {
            match source.get_sample_keys(&kind, per_kind) {
                Ok(found) if !found.is_empty() => {
                    keys.insert(kind, found);
                }
                Ok(_) => log::debug!("no sample keys for '{kind}'"),
                Err(e) => log::warn!("{e}"),
            }
        }
        Self { keys }
    }

    /// Kinds present in `other` replace the ones here.
    pub fn merge(&mut self, other: SampleCache) {
        self.keys.extend(other.keys);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn keys(&self, kind: &str) -> &[String] {
        lookup_names(kind)
            .iter()
            .find_map(|name| self.keys.get(name.as_str()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First key for `kind`; `projects` and `project` are interchangeable.
    pub fn first(&self, kind: &str) -> Option<&str> {
        self.keys(kind).first().map(String::as_str)
    }
}

/// Names to try for a kind: as given, singular forms, then plural.
fn lookup_names(kind: &str) -> Vec<String> {
    let mut names = vec![kind.to_string()];
    if let Some(stem) = kind.strip_suffix("ies") {
        names.push(format!("{stem}y"));
    }
    if let Some(stem) = kind.strip_suffix("es") {
        names.push(stem.to_string());
    }
    if let Some(stem) = kind.strip_suffix('s') {
        names.push(stem.to_string());
    }
    names.push(format!("{kind}s"));
    names
}
