use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SampleError {
    /// Sample database could not be opened.
    Open { path: PathBuf, message: String },
    /// Lookup query failed (missing table, bad column, etc.).
    Query { table: String, message: String },
    /// No table is mapped for this resource kind.
    UnknownKind(String),
    /// Built-in catalog could not be parsed.
    Catalog(String),
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, message } => {
                write!(f, "cannot open sample database {}: {message}", path.display())
            }
            Self::Query { table, message } => {
                write!(f, "sample query on '{table}' failed: {message}")
            }
            Self::UnknownKind(kind) => write!(f, "no sample table for resource kind '{kind}'"),
            Self::Catalog(msg) => write!(f, "endpoint catalog error: {msg}"),
        }
    }
}

impl std::error::Error for SampleError {}
