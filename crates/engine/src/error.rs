use std::fmt;
use std::path::PathBuf;

/// Failures reading or writing a persisted report.
///
/// These are the only hard errors the engine raises: a lost report means
/// the whole run's results are lost.
#[derive(Debug)]
pub enum ReportError {
    /// Filesystem error (create, write, rename, read).
    Io {
        path: PathBuf,
        kind: std::io::ErrorKind,
        message: String,
    },
    /// Report could not be serialized to JSON.
    Serialize(String),
    /// Report file exists but is not a valid report document.
    Parse { path: PathBuf, message: String },
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// True when the report file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { kind, .. } if *kind == std::io::ErrorKind::NotFound)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message, .. } => write!(f, "{}: {message}", path.display()),
            Self::Serialize(msg) => write!(f, "report serialization error: {msg}"),
            Self::Parse { path, message } => {
                write!(f, "{}: not a comparison report: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportError {}
