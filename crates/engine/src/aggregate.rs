use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::ReportError;
use crate::model::{ComparisonOutcome, ComparisonReport, Summary};

/// Append-only collection of one run's outcomes.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    outcomes: Vec<ComparisonOutcome>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: ComparisonOutcome) {
        debug_assert_eq!(outcome.overall_match, outcome.derived_match());
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[ComparisonOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Counts over the outcomes recorded so far.
    pub fn summarize(&self) -> Summary {
        summarize(&self.outcomes)
    }

    /// Snapshot report stamped with the current time.
    pub fn report(&self) -> ComparisonReport {
        ComparisonReport {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            summary: self.summarize(),
            results: self.outcomes.clone(),
        }
    }

    /// Write the full report to `path`, replacing any existing file.
    pub fn persist(&self, path: &Path) -> Result<ComparisonReport, ReportError> {
        let report = self.report();
        write_json_atomic(path, &report)?;
        log::info!(
            "wrote report {} ({} results)",
            path.display(),
            report.results.len()
        );
        Ok(report)
    }
}

pub(crate) fn summarize(outcomes: &[ComparisonOutcome]) -> Summary {
    outcomes.iter().fold(Summary::default(), |mut s, o| {
        s.total += 1;
        if o.overall_match {
            s.matches += 1;
        } else {
            s.mismatches += 1;
        }
        s
    })
}

/// Serialize `value` as pretty JSON into `<path>.tmp`, then rename over `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| ReportError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }

    let tmp = tmp_path(path);
    let written = fs::File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(&json)?;
            f.write_all(b"\n")?;
            f.sync_all()
        })
        .map_err(|e| ReportError::io(&tmp, e))
        .and_then(|()| fs::rename(&tmp, path).map_err(|e| ReportError::io(path, e)));

    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read a persisted report back.
pub fn load_report(path: &Path) -> Result<ComparisonReport, ReportError> {
    let text = fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| ReportError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
