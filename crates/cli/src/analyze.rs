// `apiparity analyze`: remediation advice from a persisted report.

use std::path::PathBuf;

use apiparity_engine::remediation::{render_analysis, render_fix_request};
use apiparity_engine::{analyze, load_report};

use crate::{write_text, CliError};

pub fn cmd_analyze(
    report_path: PathBuf,
    json: bool,
    fix_request: Option<PathBuf>,
) -> Result<(), CliError> {
    let report = load_report(&report_path).map_err(|e| {
        let err = CliError::analyze_input(e.to_string());
        if e.is_not_found() {
            err.with_hint("run `apiparity run` first to produce a report")
        } else {
            err
        }
    })?;

    let analysis = analyze(&report);

    if json {
        let out = serde_json::to_string_pretty(&analysis)
            .map_err(|e| CliError::report_io(e.to_string()))?;
        println!("{}", out);
    } else {
        print!("{}", render_analysis(&analysis));
    }

    if let Some(path) = fix_request {
        let report_name = report_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| report_path.display().to_string());
        match render_fix_request(&analysis, &report_name) {
            Some(text) => {
                write_text(&path, &text)?;
                eprintln!("Fix request written to {}", path.display());
            }
            None => eprintln!("No issues; fix request not written"),
        }
    }

    Ok(())
}
