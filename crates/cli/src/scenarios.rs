// `apiparity scenarios`: expected-status checks against both targets.

use std::path::PathBuf;

use apiparity_engine::run_scenarios;
use apiparity_samples::default_scenarios;

use crate::run::build_comparator;
use crate::{load_config, CliError};

pub fn cmd_scenarios(config: Option<PathBuf>, report: Option<PathBuf>) -> Result<(), CliError> {
    let (_, config) = load_config(config)?;
    let report_path = report.unwrap_or_else(|| config.run.scenario_report.clone());

    let scenarios = if config.scenarios.is_empty() {
        log::info!("no [[scenarios]] in config; using the built-in set");
        default_scenarios()
    } else {
        config.scenarios.clone()
    };

    let comparator = build_comparator(&config)?;
    let report = run_scenarios(&comparator, &scenarios);
    report
        .persist(&report_path)
        .map_err(|e| CliError::report_io(e.to_string()))?;

    for result in &report.details {
        let verdict = if result.passed() { "PASS" } else { "FAIL" };
        println!(
            "{verdict}  {} ({} {}): expected {}, local {}, reference {}",
            result.description,
            result.method,
            result.endpoint,
            result.expected_status,
            result.local_status,
            result.reference_status,
        );
    }
    println!();
    println!("Total:       {}", report.total);
    println!("Passed:      {}", report.matches);
    println!("Failed:      {}", report.mismatches);
    println!("Report:      {}", report_path.display());

    if report.mismatches > 0 {
        return Err(CliError::diffs());
    }
    Ok(())
}
