// `apiparity run`: sweep the endpoint catalog and write the report.

use std::path::PathBuf;

use apiparity_client::HttpTransport;
use apiparity_config::RunConfig;
use apiparity_engine::remediation::render_fix_prompt;
use apiparity_engine::{EndpointComparator, Normalizer, ResultAggregator, Sweep};
use apiparity_samples::{build_cases, default_catalog, PlanOptions};

use crate::{load_config, write_text, CliError};

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub workers: Option<usize>,
    pub fail_fast: bool,
    pub skip_destructive: bool,
    pub no_probes: bool,
    pub prompt: Option<PathBuf>,
    pub quiet: bool,
}

/// Comparator over HTTP for both targets in `config`.
pub fn build_comparator(config: &RunConfig) -> Result<EndpointComparator<HttpTransport>, CliError> {
    let transport = HttpTransport::new(config.timeout())
        .map_err(|e| CliError::setup(e.to_string()))?
        .with_retries(config.run.retries, config.retry_backoff());

    Ok(EndpointComparator::new(transport, config.local_target(), config.reference_target())
        .with_normalizer(Normalizer::new(config.ignore_fields())))
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let (_, mut config) = load_config(args.config)?;

    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(CliError::usage("--workers must be at least 1")
                .with_hint("use --workers 1 for sequential comparisons"));
        }
        config.run.workers = workers;
    }
    if args.skip_destructive {
        config.run.skip_destructive = true;
    }
    if args.no_probes {
        config.run.probe_not_found = false;
    }
    let report_path = args.report.unwrap_or_else(|| config.run.report.clone());

    // ── Plan ────────────────────────────────────────────────────────
    let cache = config
        .sample_cache()
        .map_err(|e| CliError::samples(e.to_string()))?;
    let specs = if config.endpoints.is_empty() {
        log::info!("no [[endpoints]] in config; using the built-in catalog");
        default_catalog().map_err(|e| CliError::setup(e.to_string()))?
    } else {
        config.endpoints.clone()
    };
    let options = PlanOptions {
        skip_destructive: config.run.skip_destructive,
        probe_not_found: config.run.probe_not_found,
        ..PlanOptions::default()
    };
    let plan = build_cases(&specs, &cache, &options);

    // ── Sweep ───────────────────────────────────────────────────────
    let comparator = build_comparator(&config)?;
    eprintln!(
        "Comparing {} cases ({} skipped), {} worker(s)",
        plan.cases.len(),
        plan.skipped.len(),
        config.run.workers
    );
    eprintln!("  local:      {}", config.local.base_url);
    eprintln!("  reference:  {}", config.reference.base_url);

    let mut aggregator = ResultAggregator::new();
    let stats = Sweep::new(&comparator)
        .workers(config.run.workers)
        .stop_on_mismatch(args.fail_fast)
        .run(&plan.cases, &mut aggregator);

    // ── Persist ─────────────────────────────────────────────────────
    let report = aggregator
        .persist(&report_path)
        .map_err(|e| CliError::report_io(e.to_string()))?;

    if let Some(prompt_path) = &args.prompt {
        match render_fix_prompt(&report, comparator.normalizer().ignore_fields()) {
            Some(text) => {
                write_text(prompt_path, &text)?;
                eprintln!("Fix prompt written to {}", prompt_path.display());
            }
            None => eprintln!("No compared endpoint differs; fix prompt not written"),
        }
    }

    // ── Summary ─────────────────────────────────────────────────────
    if !args.quiet {
        for outcome in report.results.iter().filter(|o| !o.overall_match) {
            let detail = match (&outcome.local_error, &outcome.reference_error) {
                (Some(err), _) => format!("local failed: {err}"),
                (None, Some(err)) => format!("reference failed: {err}"),
                (None, None) => format!(
                    "local {}, reference {}",
                    outcome.local_status, outcome.reference_status
                ),
            };
            eprintln!("  MISMATCH {} {} ({})", outcome.method, outcome.endpoint, detail);
        }
    }

    println!("Total:       {}", report.summary.total);
    println!("Matches:     {}", report.summary.matches);
    println!("Differences: {}", report.summary.mismatches);
    println!("Report:      {}", report_path.display());
    if stats.cancelled {
        println!("Stopped early: {} case(s) not run", stats.not_run);
    }

    if report.summary.mismatches > 0 {
        return Err(CliError::diffs());
    }
    Ok(())
}
