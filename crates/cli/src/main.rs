// apiparity CLI - compare a local API implementation against a reference API

mod analyze;
mod exit_codes;
mod run;
mod scenarios;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use apiparity_config::{ConfigError, RunConfig};
use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{
    EXIT_ANALYZE_INPUT, EXIT_CONFIG, EXIT_DIFFS, EXIT_REPORT_IO, EXIT_SAMPLES, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "apiparity")]
#[command(about = "Compare a local API implementation against a reference API")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call every catalog endpoint on both targets and write a comparison report
    #[command(after_help = "\
Exit code 1 indicates at least one endpoint whose status, fields or values \
differ. The report is written either way.

Examples:
  apiparity run
  apiparity run --config parity.toml --workers 4
  apiparity run --skip-destructive --no-probes
  apiparity run --fail-fast --report /tmp/report.json
  apiparity run --prompt fix_prompt.md")]
    Run {
        /// Run config (default: <config dir>/apiparity/apiparity.toml)
        #[arg(long, short = 'c', env = "APIPARITY_CONFIG")]
        config: Option<PathBuf>,

        /// Report path (overrides run.report)
        #[arg(long, short = 'o')]
        report: Option<PathBuf>,

        /// Concurrent comparisons (overrides run.workers)
        #[arg(long, short = 'j')]
        workers: Option<usize>,

        /// Stop after the first mismatching endpoint
        #[arg(long)]
        fail_fast: bool,

        /// Leave DELETE endpoints out
        #[arg(long)]
        skip_destructive: bool,

        /// Do not add not-found probes for parameterized GETs
        #[arg(long)]
        no_probes: bool,

        /// Also write a fix prompt with value diffs and response samples
        #[arg(long, value_name = "PATH")]
        prompt: Option<PathBuf>,

        /// Suppress the per-mismatch listing on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Print remediation advice for a persisted comparison report
    #[command(after_help = "\
Examples:
  apiparity analyze
  apiparity analyze reports/api_comparison_report.json
  apiparity analyze --json | jq '.issues[].endpoint'
  apiparity analyze --fix-request fix_request.md")]
    Analyze {
        /// Report to analyze
        #[arg(default_value = "api_comparison_report.json")]
        report: PathBuf,

        /// Print the analysis as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write a per-endpoint fix request document
        #[arg(long, value_name = "PATH")]
        fix_request: Option<PathBuf>,
    },

    /// Check that both targets return the expected status for each scenario
    #[command(after_help = "\
Uses the [[scenarios]] from the config, or a built-in set when none are listed.
Exit code 1 indicates at least one failing scenario.

Examples:
  apiparity scenarios --config parity.toml
  apiparity scenarios --report status.json")]
    Scenarios {
        /// Run config (default: <config dir>/apiparity/apiparity.toml)
        #[arg(long, short = 'c', env = "APIPARITY_CONFIG")]
        config: Option<PathBuf>,

        /// Report path (overrides run.scenario_report)
        #[arg(long, short = 'o')]
        report: Option<PathBuf>,
    },

    /// Load and validate a run config without calling any API
    #[command(after_help = "\
Examples:
  apiparity validate --config parity.toml")]
    Validate {
        /// Run config (default: <config dir>/apiparity/apiparity.toml)
        #[arg(long, short = 'c', env = "APIPARITY_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            report,
            workers,
            fail_fast,
            skip_destructive,
            no_probes,
            prompt,
            quiet,
        } => run::cmd_run(run::RunArgs {
            config,
            report,
            workers,
            fail_fast,
            skip_destructive,
            no_probes,
            prompt,
            quiet,
        }),
        Commands::Analyze { report, json, fix_request } => {
            analyze::cmd_analyze(report, json, fix_request)
        }
        Commands::Scenarios { config, report } => scenarios::cmd_scenarios(config, report),
        Commands::Validate { config } => cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Differences found. The summary is already printed, so no message.
    pub fn diffs() -> Self {
        Self { code: EXIT_DIFFS, message: String::new(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Io { .. } => Some(format!(
                "pass --config or create {}",
                RunConfig::default_path().display()
            )),
            ConfigError::Parse(_) => Some("check the TOML syntax and field names".to_string()),
            ConfigError::Validation(_) => None,
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }

    /// Transport or catalog setup failed before any request went out.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn report_io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_REPORT_IO, message: msg.into(), hint: None }
    }

    pub fn samples(msg: impl Into<String>) -> Self {
        Self {
            code: EXIT_SAMPLES,
            message: msg.into(),
            hint: Some("check samples.database, or list keys under [samples.static]".to_string()),
        }
    }

    pub fn analyze_input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ANALYZE_INPUT, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

pub fn load_config(path: Option<PathBuf>) -> Result<(PathBuf, RunConfig), CliError> {
    let path = path.unwrap_or_else(RunConfig::default_path);
    let config = RunConfig::load(&path).map_err(CliError::config)?;
    Ok((path, config))
}

/// Write a text artifact next to the report.
pub fn write_text(path: &Path, text: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::report_io(format!("{}: {}", parent.display(), e)))?;
    }
    std::fs::write(path, text)
        .map_err(|e| CliError::report_io(format!("{}: {}", path.display(), e)))
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(config: Option<PathBuf>) -> Result<(), CliError> {
    let (path, config) = load_config(config)?;

    println!("Config OK: {}", path.display());
    println!("  local:      {}", config.local.base_url);
    println!("  reference:  {}", config.reference.base_url);
    if config.endpoints.is_empty() {
        println!("  endpoints:  built-in catalog");
    } else {
        println!("  endpoints:  {}", config.endpoints.len());
    }
    if config.scenarios.is_empty() {
        println!("  scenarios:  built-in set");
    } else {
        println!("  scenarios:  {}", config.scenarios.len());
    }
    match (&config.samples.database, config.samples.static_keys.len()) {
        (Some(db), 0) => println!("  samples:    {}", db.display()),
        (Some(db), n) => println!("  samples:    {} (+{} static kinds)", db.display(), n),
        (None, 0) => println!("  samples:    none"),
        (None, n) => println!("  samples:    {} static kinds", n),
    }
    Ok(())
}
