use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use apiparity_engine::{ComparisonTarget, IgnoreFieldSet, StatusScenario};
use apiparity_samples::{EndpointSpec, SampleCache, SampleError, SqliteSamples, StaticSamples};
use serde::Deserialize;

use crate::credentials::{lookup_token, TokenSource};
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub local: TargetConfig,
    pub reference: TargetConfig,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub samples: SampleSettings,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
    #[serde(default)]
    pub scenarios: Vec<StatusScenario>,
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub base_url: String,
    /// Environment variable holding the bearer token.
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Run settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub skip_destructive: bool,
    #[serde(default = "default_true")]
    pub probe_not_found: bool,
    /// Replaces the default volatile-field set when present.
    #[serde(default)]
    pub ignore_fields: Option<Vec<String>>,
    #[serde(default = "default_report")]
    pub report: PathBuf,
    #[serde(default = "default_scenario_report")]
    pub scenario_report: PathBuf,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_workers() -> usize {
    1
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_report() -> PathBuf {
    PathBuf::from("api_comparison_report.json")
}

fn default_scenario_report() -> PathBuf {
    PathBuf::from("status_scenarios_report.json")
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            workers: default_workers(),
            retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            skip_destructive: false,
            probe_not_found: true,
            ignore_fields: None,
            report: default_report(),
            scenario_report: default_scenario_report(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SampleSettings {
    /// SQLite database with one table per resource kind.
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Fixed keys per resource kind, used instead of (or on top of) the database.
    #[serde(default, rename = "static")]
    pub static_keys: BTreeMap<String, Vec<String>>,
    /// Keys loaded per resource kind.
    #[serde(default = "default_per_kind")]
    pub per_kind: usize,
}

fn default_per_kind() -> usize {
    3
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            database: None,
            static_keys: BTreeMap::new(),
            per_kind: default_per_kind(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    /// Default location: `<config dir>/apiparity/apiparity.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("apiparity")
            .join("apiparity.toml")
    }

    /// Read, parse and validate; relative paths resolve against the
    /// config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_toml(&input)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_relative(base_dir);
        Ok(config)
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url("local", &self.local.base_url)?;
        validate_base_url("reference", &self.reference.base_url)?;

        if self.run.workers == 0 {
            return Err(ConfigError::Validation("run.workers must be at least 1".into()));
        }
        if self.run.timeout_secs == 0 {
            return Err(ConfigError::Validation("run.timeout_secs must be at least 1".into()));
        }
        if self.samples.per_kind == 0 {
            return Err(ConfigError::Validation("samples.per_kind must be at least 1".into()));
        }

        for (i, ep) in self.endpoints.iter().enumerate() {
            if !ep.path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "endpoints[{i}]: path '{}' must start with '/'",
                    ep.path
                )));
            }
        }
        for (i, sc) in self.scenarios.iter().enumerate() {
            if !sc.path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "scenarios[{i}]: path '{}' must start with '/'",
                    sc.path
                )));
            }
        }

        Ok(())
    }

    pub fn resolve_relative(&mut self, base_dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        resolve(&mut self.run.report);
        resolve(&mut self.run.scenario_report);
        if let Some(db) = self.samples.database.as_mut() {
            resolve(db);
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.run.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.run.retry_backoff_ms)
    }

    pub fn ignore_fields(&self) -> IgnoreFieldSet {
        match &self.run.ignore_fields {
            Some(fields) => IgnoreFieldSet::new(fields.iter().cloned()),
            None => IgnoreFieldSet::default(),
        }
    }

    /// Sample keys from the database (if any) with static lists on top.
    pub fn sample_cache(&self) -> Result<SampleCache, SampleError> {
        let per_kind = self.samples.per_kind;
        let mut cache = match &self.samples.database {
            Some(path) => SampleCache::load(&SqliteSamples::open(path)?, per_kind),
            None => SampleCache::default(),
        };
        if !self.samples.static_keys.is_empty() {
            let fixed = StaticSamples::new(self.samples.static_keys.clone());
            cache.merge(SampleCache::load(&fixed, per_kind));
        }
        Ok(cache)
    }

    pub fn local_target(&self) -> ComparisonTarget {
        build_target("local", &self.local)
    }

    pub fn reference_target(&self) -> ComparisonTarget {
        build_target("reference", &self.reference)
    }
}

fn validate_base_url(name: &str, raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::Validation(format!("{name}.base_url '{raw}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Validation(format!(
            "{name}.base_url '{raw}': unsupported scheme '{other}' (expected http or https)"
        ))),
    }
}

fn build_target(name: &str, config: &TargetConfig) -> ComparisonTarget {
    let mut target = ComparisonTarget::new(name, config.base_url.clone());
    for (header, value) in &config.headers {
        target = target.with_header(header.clone(), value.clone());
    }

    let lookup = lookup_token(name, config.token_env.as_deref());
    match (lookup.token, &config.token_env) {
        (Some(token), _) => {
            log::debug!("{name}: bearer token from {}", lookup.source.as_str());
            target.with_bearer(&token)
        }
        (None, Some(env_name)) => {
            log::warn!("{name}: ${env_name} is not set; requests go out unauthenticated");
            target
        }
        (None, None) => {
            debug_assert_eq!(lookup.source, TokenSource::None);
            target
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use apiparity_engine::HttpMethod;

    const MINIMAL: &str = r#"
[local]
base_url = "http://localhost:8000/api/1.0"

[reference]
base_url = "https://app.example.com/api/1.0"
"#;

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = RunConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.run.timeout_secs, 10);
        assert_eq!(config.run.workers, 1);
        assert_eq!(config.run.retries, 0);
        assert!(config.run.probe_not_found);
        assert!(!config.run.skip_destructive);
        assert_eq!(config.run.report, PathBuf::from("api_comparison_report.json"));
        assert_eq!(config.samples.per_kind, 3);
        assert!(config.endpoints.is_empty());
        assert_eq!(config.ignore_fields(), IgnoreFieldSet::default());
    }

    #[test]
    fn parse_full() {
        let input = format!(
            r#"{MINIMAL}
[run]
timeout_secs = 5
workers = 4
retries = 1
skip_destructive = true
ignore_fields = ["gid", "etag"]

[samples]
database = "samples.db"

[samples.static]
project = ["123", "456"]

[[endpoints]]
method = "GET"
path = "/projects/{{project_gid}}"

[[endpoints]]
method = "POST"
path = "/projects"
params = {{ limit = "5" }}
body = {{ data = {{ name = "Test Project" }} }}

[[scenarios]]
description = "missing project"
method = "GET"
path = "/projects/00000000-0000-0000-0000-000000000000"
expected_status = 404
"#
        );
        let config = RunConfig::from_toml(&input).unwrap();
        assert_eq!(config.run.workers, 4);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.ignore_fields().contains("etag"));
        assert!(!config.ignore_fields().contains("id"));
        assert_eq!(config.samples.static_keys["project"], vec!["123", "456"]);
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[1].method, HttpMethod::Post);
        assert_eq!(config.endpoints[1].params["limit"], "5");
        assert_eq!(
            config.endpoints[1].body,
            Some(serde_json::json!({"data": {"name": "Test Project"}}))
        );
        assert_eq!(config.scenarios[0].expected_status, 404);
    }

    #[test]
    fn rejects_non_http_url() {
        let input = MINIMAL.replace("http://localhost:8000", "ftp://localhost");
        let err = RunConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "{err}");
    }

    #[test]
    fn rejects_zero_workers() {
        let input = format!("{MINIMAL}\n[run]\nworkers = 0\n");
        assert!(matches!(
            RunConfig::from_toml(&input).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn rejects_unknown_method() {
        let input = format!("{MINIMAL}\n[[endpoints]]\nmethod = \"TRACE\"\npath = \"/x\"\n");
        assert!(matches!(
            RunConfig::from_toml(&input).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn rejects_relative_endpoint_path() {
        let input = format!("{MINIMAL}\n[[endpoints]]\nmethod = \"GET\"\npath = \"projects\"\n");
        assert!(RunConfig::from_toml(&input).is_err());
    }

    #[test]
    fn load_resolves_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apiparity.toml");
        std::fs::write(
            &path,
            format!("{MINIMAL}\n[samples]\ndatabase = \"data/samples.db\"\n"),
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.run.report, dir.path().join("api_comparison_report.json"));
        assert_eq!(
            config.samples.database.unwrap(),
            dir.path().join("data/samples.db")
        );
    }

    #[test]
    fn static_keys_feed_the_cache() {
        let input = format!("{MINIMAL}\n[samples.static]\nprojects = [\"p1\", \"p2\"]\n");
        let config = RunConfig::from_toml(&input).unwrap();
        let cache = config.sample_cache().unwrap();
        assert_eq!(cache.first("project"), Some("p1"));
    }

    #[test]
    fn missing_sample_database_is_an_error() {
        let input = format!("{MINIMAL}\n[samples]\ndatabase = \"/definitely/not/here.db\"\n");
        let config = RunConfig::from_toml(&input).unwrap();
        assert!(matches!(config.sample_cache(), Err(SampleError::Open { .. })));
    }

    #[test]
    fn load_missing_file() {
        let err = RunConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn targets_carry_headers_and_env_token() {
        std::env::set_var("APIPARITY_TEST_REF_TOKEN", "s3cret");
        let input = r#"
[local]
base_url = "http://localhost:8000"
headers = { "X-Trace" = "1" }

[reference]
base_url = "https://ref.example.com"
token_env = "APIPARITY_TEST_REF_TOKEN"
"#;
        let config = RunConfig::from_toml(input).unwrap();
        let local = config.local_target();
        assert_eq!(local.headers.get("X-Trace").map(String::as_str), Some("1"));

        let reference = config.reference_target();
        assert_eq!(
            reference.headers.get("Authorization").map(String::as_str),
            Some("Bearer s3cret")
        );
        std::env::remove_var("APIPARITY_TEST_REF_TOKEN");
    }

    #[test]
    fn missing_token_is_not_an_error() {
        let input = format!(
            "{}\ntoken_env = \"APIPARITY_TEST_UNSET_TOKEN\"\n",
            MINIMAL.trim_end()
        );
        let config = RunConfig::from_toml(&input).unwrap();
        assert!(config.reference_target().headers.get("Authorization").is_none());
    }
}
