use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Metric name prefix
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Minimum severity logged (Python-style names like WARNING are accepted)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub metrics: Vec<MetricConfig>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricConfig {
    pub name: String,
    pub description: String,

    /// Appended to the exposition name when set (prometheus naming convention)
    #[serde(default)]
    pub unit: String,

    /// jq filter evaluated against each fetched document
    pub query: String,

    /// Scale factor applied to the extracted value
    #[serde(default = "default_factor")]
    pub factor: f64,

    /// Optional name segment between namespace and metric name
    #[serde(default)]
    pub subsystem: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Document URI; file://, http:// and https:// are supported
    #[serde(default = "default_url")]
    pub url: String,

    /// Poll period in seconds
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval: u64,

    /// Disable TLS certificate verification (explicit opt-in, never default)
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds for http/https fetches
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            scrape_interval: default_scrape_interval(),
            insecure: false,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_namespace() -> String {
    "jq".to_string()
}

fn default_log_level() -> String {
    "WARNING".to_string()
}

fn default_factor() -> f64 {
    1.0
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_url() -> String {
    "http://localhost/".to_string()
}

fn default_scrape_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

/// Load configuration from the given file, with JQ_EXPORTER__* environment
/// variables layered on top.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("JQ_EXPORTER").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.source.scrape_interval == 0 {
        anyhow::bail!("source.scrape_interval must be greater than zero");
    }

    let mut seen = HashSet::new();
    for metric in &cfg.metrics {
        if metric.name.is_empty() {
            anyhow::bail!("Metric name cannot be empty");
        }
        if metric.query.is_empty() {
            anyhow::bail!("Metric '{}' has an empty query", metric.name);
        }
        if !metric.factor.is_finite() {
            anyhow::bail!("Metric '{}' has a non-finite factor", metric.name);
        }
        // Duplicates are keyed on the full exposition name: subsystem and
        // unit segments fold into it, so distinct definitions can land on
        // the same time series.
        let exposition = crate::metrics::gauge_name(
            &cfg.namespace,
            &metric.subsystem,
            &metric.name,
            &metric.unit,
        );
        if !seen.insert(exposition.clone()) {
            anyhow::bail!(
                "Metric '{}' collides with another metric on exposition name '{}'",
                metric.name,
                exposition
            );
        }
    }

    Ok(())
}
