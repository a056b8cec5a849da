//! Application configuration for oddsboard.
//!
//! User config lives at `~/.oddsboard/oddsboard.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{OddsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "oddsboard.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".oddsboard";

/// Production listing page for the Jingcai football table.
pub const DEFAULT_SOURCE_URL: &str = "https://live.500.com/";

// ---------------------------------------------------------------------------
// Config structs (matching oddsboard.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the base table comes from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Filtering, truncation and which enrichment stages run.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Detail-page fan-out settings.
    #[serde(default)]
    pub enrich: EnrichConfig,

    /// Export destination.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Listing page URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Run the automation engine without a visible window.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Time budget for loading the base page.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause after navigation so client-side rendering can finish.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Number of synthetic records produced when extraction fails.
    #[serde(default = "default_fallback_count")]
    pub fallback_count: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            headless: true,
            timeout_secs: default_timeout_secs(),
            settle_ms: default_settle_ms(),
            fallback_count: default_fallback_count(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_SOURCE_URL.into()
}
fn default_true() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_settle_ms() -> u64 {
    500
}
fn default_fallback_count() -> usize {
    15
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Keep at most this many records; 0 means unlimited.
    #[serde(default)]
    pub max_records: usize,

    /// Keep only the records sharing the first record's day prefix.
    #[serde(default)]
    pub same_day_only: bool,

    /// Run the Asian handicap pass.
    #[serde(default)]
    pub asian_handicap: bool,

    /// Run the European odds / Kelly pass.
    #[serde(default)]
    pub kelly: bool,
}

/// `[enrich]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Simultaneous detail page visits.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Time budget per detail page visit.
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// How many times to re-check for the readiness marker.
    #[serde(default = "default_ready_retries")]
    pub ready_retries: u32,

    /// Delay between readiness checks.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Bookmaker label marker on the Asian handicap page.
    #[serde(default = "default_asian_bookmaker")]
    pub asian_bookmaker: String,

    /// Bookmaker label marker on the European odds page.
    #[serde(default = "default_kelly_bookmaker")]
    pub kelly_bookmaker: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            page_timeout_secs: default_page_timeout_secs(),
            ready_retries: default_ready_retries(),
            settle_ms: default_settle_ms(),
            asian_bookmaker: default_asian_bookmaker(),
            kelly_bookmaker: default_kelly_bookmaker(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_page_timeout_secs() -> u64 {
    15
}
fn default_ready_retries() -> u32 {
    3
}
fn default_asian_bookmaker() -> String {
    "澳门".into()
}
fn default_kelly_bookmaker() -> String {
    "威廉希尔".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Spreadsheet written after a run.
    #[serde(default = "default_output_path")]
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> String {
    "live_betting_template.xlsx".into()
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime options for the detail-page passes.
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Semaphore width for concurrent page visits.
    pub concurrency: usize,
    /// Per-visit time budget.
    pub page_timeout: Duration,
    /// Readiness polls before giving up on the marker.
    pub ready_retries: u32,
    /// Settle delay between polls.
    pub settle: Duration,
    pub asian_bookmaker: String,
    pub kelly_bookmaker: String,
}

impl From<&EnrichConfig> for EnrichOptions {
    fn from(config: &EnrichConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            ready_retries: config.ready_retries,
            settle: Duration::from_millis(config.settle_ms),
            asian_bookmaker: config.asian_bookmaker.clone(),
            kelly_bookmaker: config.kelly_bookmaker.clone(),
        }
    }
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self::from(&EnrichConfig::default())
    }
}

/// Runtime scrape configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Listing page URL.
    pub url: String,
    /// Headless automation flag.
    pub headless: bool,
    /// Time budget for the base page.
    pub timeout: Duration,
    /// Settle delay after base page navigation.
    pub settle: Duration,
    /// Synthetic record count on total failure.
    pub fallback_count: usize,
    /// 0 = unlimited.
    pub max_records: usize,
    pub same_day_only: bool,
    pub asian_handicap: bool,
    pub kelly: bool,
    pub enrich: EnrichOptions,
    /// Export destination.
    pub output: PathBuf,
}

impl From<&AppConfig> for ScrapeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            url: config.source.url.clone(),
            headless: config.source.headless,
            timeout: Duration::from_secs(config.source.timeout_secs),
            settle: Duration::from_millis(config.source.settle_ms),
            fallback_count: config.source.fallback_count,
            max_records: config.pipeline.max_records,
            same_day_only: config.pipeline.same_day_only,
            asian_handicap: config.pipeline.asian_handicap,
            kelly: config.pipeline.kelly,
            enrich: EnrichOptions::from(&config.enrich),
            output: PathBuf::from(&config.output.path),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl ScrapeConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.url)
            .map_err(|e| OddsError::config(format!("invalid source URL '{}': {e}", self.url)))?;

        if self.enrich.concurrency == 0 {
            return Err(OddsError::config("enrich concurrency must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(OddsError::config("source timeout must be non-zero"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.oddsboard/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| OddsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.oddsboard/oddsboard.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OddsError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| OddsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| OddsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| OddsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| OddsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("fallback_count"));
        assert!(toml_str.contains("live.500.com"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.source.fallback_count, 15);
        assert_eq!(parsed.enrich.concurrency, 4);
        assert_eq!(parsed.enrich.kelly_bookmaker, "威廉希尔");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[source]
url = "https://live.m.500.com/home/zq/jczq/cur"
headless = false

[pipeline]
max_records = 20
kelly = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(!config.source.headless);
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.pipeline.max_records, 20);
        assert!(config.pipeline.kelly);
        assert!(!config.pipeline.asian_handicap);
        assert_eq!(config.output.path, "live_betting_template.xlsx");
    }

    #[test]
    fn scrape_config_from_app_config() {
        let app = AppConfig::default();
        let scrape = ScrapeConfig::from(&app);
        assert_eq!(scrape.timeout, Duration::from_secs(30));
        assert_eq!(scrape.enrich.concurrency, 4);
        assert_eq!(scrape.enrich.page_timeout, Duration::from_secs(15));
        assert_eq!(scrape.max_records, 0);
        assert!(!scrape.asian_handicap && !scrape.kelly);
        assert!(scrape.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_settings() {
        let mut scrape = ScrapeConfig::default();
        scrape.enrich.concurrency = 0;
        let err = scrape.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency"));

        let mut scrape = ScrapeConfig::default();
        scrape.url = "not a url".into();
        assert!(scrape.validate().is_err());
    }
}
