//! Application configuration for the roster tools.
//!
//! User config lives at `~/.cardinal-roster/roster.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "roster.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cardinal-roster";

// ---------------------------------------------------------------------------
// Config structs (matching roster.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Batch defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP retry and timeout policy.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Lookup provider endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Raw document archive for offline inspection.
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory for checkpoints and the final roster.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Write a checkpoint after this many entities.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,

    /// Minimum ms between consecutive entities.
    #[serde(default = "default_politeness_ms")]
    pub politeness_ms: u64,

    /// Domain keyword appended to every lookup query.
    #[serde(default = "default_keyword")]
    pub keyword: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            checkpoint_every: default_checkpoint_every(),
            politeness_ms: default_politeness_ms(),
            keyword: default_keyword(),
        }
    }
}

fn default_output_dir() -> String {
    "data/enhanced".into()
}
fn default_checkpoint_every() -> usize {
    10
}
fn default_politeness_ms() -> u64 {
    2000
}
fn default_keyword() -> String {
    "cardinal".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Attempts per document before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_user_agent() -> String {
    concat!("cardinal-roster/", env!("CARGO_PKG_VERSION")).into()
}

/// One `[providers.*]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub enabled: bool,

    /// Base URL the provider queries.
    pub endpoint: String,

    /// Maximum candidates kept per lookup.
    pub max_hits: usize,
}

/// `[providers]` section. Keys missing from a table fall back to that
/// provider's own defaults, not to shared ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ProvidersFile")]
pub struct ProvidersConfig {
    pub encyclopedia: ProviderConfig,
    pub news: ProviderConfig,
    pub search: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            encyclopedia: default_encyclopedia(),
            news: default_news(),
            search: default_search(),
        }
    }
}

/// `[providers]` as written in the file, every key optional.
#[derive(Debug, Default, Deserialize)]
struct ProvidersFile {
    #[serde(default)]
    encyclopedia: ProviderTable,
    #[serde(default)]
    news: ProviderTable,
    #[serde(default)]
    search: ProviderTable,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderTable {
    enabled: Option<bool>,
    endpoint: Option<String>,
    max_hits: Option<usize>,
}

impl ProviderTable {
    fn over(self, base: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            enabled: self.enabled.unwrap_or(base.enabled),
            endpoint: self.endpoint.unwrap_or(base.endpoint),
            max_hits: self.max_hits.unwrap_or(base.max_hits),
        }
    }
}

impl From<ProvidersFile> for ProvidersConfig {
    fn from(file: ProvidersFile) -> Self {
        Self {
            encyclopedia: file.encyclopedia.over(default_encyclopedia()),
            news: file.news.over(default_news()),
            search: file.search.over(default_search()),
        }
    }
}

fn default_encyclopedia() -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        endpoint: "https://en.wikipedia.org/w/api.php".into(),
        max_hits: 1,
    }
}
fn default_news() -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        endpoint: "https://www.google.com/search".into(),
        max_hits: 5,
    }
}
fn default_search() -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        endpoint: "https://www.google.com/search".into(),
        max_hits: 3,
    }
}

/// `[archive]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_archive_dir")]
    pub dir: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_archive_dir(),
        }
    }
}

fn default_archive_dir() -> String {
    "data/raw".into()
}

// ---------------------------------------------------------------------------
// Enrich config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime enrichment configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Checkpoint cadence in entities. Zero disables intermediate checkpoints.
    pub checkpoint_every: usize,
    /// Politeness interval between entities.
    pub politeness: Duration,
    /// Domain keyword for lookup queries.
    pub keyword: String,
    /// Attempts per document fetch.
    pub max_attempts: u32,
    /// Delay between fetch attempts.
    pub retry_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl From<&AppConfig> for EnrichConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            checkpoint_every: config.defaults.checkpoint_every,
            politeness: Duration::from_millis(config.defaults.politeness_ms),
            keyword: config.defaults.keyword.clone(),
            max_attempts: config.fetch.max_attempts,
            retry_delay: Duration::from_millis(config.fetch.retry_delay_ms),
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            user_agent: config.fetch.user_agent.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.cardinal-roster/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RosterError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.cardinal-roster/roster.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| RosterError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| RosterError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RosterError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RosterError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RosterError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
