//! Application configuration for solonews.
//!
//! User config lives at `~/.solonews/solonews.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoloNewsError};
use crate::types::{CollectionRequest, DEFAULT_MAX_ITEMS, SearchTarget};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "solonews.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".solonews";

/// Naver News search, newest first.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://search.naver.com/search.naver?where=news&query={query}&sort=1&start={start}";

// ---------------------------------------------------------------------------
// Config structs (matching solonews.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search pages and run limits.
    #[serde(default)]
    pub collection: CollectionConfig,

    /// What counts as an on-topic article.
    #[serde(default)]
    pub topic: TopicConfig,

    /// Where collected articles are stored.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[collection]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Item budget for a run when the caller does not pass one.
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Total timeout for one page fetch.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Optional wall-clock cap for a whole run; remaining pages are skipped once it passes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_deadline_ms: Option<u64>,

    /// Search URL with `{query}` and `{start}` placeholders.
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Pages to fetch, in order.
    #[serde(default = "default_targets")]
    pub targets: Vec<SearchTarget>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            timeout_ms: default_timeout_ms(),
            run_deadline_ms: None,
            url_template: default_url_template(),
            targets: default_targets(),
        }
    }
}

impl CollectionConfig {
    /// Item budget for one run: `requested` if given, else `max_items`,
    /// clamped to `1..=100` either way.
    pub fn budget(&self, requested: Option<i64>) -> usize {
        let fallback = i64::try_from(self.max_items).unwrap_or(i64::MAX);
        CollectionRequest {
            max_items: Some(requested.unwrap_or(fallback)),
        }
        .max_items()
    }
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}
fn default_timeout_ms() -> u64 {
    15_000
}
fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.into()
}
fn default_targets() -> Vec<SearchTarget> {
    vec![
        SearchTarget::new("나솔", 1),
        SearchTarget::new("나는 솔로", 1),
        SearchTarget::new("나솔", 11),
    ]
}

/// `[topic]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// A title or summary must contain at least one of these.
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,

    /// Terms that must appear in order inside loosely matched anchors.
    #[serde(default = "default_loose_terms")]
    pub loose_terms: Vec<String>,

    /// Titles containing any of these are navigation or ads, not articles.
    #[serde(default = "default_excluded_keywords")]
    pub excluded_keywords: Vec<String>,

    /// Host of the search engine itself; links back to it are never articles.
    #[serde(default = "default_search_host")]
    pub search_host: String,

    /// Author used when the press name cannot be extracted.
    #[serde(default = "default_author")]
    pub default_author: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
            loose_terms: default_loose_terms(),
            excluded_keywords: default_excluded_keywords(),
            search_host: default_search_host(),
            default_author: default_author(),
        }
    }
}

fn default_markers() -> Vec<String> {
    vec!["나는솔로".into(), "나는 솔로".into()]
}
fn default_loose_terms() -> Vec<String> {
    vec!["나는".into(), "솔로".into()]
}
fn default_excluded_keywords() -> Vec<String> {
    vec!["검색결과".into(), "더보기".into(), "광고".into()]
}
fn default_search_host() -> String {
    "search.naver.com".into()
}
fn default_author() -> String {
    "네이버뉴스".into()
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; a leading `~/` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    format!("~/{CONFIG_DIR_NAME}/articles.db")
}

impl StorageConfig {
    /// Resolve `db_path` to an absolute path, expanding `~/`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match self.db_path.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir().ok_or_else(|| {
                    SoloNewsError::config("could not determine home directory")
                })?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(&self.db_path)),
        }
    }
}

// ---------------------------------------------------------------------------
// Collect config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime collection configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// Per-fetch total timeout.
    pub timeout: Duration,
    /// Optional cap on total run time.
    pub run_deadline: Option<Duration>,
    /// Search URL template.
    pub url_template: String,
    /// Ordered search pages.
    pub targets: Vec<SearchTarget>,
    /// Relevance rules.
    pub topic: TopicConfig,
}

impl From<&AppConfig> for CollectConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.collection.timeout_ms),
            run_deadline: config.collection.run_deadline_ms.map(Duration::from_millis),
            url_template: config.collection.url_template.clone(),
            targets: config.collection.targets.clone(),
            topic: config.topic.clone(),
        }
    }
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl CollectConfig {
    /// Reject configurations a run cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(SoloNewsError::config("no search targets configured"));
        }
        if self.timeout.is_zero() {
            return Err(SoloNewsError::config("timeout_ms must be greater than zero"));
        }
        if self.topic.markers.iter().all(|m| m.trim().is_empty()) {
            return Err(SoloNewsError::config("topic.markers must not be empty"));
        }
        if self.topic.loose_terms.iter().all(|t| t.trim().is_empty()) {
            return Err(SoloNewsError::config("topic.loose_terms must not be empty"));
        }

        for target in &self.targets {
            let rendered = target.render(&self.url_template);
            let parsed = url::Url::parse(&rendered).map_err(|e| {
                SoloNewsError::config(format!("invalid search URL {rendered}: {e}"))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(SoloNewsError::config(format!(
                    "search URL must be http(s): {rendered}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.solonews/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SoloNewsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.solonews/solonews.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| SoloNewsError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SoloNewsError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SoloNewsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SoloNewsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SoloNewsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
