//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::amazon::regions::Region;
use crate::analysis::SentimentBackend;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Amazon storefront
    #[serde(default)]
    pub region: Region,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay after each navigation in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Lower bound of the per-character typing delay
    #[serde(default = "default_keystroke_min_ms")]
    pub keystroke_min_ms: u64,

    /// Upper bound of the per-character typing delay
    #[serde(default = "default_keystroke_max_ms")]
    pub keystroke_max_ms: u64,

    /// Maximum number of reviews to keep
    #[serde(default = "default_max_reviews")]
    pub max_reviews: usize,

    /// Keep at most this many reviews per star rating (balanced sample)
    #[serde(default)]
    pub max_per_star: Option<usize>,

    /// Maximum number of review pages to visit
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Run the session without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Directory for reviews.csv, analysis.json, summary.txt and the audit log
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Sentiment scorer selection
    #[serde(default)]
    pub sentiment_backend: SentimentBackend,

    /// Optional lexicon file (term<TAB>score per line)
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,

    /// Number of TF-IDF keywords to report
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,

    /// Number of analyses kept in the result cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Lifetime of a cached analysis in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    2000
}

fn default_keystroke_min_ms() -> u64 {
    30
}

fn default_keystroke_max_ms() -> u64 {
    70
}

fn default_max_reviews() -> usize {
    200
}

fn default_max_pages() -> u32 {
    10
}

fn default_headless() -> bool {
    true
}

fn default_top_keywords() -> usize {
    20
}

fn default_cache_capacity() -> usize {
    32
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::In,
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            keystroke_min_ms: default_keystroke_min_ms(),
            keystroke_max_ms: default_keystroke_max_ms(),
            max_reviews: default_max_reviews(),
            max_per_star: None,
            max_pages: default_max_pages(),
            headless: default_headless(),
            output_dir: None,
            format: OutputFormat::Table,
            sentiment_backend: SentimentBackend::Auto,
            lexicon_path: None,
            top_keywords: default_top_keywords(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Config files consulted when no explicit path is given, highest priority first.
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("amz-reviews").join("config.toml"));
        }
        paths
    }

    /// Loads the explicit file, else the first existing candidate, else defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        match Self::candidate_paths().into_iter().find(|p| p.exists()) {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Applies `AMZ_*` environment overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Some(region) = env_value("AMZ_REGION") {
            self.region = region;
        }
        if let Ok(proxy) = std::env::var("AMZ_PROXY") {
            self.proxy = Some(proxy);
        }
        if let Some(delay) = env_value("AMZ_DELAY") {
            self.delay_ms = delay;
        }
        if let Some(max) = env_value("AMZ_MAX_REVIEWS") {
            self.max_reviews = max;
        }
        self
    }

    /// Lifetime of cached analyses.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("Ignoring unparseable {}={}", key, raw);
            None
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
