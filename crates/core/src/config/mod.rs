//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SAVOR_*)
//! 2. TOML config file (if SAVOR_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SAVOR_*)
/// 2. TOML config file (if SAVOR_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Newline-delimited list of index URLs to crawl.
    #[serde(default = "default_urls_path")]
    pub urls_path: PathBuf,

    /// Directory holding one `*.toml` extraction adapter per review site.
    #[serde(default = "default_adapters_dir")]
    pub adapters_dir: PathBuf,

    /// Address to coordinate cache file.
    #[serde(default = "default_geocache_path")]
    pub geocache_path: PathBuf,

    /// Directory of cached page bodies.
    #[serde(default = "default_webcache_dir")]
    pub webcache_dir: PathBuf,

    /// Station reference data.
    #[serde(default = "default_stations_path")]
    pub stations_path: PathBuf,

    /// Output SQLite database read by the ranking service.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SAVOR_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Minimum delay between two page downloads in milliseconds.
    #[serde(default = "default_fetch_interval_ms")]
    pub fetch_interval_ms: u64,

    /// Minimum delay between two geocoder calls in milliseconds.
    #[serde(default = "default_geocode_interval_ms")]
    pub geocode_interval_ms: u64,

    /// Detail-page workers allowed in flight within one index page.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Capacity of the channel between the crawler and the geocoding stage.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Decimal places of latitude/longitude kept when computing restaurant identity.
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: u32,

    /// Google geocoding API key.
    ///
    /// Set via SAVOR_GEOCODE_API_KEY environment variable.
    #[serde(default)]
    pub geocode_api_key: Option<String>,
}

fn default_urls_path() -> PathBuf {
    PathBuf::from("data/urls.txt")
}

fn default_adapters_dir() -> PathBuf {
    PathBuf::from("adapters")
}

fn default_geocache_path() -> PathBuf {
    PathBuf::from("cache/geocache.json")
}

fn default_webcache_dir() -> PathBuf {
    PathBuf::from("cache/webcache")
}

fn default_stations_path() -> PathBuf {
    PathBuf::from("data/stations.json")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/db.sqlite3")
}

fn default_user_agent() -> String {
    "savor/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_fetch_interval_ms() -> u64 {
    100
}

fn default_geocode_interval_ms() -> u64 {
    200
}

fn default_max_concurrency() -> usize {
    16
}

fn default_channel_capacity() -> usize {
    128
}

fn default_coordinate_precision() -> u32 {
    7
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            urls_path: default_urls_path(),
            adapters_dir: default_adapters_dir(),
            geocache_path: default_geocache_path(),
            webcache_dir: default_webcache_dir(),
            stations_path: default_stations_path(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            fetch_interval_ms: default_fetch_interval_ms(),
            geocode_interval_ms: default_geocode_interval_ms(),
            max_concurrency: default_max_concurrency(),
            channel_capacity: default_channel_capacity(),
            coordinate_precision: default_coordinate_precision(),
            geocode_api_key: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_millis(self.fetch_interval_ms)
    }

    pub fn geocode_interval(&self) -> Duration {
        Duration::from_millis(self.geocode_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SAVOR_`
    /// 2. TOML file from `SAVOR_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SAVOR_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SAVOR_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if a geocoding API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_geocode_api_key(&self) -> Result<&str, ConfigError> {
        self.geocode_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "geocode_api_key".into(),
            hint: "Set SAVOR_GEOCODE_API_KEY environment variable".into(),
        })
    }
}
