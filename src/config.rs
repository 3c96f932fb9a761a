//! Configuration management and validation.
//!
//! Provides the cache and topology settings for the engine and the CLI, with
//! layered loading: defaults, then an optional TOML file, then environment
//! variables. CLI flags are applied on top by the command layer.

use crate::app::services::freshness::FreshnessStrategy;
use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_FALLBACK_URL, DEFAULT_LOCK_POLL_INTERVAL,
    DEFAULT_LOCK_TIMEOUT, DEFAULT_MEDIA_URL, DEFAULT_TOPOLOGY_FILE, DEFAULT_UNIT_PRICE,
    ENV_CACHE_DIR, ENV_LOCK_TIMEOUT_MS, ENV_TOPOLOGY_PATH,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Settings for the graph cache and its rebuild lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the lock file and the artifact directory
    pub cache_dir: PathBuf,

    /// URL prefix under which `cache_dir` is served
    pub media_url: String,

    /// Degraded redirect target when no map can be produced
    pub fallback_url: String,

    /// Maximum wait for the rebuild lock, in milliseconds
    pub lock_timeout_ms: u64,

    /// Interval between lock attempts, in milliseconds
    pub lock_poll_interval_ms: u64,

    /// Cache identity strategy
    pub freshness: FreshnessStrategy,

    /// Drop stations without edges from the built graph
    pub prune_isolated: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_data_dir().join("cache"),
            media_url: DEFAULT_MEDIA_URL.to_string(),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
            lock_poll_interval_ms: DEFAULT_LOCK_POLL_INTERVAL.as_millis() as u64,
            freshness: FreshnessStrategy::default(),
            prune_isolated: false,
        }
    }
}

impl CacheConfig {
    /// Create a configuration rooted at a cache directory
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Default::default()
        }
    }

    /// Set the freshness strategy
    pub fn with_freshness(mut self, freshness: FreshnessStrategy) -> Self {
        self.freshness = freshness;
        self
    }

    /// Set the lock timeout
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the lock polling interval
    pub fn with_lock_poll_interval(mut self, interval: Duration) -> Self {
        self.lock_poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Enable or disable pruning of isolated stations
    pub fn with_prune_isolated(mut self, prune_isolated: bool) -> Self {
        self.prune_isolated = prune_isolated;
        self
    }

    /// Lock timeout as a duration
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Lock polling interval as a duration
    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lock_poll_interval_ms)
    }

    /// Validate cache settings
    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == 0 {
            return Err(Error::configuration("lock_timeout_ms must be greater than zero"));
        }
        if self.lock_poll_interval_ms == 0 {
            return Err(Error::configuration(
                "lock_poll_interval_ms must be greater than zero",
            ));
        }
        if self.lock_poll_interval_ms >= self.lock_timeout_ms {
            return Err(Error::configuration(format!(
                "lock_poll_interval_ms ({}) must be below lock_timeout_ms ({})",
                self.lock_poll_interval_ms, self.lock_timeout_ms
            )));
        }
        if self.media_url.trim().is_empty() {
            return Err(Error::configuration("media_url cannot be empty"));
        }
        if self.fallback_url.trim().is_empty() {
            return Err(Error::configuration("fallback_url cannot be empty"));
        }
        Ok(())
    }
}

/// Settings for the topology document used by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Path of the JSON topology document
    pub path: PathBuf,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            path: default_data_dir().join(DEFAULT_TOPOLOGY_FILE),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Graph cache settings
    pub cache: CacheConfig,

    /// Topology document settings
    pub topology: TopologyConfig,

    /// Price per hop for CLI route quotes
    pub unit_price: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            topology: TopologyConfig::default(),
            unit_price: DEFAULT_UNIT_PRICE,
        }
    }
}

/// Per-user data directory for the application
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

impl Config {
    /// Default config file location (`<config_dir>/transit-graph/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Could not determine user config directory"))
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file '{}'", path.display()), e)
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::serialization(format!("Invalid config file '{}'", path.display()), e)
        })
    }

    /// Load configuration using the layered approach (defaults -> file -> env)
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            debug!("{} overrides cache_dir", ENV_CACHE_DIR);
            self.cache.cache_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(ENV_TOPOLOGY_PATH) {
            debug!("{} overrides topology path", ENV_TOPOLOGY_PATH);
            self.topology.path = PathBuf::from(path);
        }
        if let Some(timeout) = lookup(ENV_LOCK_TIMEOUT_MS) {
            self.cache.lock_timeout_ms = timeout.trim().parse().map_err(|_| {
                Error::configuration(format!(
                    "{} must be a whole number of milliseconds, got '{}'",
                    ENV_LOCK_TIMEOUT_MS, timeout
                ))
            })?;
        }
        Ok(())
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        if !(self.unit_price.is_finite() && self.unit_price >= 0.0) {
            return Err(Error::configuration(format!(
                "unit_price must be a non-negative number, got {}",
                self.unit_price
            )));
        }
        Ok(())
    }
}
