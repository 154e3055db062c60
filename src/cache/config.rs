//! Configuration for cached queries and the in-memory store

use crate::error::{QueryCacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default lifetime of a cached query result (1 hour)
pub const DEFAULT_CACHE_LIFETIME_SECS: u64 = 3600;

/// Environment variable enabling or disabling result caching
pub const ENV_CACHE_ENABLED: &str = "QUERY_CACHE_ENABLED";

/// Environment variable holding the result lifetime in seconds
pub const ENV_CACHE_LIFETIME: &str = "QUERY_CACHE_LIFETIME";

/// Decorator defaults applied when a cacheable query is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCacheSettings {
    /// Whether results are read from and written to the cache
    pub cache_enabled: bool,

    /// Lifetime of cached results in seconds (0 = never expire)
    pub cache_lifetime: u64,
}

impl Default for QueryCacheSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_lifetime: DEFAULT_CACHE_LIFETIME_SECS,
        }
    }
}

impl QueryCacheSettings {
    /// Load settings from the process environment (and a `.env` file, if any)
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup(ENV_CACHE_ENABLED) {
            settings.cache_enabled = parse_bool(&raw).ok_or_else(|| {
                QueryCacheError::ConfigurationError(format!(
                    "{} must be a boolean, got '{}'",
                    ENV_CACHE_ENABLED, raw
                ))
            })?;
        }

        if let Some(raw) = lookup(ENV_CACHE_LIFETIME) {
            settings.cache_lifetime = raw.trim().parse().map_err(|_| {
                QueryCacheError::ConfigurationError(format!(
                    "{} must be a number of seconds, got '{}'",
                    ENV_CACHE_LIFETIME, raw
                ))
            })?;
        }

        debug!("Loaded query cache settings: {:?}", settings);
        Ok(settings)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration for the in-memory cache store
///
/// Entry lifetimes come from each `save` call; this only bounds how much the
/// store holds and how it cleans up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries in the store
    pub max_entries: usize,

    /// Maximum total size of stored data in bytes
    pub max_size_bytes: usize,

    /// TTL jitter factor (0.0 - 1.0)
    /// Spreads expiry of entries saved together; 0.0 keeps lifetimes exact
    pub ttl_jitter: f64,

    /// Evict least recently used entries first when limits are hit
    pub enable_lru_eviction: bool,

    /// Maintain size statistics on every write
    pub enable_metrics: bool,

    /// Periodically purge expired entries
    pub enable_auto_cleanup: bool,

    /// Interval for automatic cleanup checks
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            // 100 MB
            max_size_bytes: 100 * 1024 * 1024,
            ttl_jitter: 0.0,
            enable_lru_eviction: true,
            enable_metrics: true,
            enable_auto_cleanup: true,
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(QueryCacheError::ConfigurationError(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        if self.max_size_bytes == 0 {
            return Err(QueryCacheError::ConfigurationError(
                "max_size_bytes must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(QueryCacheError::ConfigurationError(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.enable_auto_cleanup && self.cleanup_interval.is_zero() {
            return Err(QueryCacheError::ConfigurationError(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply the configured jitter to a lifetime
    pub fn ttl_with_jitter(&self, ttl: Duration) -> Duration {
        if self.ttl_jitter == 0.0 {
            return ttl;
        }

        let base_secs = ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(1.0);

        Duration::from_secs_f64(final_secs)
    }

    /// Configuration for memory-constrained environments
    pub fn small() -> Self {
        Self {
            max_entries: 1_000,
            max_size_bytes: 10 * 1024 * 1024, // 10 MB
            ..Default::default()
        }
    }

    /// Configuration for large result sets shared by many queries
    pub fn large() -> Self {
        Self {
            max_entries: 1_000_000,
            max_size_bytes: 4 * 1024 * 1024 * 1024, // 4 GB
            ..Default::default()
        }
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    max_entries: Option<usize>,
    max_size_bytes: Option<usize>,
    ttl_jitter: Option<f64>,
    enable_lru_eviction: Option<bool>,
    enable_metrics: Option<bool>,
    enable_auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
}

impl CacheConfigBuilder {
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    pub fn max_size_bytes(mut self, size: usize) -> Self {
        self.max_size_bytes = Some(size);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    pub fn enable_lru_eviction(mut self, enable: bool) -> Self {
        self.enable_lru_eviction = Some(enable);
        self
    }

    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            max_size_bytes: self.max_size_bytes.unwrap_or(defaults.max_size_bytes),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_lru_eviction: self
                .enable_lru_eviction
                .unwrap_or(defaults.enable_lru_eviction),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
        }
    }
}
