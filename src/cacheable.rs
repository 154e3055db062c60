//! Read-through caching around query execution
//!
//! [`CacheableQuery`] owns a collection name and a [`QueryOptions`] value and
//! answers `execute()` either from a [`CacheStore`] or by delegating to a
//! [`QueryExecutor`], writing fresh results back to the store.

use crate::cache::{CacheStore, CachedQueryResult, QueryCacheSettings};
use crate::error::{QueryCacheError, Result};
use crate::executor::QueryExecutor;
use crate::query::{CacheKey, QueryOptions, Record};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A query whose results are cached per (collection, options) pair
///
/// The cache key is derived from the live options on every call, so changing
/// an option moves the query to a different cache entry and changing it back
/// finds the earlier entry again.
///
/// No single-flight protection is attempted: two callers missing on the same
/// key both execute the query and the last write wins.
///
/// # Example
/// ```no_run
/// use cacheable_query::{CacheableQuery, MemoryCacheStore, MemoryQueryExecutor};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let executor = Arc::new(MemoryQueryExecutor::new());
/// let mut query = CacheableQuery::new("Widgets", executor)
///     .with_cache_provider(Arc::new(MemoryCacheStore::default()));
///
/// query.options_mut().limit(3);
///
/// let first = query.execute(false).await?; // executes and caches
/// let again = query.execute(false).await?; // served from the cache
/// assert_eq!(first, again);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CacheableQuery {
    collection: String,
    options: QueryOptions,
    executor: Arc<dyn QueryExecutor>,
    cache_enabled: bool,
    cache_lifetime: u64,
    cache_provider: Option<Arc<dyn CacheStore>>,
}

impl CacheableQuery {
    /// Create a query on `collection` with caching enabled for one hour
    pub fn new(collection: impl Into<String>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self::with_settings(collection, executor, QueryCacheSettings::default())
    }

    /// Create a query with explicit cache defaults
    pub fn with_settings(
        collection: impl Into<String>,
        executor: Arc<dyn QueryExecutor>,
        settings: QueryCacheSettings,
    ) -> Self {
        Self {
            collection: collection.into(),
            options: QueryOptions::new(),
            executor,
            cache_enabled: settings.cache_enabled,
            cache_lifetime: settings.cache_lifetime,
            cache_provider: None,
        }
    }

    /// Set the cache store, builder style
    pub fn with_cache_provider(mut self, provider: Arc<dyn CacheStore>) -> Self {
        self.cache_provider = Some(provider);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Mutable access to the options; the next cache check sees the change
    pub fn options_mut(&mut self) -> &mut QueryOptions {
        &mut self.options
    }

    pub fn set_options(&mut self, options: QueryOptions) {
        self.options = options;
    }

    /// The cache key for the current collection and options
    pub fn cache_key(&self) -> Result<CacheKey> {
        CacheKey::derive(&self.collection, &self.options)
    }

    /// Return the query results, from the cache when possible
    ///
    /// With caching enabled a store must be configured, otherwise this fails
    /// with [`QueryCacheError::ConfigurationError`] before any I/O. Entries
    /// that cannot be decoded are treated as misses. Executor errors are
    /// returned unchanged and nothing is cached for them.
    pub async fn execute(&self, use_elevated_access: bool) -> Result<Vec<Record>> {
        let cache = if self.cache_enabled {
            let store = self.require_provider("Cache is enabled but no cache store has been set")?;
            Some((store, self.cache_key()?))
        } else {
            None
        };

        if let Some((store, key)) = &cache {
            if let Some(records) = self.lookup(*store, key).await? {
                return Ok(records);
            }
        }

        let started = Instant::now();
        let records = self
            .executor
            .find(&self.collection, &self.options, use_elevated_access)
            .await?;
        let execution_time_ms = started.elapsed().as_millis() as u64;

        if let Some((store, key)) = &cache {
            self.populate(*store, key, &records, execution_time_ms).await;
        }

        Ok(records)
    }

    /// True if the store holds a live entry for the current options
    pub async fn has_cached_result(&self) -> Result<bool> {
        let store = self.require_provider("No cache store has been set")?;
        let key = self.cache_key()?;
        store.contains(key.as_str()).await
    }

    /// Delete the entry for the current options
    ///
    /// Returns whether an entry was removed.
    pub async fn clear_cached_result(&self) -> Result<bool> {
        let store = self.require_provider("No cache store has been set")?;
        let key = self.cache_key()?;

        let removed = store.delete(key.as_str()).await?;
        debug!("Cleared cached result {} (removed: {})", key, removed);
        Ok(removed)
    }

    /// Delete every entry in the configured store
    ///
    /// This is not scoped to this query or collection: entries written by
    /// anything else sharing the store are removed as well.
    pub async fn clear_all_cached_results(&self) -> Result<bool> {
        let store = self.require_provider("No cache store has been set")?;

        info!("Clearing all entries from {} cache store", store.provider_name());
        store.delete_all().await
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    /// Lifetime of cached results in seconds (0 = never expire)
    pub fn cache_lifetime(&self) -> u64 {
        self.cache_lifetime
    }

    pub fn set_cache_lifetime(&mut self, lifetime_secs: u64) {
        self.cache_lifetime = lifetime_secs;
    }

    pub fn cache_provider(&self) -> Option<&Arc<dyn CacheStore>> {
        self.cache_provider.as_ref()
    }

    pub fn set_cache_provider(&mut self, provider: Arc<dyn CacheStore>) {
        self.cache_provider = Some(provider);
    }

    /// Detach the cache store, returning it
    pub fn take_cache_provider(&mut self) -> Option<Arc<dyn CacheStore>> {
        self.cache_provider.take()
    }

    fn require_provider(&self, message: &str) -> Result<&dyn CacheStore> {
        self.cache_provider
            .as_deref()
            .ok_or_else(|| QueryCacheError::ConfigurationError(message.to_string()))
    }

    async fn lookup(&self, store: &dyn CacheStore, key: &CacheKey) -> Result<Option<Vec<Record>>> {
        if !store.contains(key.as_str()).await? {
            debug!("Cache miss for {} ({})", self.collection, key);
            return Ok(None);
        }

        // The entry can expire between contains and fetch
        let value = match store.fetch(key.as_str()).await? {
            Some(value) => value,
            None => {
                debug!("Cache entry {} vanished before fetch", key);
                return Ok(None);
            }
        };

        match CachedQueryResult::from_cache_value(&value) {
            Ok(cached) if cached.is_consistent() => {
                debug!(
                    "Cache hit for {} ({}): {} records",
                    self.collection, key, cached.record_count
                );
                Ok(Some(cached.records))
            }
            Ok(cached) => {
                warn!(
                    "Ignoring cache entry {}: holds {} records but claims {}",
                    key,
                    cached.records.len(),
                    cached.record_count
                );
                Ok(None)
            }
            Err(e) => {
                warn!("Ignoring undecodable cache entry {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Write a fresh result; failures are logged, the caller still gets the records
    async fn populate(
        &self,
        store: &dyn CacheStore,
        key: &CacheKey,
        records: &[Record],
        execution_time_ms: u64,
    ) {
        let value = match CachedQueryResult::new(&self.collection, records.to_vec(), execution_time_ms)
            .to_cache_value()
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not encode result for {}: {}", key, e);
                return;
            }
        };

        match store.save(key.as_str(), value, self.cache_lifetime).await {
            Ok(true) => debug!(
                "Cached {} records for {} under {} (lifetime: {}s)",
                records.len(),
                self.collection,
                key,
                self.cache_lifetime
            ),
            Ok(false) => warn!(
                "{} cache store declined entry {}",
                store.provider_name(),
                key
            ),
            Err(e) => warn!("Failed to cache result under {}: {}", key, e),
        }
    }
}

impl fmt::Debug for CacheableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheableQuery")
            .field("collection", &self.collection)
            .field("options", &self.options)
            .field("cache_enabled", &self.cache_enabled)
            .field("cache_lifetime", &self.cache_lifetime)
            .field("cache_provider", &self.cache_provider)
            .finish_non_exhaustive()
    }
}
