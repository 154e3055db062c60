//! In-memory cache store with per-entry TTL and LRU eviction

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    provider::CacheStore,
    types::{CacheStats, CacheValue},
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Process-local [`CacheStore`]
///
/// - Thread-safe async access via RwLock
/// - Expiry checked on every read
/// - LRU eviction when the entry count or size limit is reached
pub struct MemoryCacheStore {
    pub(crate) config: CacheConfig,
    state: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<String, CacheEntry>,

    /// Access order, least recently used first
    lru_queue: VecDeque<String>,

    stats: CacheStats,

    current_size_bytes: usize,
}

impl MemoryCacheStore {
    /// Create a store, rejecting an invalid configuration
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing memory cache store with config: {:?}", config);

        Ok(Self {
            config,
            state: RwLock::new(StoreState::default()),
        })
    }

    /// Store a value, evicting older entries if limits require it
    ///
    /// Returns false when the value alone exceeds the size limit.
    pub async fn insert(&self, key: &str, value: CacheValue, ttl: Option<Duration>) -> bool {
        let ttl = ttl.map(|ttl| self.config.ttl_with_jitter(ttl));
        let entry = CacheEntry::new(key, value, ttl);
        let size = entry.metadata.size_bytes;

        if size > self.config.max_size_bytes {
            warn!(
                "Entry {} ({} bytes) exceeds the store size limit of {} bytes",
                key, size, self.config.max_size_bytes
            );
            return false;
        }

        let mut state = self.state.write().await;

        // Replacing an entry frees its space before limits are checked
        Self::remove_entry(&mut state, key);
        self.evict_if_needed(&mut state, size);

        debug!("Storing cache entry: {} ({} bytes)", key, size);
        state.entries.insert(key.to_string(), entry);
        state.lru_queue.push_back(key.to_string());
        state.current_size_bytes += size;
        state.stats.writes += 1;

        self.update_stats(&mut state);
        true
    }

    /// Remove all expired entries, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut state = self.state.write().await;

        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            Self::remove_entry(&mut state, key);
        }

        if !expired.is_empty() {
            state.stats.evictions_ttl += expired.len() as u64;
            self.update_stats(&mut state);
            debug!("Cleaned up {} expired entries", expired.len());
        }

        expired.len()
    }

    pub async fn stats(&self) -> CacheStats {
        self.state.read().await.stats.clone()
    }

    pub async fn size_bytes(&self) -> usize {
        self.state.read().await.current_size_bytes
    }

    /// Number of held entries, expired ones included until they are purged
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    fn remove_entry(state: &mut StoreState, key: &str) -> bool {
        match state.entries.remove(key) {
            Some(entry) => {
                state.lru_queue.retain(|k| k != key);
                state.current_size_bytes = state
                    .current_size_bytes
                    .saturating_sub(entry.metadata.size_bytes);
                true
            }
            None => false,
        }
    }

    fn evict_if_needed(&self, state: &mut StoreState, needed_size: usize) {
        while state.entries.len() >= self.config.max_entries
            || state.current_size_bytes + needed_size > self.config.max_size_bytes
        {
            match state.lru_queue.pop_front() {
                Some(key) => {
                    debug!("Evicting cache entry to respect store limits: {}", key);
                    Self::remove_entry(state, &key);
                    state.stats.evictions_size += 1;
                }
                None => break,
            }
        }
    }

    fn update_stats(&self, state: &mut StoreState) {
        state.stats.entries = state.entries.len();
        if self.config.enable_metrics {
            state.stats.size_bytes = state.current_size_bytes;
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self {
            config: CacheConfig::default(),
            state: RwLock::new(StoreState::default()),
        }
    }
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn contains(&self, key: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(key)
            .map_or(false, |entry| !entry.is_expired()))
    }

    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut state = self.state.write().await;

        let expired = match state.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                debug!("Cache miss: {}", key);
                state.stats.misses += 1;
                return Ok(None);
            }
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            Self::remove_entry(&mut state, key);
            state.stats.misses += 1;
            state.stats.evictions_ttl += 1;
            self.update_stats(&mut state);
            return Ok(None);
        }

        let value = match state.entries.get_mut(key) {
            Some(entry) => {
                entry.mark_accessed();
                entry.value.clone()
            }
            None => return Ok(None),
        };
        state.stats.hits += 1;

        if self.config.enable_lru_eviction {
            state.lru_queue.retain(|k| k != key);
            state.lru_queue.push_back(key.to_string());
        }

        debug!("Cache hit: {}", key);
        Ok(Some(value))
    }

    async fn save(&self, key: &str, value: CacheValue, ttl_secs: u64) -> Result<bool> {
        let ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));
        Ok(self.insert(key, value, ttl).await)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write().await;

        let removed = Self::remove_entry(&mut state, key);
        if removed {
            state.stats.deletions += 1;
            self.update_stats(&mut state);
            debug!("Removed cache entry: {}", key);
        }

        Ok(removed)
    }

    async fn delete_all(&self) -> Result<bool> {
        let mut state = self.state.write().await;

        let count = state.entries.len();
        state.entries.clear();
        state.lru_queue.clear();
        state.current_size_bytes = 0;
        state.stats.deletions += count as u64;
        self.update_stats(&mut state);

        info!("Cleared {} entries from memory cache store", count);
        Ok(true)
    }

    fn provider_name(&self) -> &str {
        "memory"
    }
}

/// Background task purging expired entries at the configured interval
///
/// Returns immediately when `enable_auto_cleanup` is off.
pub async fn start_auto_cleanup(store: Arc<MemoryCacheStore>) {
    if !store.config.enable_auto_cleanup {
        debug!("Automatic cache cleanup disabled");
        return;
    }

    let interval = store.config.cleanup_interval;

    info!("Starting automatic cache cleanup task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        let removed = store.cleanup_expired().await;
        if removed > 0 {
            debug!("Auto cleanup removed {} entries", removed);
        }
    }
}
