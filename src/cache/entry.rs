//! Cache entries with optional expiry

use crate::cache::types::CacheValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A stored value together with its bookkeeping
///
/// Entries without an expiry time live until they are deleted or evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: String,

    /// The cached value
    pub value: CacheValue,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub created_at: DateTime<Utc>,

    /// Last access time (for LRU tracking)
    pub accessed_at: DateTime<Utc>,

    /// When the entry expires, `None` for entries that never expire
    pub expires_at: Option<DateTime<Utc>>,

    pub access_count: u64,

    /// Approximate size of the entry in bytes
    pub size_bytes: usize,
}

impl CacheEntry {
    /// Create an entry living for `ttl`, or forever when `ttl` is `None`
    pub fn new(key: impl Into<String>, value: CacheValue, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        // Lifetimes too large for a timestamp behave like no expiry
        let expires_at = ttl.and_then(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl))
        });
        Self::with_expiration(key, value, expires_at)
    }

    /// Create an entry with an explicit expiry time
    pub fn with_expiration(
        key: impl Into<String>,
        value: CacheValue,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();
        let mut entry = Self {
            key: key.into(),
            value,
            metadata: CacheMetadata {
                created_at: now,
                accessed_at: now,
                expires_at,
                access_count: 0,
                size_bytes: 0,
            },
        };
        entry.metadata.size_bytes = entry.calculate_size();
        entry
    }

    pub fn is_expired(&self) -> bool {
        match self.metadata.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Utc::now();
        self.metadata.access_count += 1;
    }

    pub fn age(&self) -> Duration {
        (Utc::now() - self.metadata.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Approximate size: key + value + metadata overhead
    pub fn calculate_size(&self) -> usize {
        self.key.len() + self.value.len() + std::mem::size_of::<CacheMetadata>()
    }
}
