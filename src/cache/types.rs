//! Core type definitions for the cache stores

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cached value type - serialized result envelopes
pub type CacheValue = String;

/// Counters for cache store activity
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Fetches that returned a live entry
    pub hits: u64,

    /// Fetches that found nothing, or only an expired entry
    pub misses: u64,

    /// Successful saves
    pub writes: u64,

    /// Number of entries currently held
    pub entries: usize,

    /// Total size of held entries in bytes
    pub size_bytes: usize,

    /// Entries dropped to respect count or size limits
    pub evictions_size: u64,

    /// Entries dropped because their lifetime ran out
    pub evictions_ttl: u64,

    /// Entries removed by delete or delete-all
    pub deletions: u64,
}

impl CacheStats {
    /// Hit rate as a percentage of all fetches
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    pub fn total_evictions(&self) -> u64 {
        self.evictions_size + self.evictions_ttl
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, writes: {}, entries: {}, size: {} bytes, evictions: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.writes,
            self.entries,
            self.size_bytes,
            self.total_evictions()
        )
    }
}
