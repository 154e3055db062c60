//! Cache store port
//!
//! Contract for the key/value backends a cacheable query writes its results
//! to. Lifetimes are given in seconds per entry; 0 means the entry never
//! expires. Expired entries must be reported as absent by both
//! [`CacheStore::contains`] and [`CacheStore::fetch`].

use crate::cache::types::CacheValue;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// True if a live entry exists for `key`
    async fn contains(&self, key: &str) -> Result<bool>;

    /// The value stored under `key`, `None` if absent or expired
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Store `value` under `key` for `ttl_secs` seconds (0 = no expiry)
    ///
    /// Returns false if the store declined the entry.
    async fn save(&self, key: &str, value: CacheValue, ttl_secs: u64) -> Result<bool>;

    /// Remove the entry for `key`, returning whether one was removed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every entry held by the store
    async fn delete_all(&self) -> Result<bool>;

    /// Short identifier for logs (e.g. "memory", "file")
    fn provider_name(&self) -> &str;
}
