//! # Cache Stores
//!
//! Storage side of query result caching: the [`CacheStore`] contract plus two
//! implementations and the serialized envelope written into them.
//!
//! ## Features
//!
//! - **Per-entry lifetimes**: every save carries its own TTL, 0 meaning no expiry
//! - **Expiry on read**: expired entries are reported absent and purged lazily
//! - **Memory store**: LRU eviction by entry count and total size, hit/miss statistics
//! - **File store**: one JSON file per key, survives process restarts
//!
//! ## Example
//!
//! ```rust
//! use cacheable_query::cache::{CacheConfig, CacheStore, MemoryCacheStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CacheConfig::builder()
//!     .max_entries(10_000)
//!     .max_size_bytes(100 * 1024 * 1024) // 100 MB
//!     .build();
//!
//! let store = MemoryCacheStore::new(config)?;
//!
//! store.save("query:123", "cached response".to_string(), 3600).await?;
//!
//! if let Some(value) = store.fetch("query:123").await? {
//!     println!("Cache hit: {}", value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod file;
pub mod provider;
pub mod result;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder, QueryCacheSettings, DEFAULT_CACHE_LIFETIME_SECS};
pub use entry::{CacheEntry, CacheMetadata};
pub use file::FileCacheStore;
pub use provider::CacheStore;
pub use result::CachedQueryResult;
pub use store::{start_auto_cleanup, MemoryCacheStore};
pub use types::{CacheStats, CacheValue};
