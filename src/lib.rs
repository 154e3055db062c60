//! # Cacheable Query
//!
//! Read-through caching for remote collection queries.
//!
//! ## Features
//!
//! - Cache keys derived from the collection name and the full, order-independent query options
//! - Pluggable [`CacheStore`] backends: in-memory with LRU eviction, or one file per entry
//! - Per-query cache lifetime with a never-expire setting
//! - Undecodable cache entries are treated as misses and overwritten
//! - Async-first design using tokio
//!
//! ## Usage
//!
//! ```no_run
//! use cacheable_query::{CacheableQuery, MemoryCacheStore, MemoryQueryExecutor, Record};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let executor = Arc::new(MemoryQueryExecutor::new());
//!     executor.insert(Record::new("Widgets").with_field("name", "bolt")).await;
//!
//!     let mut query = CacheableQuery::new("Widgets", executor)
//!         .with_cache_provider(Arc::new(MemoryCacheStore::default()));
//!     query.set_cache_lifetime(300);
//!     query.options_mut().equal_to("name", "bolt").limit(10);
//!
//!     let records = query.execute(false).await?;
//!     println!("Found {} widgets (cached: {})", records.len(), query.has_cached_result().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Decorator defaults can be read from the environment with
//! [`QueryCacheSettings::from_env`]:
//!
//! - `QUERY_CACHE_ENABLED`: `true`/`false` (default `true`)
//! - `QUERY_CACHE_LIFETIME`: seconds, `0` for no expiry (default `3600`)

pub mod cache;
pub mod cacheable;
pub mod error;
pub mod executor;
pub mod query;

pub use cache::{
    CacheConfig, CacheStats, CacheStore, CachedQueryResult, FileCacheStore, MemoryCacheStore,
    QueryCacheSettings,
};
pub use cacheable::CacheableQuery;
pub use error::{QueryCacheError, Result};
pub use executor::{MemoryQueryExecutor, QueryExecutor};
pub use query::{CacheKey, QueryOptions, Record};
