//! Query Cache Demo Application
//!
//! Runs the same query twice against an in-memory backend and shows the
//! second call being answered from the cache.
//!
//! Usage:
//!   cargo run --example query_cache_demo
//!
//! Environment variables:
//!   QUERY_CACHE_ENABLED  - enable result caching (default: true)
//!   QUERY_CACHE_LIFETIME - lifetime of cached results in seconds (default: 3600)
//!   QUERY_CACHE_DIR      - use a file cache store in this directory instead of memory

use cacheable_query::{
    CacheStore, CacheableQuery, FileCacheStore, MemoryCacheStore, MemoryQueryExecutor,
    QueryCacheSettings, Record,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("=== Query Cache Demo ===");

    let settings = QueryCacheSettings::from_env()?;
    info!(
        "Cache enabled: {}, lifetime: {}s",
        settings.cache_enabled, settings.cache_lifetime
    );

    let store: Arc<dyn CacheStore> = match std::env::var("QUERY_CACHE_DIR") {
        Ok(dir) => Arc::new(FileCacheStore::new(dir).await?),
        Err(_) => Arc::new(MemoryCacheStore::default()),
    };

    let executor = Arc::new(MemoryQueryExecutor::new());
    for i in 0..5 {
        executor
            .insert(
                Record::new("Widgets")
                    .with_field("name", format!("widget-{}", i))
                    .with_field("price", 10 + i * 5),
            )
            .await;
    }

    let mut query = CacheableQuery::with_settings("Widgets", executor.clone(), settings)
        .with_cache_provider(store);
    query.options_mut().descending("price").limit(3);

    info!("Cache key: {}", query.cache_key()?);

    info!("\n--- First execution ---");
    let first = query.execute(false).await?;
    info!(
        "Got {} records (backend calls: {}, cached: {})",
        first.len(),
        executor.find_calls(),
        query.has_cached_result().await?
    );

    info!("\n--- Second execution ---");
    let second = query.execute(false).await?;
    info!(
        "Got {} records (backend calls: {}, identical: {})",
        second.len(),
        executor.find_calls(),
        first == second
    );

    info!("\n--- Changed options ---");
    query.options_mut().limit(2);
    info!("Cached for limit 2: {}", query.has_cached_result().await?);
    query.options_mut().limit(3);
    info!("Cached for limit 3: {}", query.has_cached_result().await?);

    query.clear_cached_result().await?;
    info!("Cached after clear: {}", query.has_cached_result().await?);

    Ok(())
}
