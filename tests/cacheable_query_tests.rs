//! Integration tests for cached query execution
//!
//! These tests drive `CacheableQuery` end to end against the in-memory
//! executor, covering:
//! - Read-through caching and key changes with options
//! - Provider swaps and lifetimes
//! - Disabled caching and missing providers
//! - Corrupt entries and backend failures
//! - The file-backed store

use cacheable_query::{
    CacheKey, CacheStore, CacheableQuery, FileCacheStore, MemoryCacheStore, MemoryQueryExecutor,
    QueryCacheError, QueryCacheSettings, QueryOptions, Record,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn seeded_executor(count: usize) -> Arc<MemoryQueryExecutor> {
    let executor = Arc::new(MemoryQueryExecutor::new());
    for i in 0..count {
        executor
            .insert(Record::new("Widgets").with_field("String", format!("String{}", i)))
            .await;
    }
    executor
}

fn widgets_query(executor: Arc<MemoryQueryExecutor>, store: Arc<dyn CacheStore>) -> CacheableQuery {
    let mut query = CacheableQuery::new("Widgets", executor).with_cache_provider(store);
    query.options_mut().limit(3);
    query
}

#[tokio::test]
async fn test_fresh_store_has_no_cached_result() {
    let executor = seeded_executor(5).await;
    let query = widgets_query(executor, Arc::new(MemoryCacheStore::default()));

    assert!(!query.has_cached_result().await.unwrap());
}

#[tokio::test]
async fn test_results_are_served_from_cache() {
    let executor = seeded_executor(5).await;
    let query = widgets_query(executor.clone(), Arc::new(MemoryCacheStore::default()));

    let first = query.execute(false).await.unwrap();
    assert_eq!(first.len(), 3);
    assert!(query.has_cached_result().await.unwrap());

    // Emptying the backend proves the second answer comes from the cache
    executor.clear_collection("Widgets").await;

    let second = query.execute(false).await.unwrap();
    assert_eq!(second.len(), 3);
    assert_eq!(second, first);
    assert_eq!(executor.find_calls(), 1);
}

#[tokio::test]
async fn test_changing_options_changes_the_entry() {
    let executor = seeded_executor(5).await;
    let mut query = widgets_query(executor.clone(), Arc::new(MemoryCacheStore::default()));

    query.execute(false).await.unwrap();

    query.options_mut().limit(2);
    assert!(!query.has_cached_result().await.unwrap());

    query.options_mut().limit(3);
    assert!(query.has_cached_result().await.unwrap());

    query.options_mut().equal_to("String", "String1");
    assert!(!query.has_cached_result().await.unwrap());
    query.options_mut().remove("where");
    assert!(query.has_cached_result().await.unwrap());
}

#[tokio::test]
async fn test_set_options_restores_entry() {
    let executor = seeded_executor(5).await;
    let mut query = widgets_query(executor, Arc::new(MemoryCacheStore::default()));
    query.execute(false).await.unwrap();

    let saved = query.options().clone();
    query.set_options(QueryOptions::new());
    assert!(!query.has_cached_result().await.unwrap());

    query.set_options(saved);
    assert!(query.has_cached_result().await.unwrap());
}

#[tokio::test]
async fn test_swapping_provider() {
    let executor = seeded_executor(5).await;
    let original: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::default());
    let mut query = widgets_query(executor.clone(), original.clone());

    query.execute(false).await.unwrap();
    assert!(query.has_cached_result().await.unwrap());

    query.set_cache_provider(Arc::new(MemoryCacheStore::default()));
    assert!(!query.has_cached_result().await.unwrap());

    query.set_cache_provider(original.clone());
    assert!(query.has_cached_result().await.unwrap());
    assert!(Arc::ptr_eq(query.cache_provider().unwrap(), &original));
}

#[tokio::test]
async fn test_cache_lifetime_expires_entries() {
    let executor = seeded_executor(5).await;
    let mut query = widgets_query(executor.clone(), Arc::new(MemoryCacheStore::default()));
    query.set_cache_lifetime(3);

    query.execute(false).await.unwrap();
    assert!(query.has_cached_result().await.unwrap());

    tokio::time::sleep(Duration::from_secs(4)).await;

    assert!(!query.has_cached_result().await.unwrap());
    query.execute(false).await.unwrap();
    assert_eq!(executor.find_calls(), 2);
}

#[tokio::test]
async fn test_zero_lifetime_never_expires() {
    let executor = seeded_executor(5).await;
    let mut query = widgets_query(executor, Arc::new(MemoryCacheStore::default()));
    query.set_cache_lifetime(0);

    query.execute(false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert!(query.has_cached_result().await.unwrap());
}

#[tokio::test]
async fn test_disabled_cache_bypasses_store() {
    let executor = seeded_executor(5).await;
    let store = Arc::new(MemoryCacheStore::default());
    let mut query = widgets_query(executor.clone(), store.clone());
    query.set_cache_enabled(false);

    query.execute(false).await.unwrap();
    query.execute(false).await.unwrap();

    assert_eq!(executor.find_calls(), 2);
    assert!(store.is_empty().await);

    query.set_cache_enabled(true);
    query.execute(false).await.unwrap();
    assert!(query.has_cached_result().await.unwrap());
}

#[tokio::test]
async fn test_disabled_cache_without_provider() {
    let executor = seeded_executor(5).await;
    let settings = QueryCacheSettings {
        cache_enabled: false,
        ..QueryCacheSettings::default()
    };
    let query = CacheableQuery::with_settings("Widgets", executor.clone(), settings);

    assert_eq!(query.execute(false).await.unwrap().len(), 5);
    assert!(matches!(
        query.has_cached_result().await,
        Err(QueryCacheError::ConfigurationError(_))
    ));
}

#[tokio::test]
async fn test_enabled_cache_without_provider_fails_before_execution() {
    let executor = seeded_executor(5).await;
    let query = CacheableQuery::new("Widgets", executor.clone());

    let err = query.execute(false).await.unwrap_err();
    assert!(matches!(err, QueryCacheError::ConfigurationError(_)));
    assert_eq!(executor.find_calls(), 0);
}

#[tokio::test]
async fn test_backend_failure_is_propagated_and_not_cached() {
    let executor = seeded_executor(5).await;
    let query = widgets_query(executor.clone(), Arc::new(MemoryCacheStore::default()));

    executor.set_failure(Some("connection reset".to_string())).await;
    let err = query.execute(false).await.unwrap_err();
    assert!(matches!(err, QueryCacheError::ExecutionError(_)));
    assert!(!query.has_cached_result().await.unwrap());

    executor.set_failure(None).await;
    assert_eq!(query.execute(false).await.unwrap().len(), 3);
    assert!(query.has_cached_result().await.unwrap());
}

#[tokio::test]
async fn test_corrupt_entry_is_replaced() {
    let executor = seeded_executor(5).await;
    let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::default());
    let query = widgets_query(executor.clone(), store.clone());

    let key = CacheKey::derive("Widgets", query.options()).unwrap();
    assert_eq!(key, query.cache_key().unwrap());
    store.save(key.as_str(), "garbage".to_string(), 60).await.unwrap();

    let records = query.execute(false).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(executor.find_calls(), 1);

    query.execute(false).await.unwrap();
    assert_eq!(executor.find_calls(), 1);
}

#[tokio::test]
async fn test_clearing_results() {
    let executor = seeded_executor(5).await;
    let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::default());
    let mut query = widgets_query(executor, store.clone());

    query.execute(false).await.unwrap();
    query.options_mut().limit(2);
    query.execute(false).await.unwrap();

    assert!(query.clear_cached_result().await.unwrap());
    assert!(!query.has_cached_result().await.unwrap());

    query.options_mut().limit(3);
    assert!(query.has_cached_result().await.unwrap());

    store.save("unrelated", "value".to_string(), 0).await.unwrap();
    assert!(query.clear_all_cached_results().await.unwrap());
    assert!(!query.has_cached_result().await.unwrap());
    assert!(!store.contains("unrelated").await.unwrap());
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let tmp = TempDir::new().unwrap();
    let executor = seeded_executor(5).await;

    {
        let store = Arc::new(FileCacheStore::new(tmp.path()).await.unwrap());
        let query = widgets_query(executor.clone(), store);
        query.execute(false).await.unwrap();
    }

    // A new store over the same directory sees the persisted entry
    executor.clear_collection("Widgets").await;
    let store = Arc::new(FileCacheStore::new(tmp.path()).await.unwrap());
    let query = widgets_query(executor.clone(), store);

    assert!(query.has_cached_result().await.unwrap());
    assert_eq!(query.execute(false).await.unwrap().len(), 3);
    assert_eq!(executor.find_calls(), 1);
}

#[tokio::test]
async fn test_elevated_access_does_not_split_the_cache() {
    let executor = seeded_executor(5).await;
    let query = widgets_query(executor.clone(), Arc::new(MemoryCacheStore::default()));

    query.execute(true).await.unwrap();
    assert_eq!(executor.elevated_calls(), 1);

    query.execute(false).await.unwrap();
    assert_eq!(executor.find_calls(), 1);
}

#[tokio::test]
async fn test_shared_store_isolates_collections() {
    let executor = seeded_executor(5).await;
    executor.insert(Record::new("Gadgets").with_field("name", "lever")).await;
    let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::default());

    let widgets = widgets_query(executor.clone(), store.clone());
    let mut gadgets = CacheableQuery::new("Gadgets", executor.clone()).with_cache_provider(store);
    gadgets.options_mut().limit(3);

    assert_ne!(widgets.cache_key().unwrap(), gadgets.cache_key().unwrap());

    assert_eq!(widgets.execute(false).await.unwrap().len(), 3);
    assert_eq!(gadgets.execute(false).await.unwrap().len(), 1);
    assert_eq!(executor.find_calls(), 2);
}
