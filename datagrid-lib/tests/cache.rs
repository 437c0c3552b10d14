//! Result cache behaviour against the bundled providers.

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use common::ids;
use common::init_logger;
use datagrid_lib::cache::CacheConfig;
use datagrid_lib::cache::CacheProvider;
use datagrid_lib::cache::InMemoryCache;
use datagrid_lib::cache::ResultCache;
use datagrid_lib::cache::SqliteCache;
use datagrid_lib::model::Collection;
use datagrid_lib::model::Record;

fn orders() -> Collection {
    vec![
        Record::new().set("id", 1).set("status", "open"),
        Record::new()
            .set("id", 2)
            .set("status", "closed")
            .set("customer", Record::new().set("name", "Contoso")),
    ]
    .into()
}

#[tokio::test]
async fn test_concurrent_first_access_materializes_once() {
    init_logger();
    let cache = ResultCache::new(InMemoryCache::new());
    let calls = AtomicUsize::new(0);
    let produce = || {
        calls.fetch_add(1, Ordering::SeqCst);
        orders()
    };

    let (a, b) = tokio::join!(cache.remember("grid", produce), cache.remember("grid", produce));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.unwrap().into_inner(), b.unwrap().into_inner());
}

#[tokio::test]
async fn test_sqlite_cache_survives_new_result_cache() {
    let dir = std::env::temp_dir().join(format!("datagrid-cache-{}.db", uuid::Uuid::new_v4()));

    {
        let cache = ResultCache::new(SqliteCache::open(&dir).await.unwrap());
        let response = cache.remember("grid", orders).await.unwrap();
        assert!(response.cache.is_miss());
    }

    let cache = ResultCache::new(SqliteCache::open(&dir).await.unwrap());
    let response = cache.remember("grid", Collection::new).await.unwrap();
    assert!(response.cache.is_hit());
    assert_eq!(ids(response.data().records()), vec![1, 2]);
    assert_eq!(response.into_inner(), orders());

    let _ = std::fs::remove_file(&dir);
}

#[tokio::test]
async fn test_key_prefix_separates_caches() {
    let provider: Arc<dyn CacheProvider> = Arc::new(InMemoryCache::new());
    let left = ResultCache::with_config(provider.clone(), CacheConfig::default().with_key_prefix("left"));
    let right = ResultCache::with_config(provider.clone(), CacheConfig::default().with_key_prefix("right"));

    left.remember("grid", orders).await.unwrap();
    assert!(right.get("grid").await.unwrap().is_none());
    assert!(provider.get("left:grid").await.unwrap().is_some());
}

#[tokio::test]
async fn test_forget_on_sqlite_cache() {
    let cache = ResultCache::new(SqliteCache::open_in_memory().await.unwrap());
    cache.remember("grid", orders).await.unwrap();
    cache.forget("grid").await.unwrap();
    assert!(cache.get("grid").await.unwrap().is_none());
}
