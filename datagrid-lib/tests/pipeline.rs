//! Pipeline behaviour over in-memory datasources.

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use common::ids;
use common::init_logger;
use common::longs;
use datagrid_lib::cache::CacheProvider;
use datagrid_lib::cache::CachedValue;
use datagrid_lib::cache::InMemoryCache;
use datagrid_lib::engine::AddColumns;
use datagrid_lib::engine::Grid;
use datagrid_lib::engine::Pipeline;
use datagrid_lib::engine::RawSource;
use datagrid_lib::engine::SortResolver;
use datagrid_lib::engine::SourceKind;
use datagrid_lib::error::CacheError;
use datagrid_lib::grid::Column;
use datagrid_lib::grid::FilterSpec;
use datagrid_lib::grid::GridConfig;
use datagrid_lib::grid::GridState;
use datagrid_lib::grid::RelationSearch;
use datagrid_lib::model::Collection;
use datagrid_lib::model::Record;
use datagrid_lib::model::Value;
use datagrid_lib::query::Direction;
use datagrid_lib::store::MemoryStore;
use serde_json::json;

fn people() -> Vec<Record> {
    vec![
        Record::new().set("id", 1).set("name", "Anna").set("age", 30),
        Record::new().set("id", 2).set("name", "Ann").set("age", 25),
    ]
}

fn numbered(n: i32) -> Vec<Record> {
    (1..=n)
        .map(|id| Record::new().set("id", id).set("name", format!("row {}", id)))
        .collect()
}

#[tokio::test]
async fn test_filters_and_search_are_anded() {
    init_logger();
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let grid = Grid::new("people").datasource(people());

    let mut state = GridState::new(vec![Column::new("name").searchable(), Column::new("age")], &config);
    state.set_filter("age", FilterSpec::equals(30));
    state.set_search("Ann");

    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(ids(&output.page.items), vec![1]);
    assert_eq!(output.page.items[0].get("name"), Some(&Value::from("Anna")));
}

#[tokio::test]
async fn test_page_size_zero_returns_everything() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let grid = Grid::new("rows").datasource(numbered(37));

    let mut state = GridState::new(vec![Column::new("name")], &config);
    state.set_per_page(0, &config).unwrap();
    state.pagination.current_page = 3;

    let page = pipeline.run(&grid, &state).await.unwrap().into_inner().page;
    assert_eq!(page.total_count, 37);
    assert_eq!(page.len(), 37);
    assert_eq!(page.current_page, 1);
}

#[tokio::test]
async fn test_search_returns_to_first_page() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let grid = Grid::new("rows").datasource(numbered(40));

    let mut state = GridState::new(vec![Column::new("name").searchable()], &config);
    state.go_to_page(3);
    // Set directly so only the pipeline can reset the page.
    state.search.term = "row".into();

    let page = pipeline.run(&grid, &state).await.unwrap().into_inner().page;
    assert_eq!(page.current_page, 1);
    assert_eq!(ids(&page.items), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_remember_produces_once() {
    let config = GridConfig::default();
    let pipeline = Pipeline::new(config.clone(), InMemoryCache::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let grid = Grid::new("people").datasource_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Some(people().into())
    });
    let state = GridState::new(vec![Column::new("name")], &config);

    let first = pipeline.run(&grid, &state).await.unwrap();
    let second = pipeline.run(&grid, &state).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(second.cache.is_hit());
    assert_eq!(second.data(), first.data());

    pipeline.forget("people").await.unwrap();
    pipeline.run(&grid, &state).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_matched_ids_span_all_pages() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let grid = Grid::new("rows").datasource(numbered(25));

    let mut state = GridState::new(vec![Column::new("name")], &config);
    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(output.page.len(), 10);
    assert_eq!(output.matched.len(), 25);

    state.set_per_page(0, &config).unwrap();
    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(output.page.len(), output.matched.len());
}

#[test]
fn test_sort_field_qualification() {
    let resolver = SortResolver::new('.');
    assert_eq!(resolver.resolve("total", "orders"), "orders.total");
    assert_eq!(resolver.resolve("customers.name", "orders"), "customers.name");
}

#[tokio::test]
async fn test_status_filter_end_to_end() {
    init_logger();
    let config = GridConfig::default();
    let pipeline = Pipeline::new(config.clone(), InMemoryCache::new());
    let grid = Grid::new("orders").datasource(json!([
        {"id": 1, "status": "open"},
        {"id": 2, "status": "closed"},
        {"id": 3, "status": "open"},
    ]));

    let mut state = GridState::new(vec![Column::new("id"), Column::new("status")], &config);
    state.set_filter("status", FilterSpec::equals("open"));

    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(ids(&output.page.items), vec![1, 3]);
    assert_eq!(output.page.total_count, 2);
    assert_eq!(longs(&output.matched), vec![1, 3]);
    assert_eq!(output.source, SourceKind::InMemory);
}

#[tokio::test]
async fn test_computed_columns_only_touch_the_page() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let grid = Grid::new("rows")
        .datasource(numbered(30))
        .add_columns(AddColumns::new().add("label", move |row| {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::from(format!("#{}", row.get("id").map(Value::to_string).unwrap_or_default()))
        }));

    let state = GridState::new(vec![Column::new("name")], &config);
    let page = pipeline.run(&grid, &state).await.unwrap().into_inner().page;

    assert_eq!(seen.load(Ordering::SeqCst), 10);
    assert_eq!(page.items[0].get("label"), Some(&Value::from("#1")));
}

#[tokio::test]
async fn test_sort_by_toggles_in_memory_order() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let grid = Grid::new("people").datasource(people());

    let mut state = GridState::new(vec![Column::new("name").sortable()], &config);
    state.sort_by("name");
    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(ids(&output.page.items), vec![2, 1]);

    state.sort_by("name");
    assert_eq!(state.sort.direction, Direction::Desc);
    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(ids(&output.page.items), vec![1, 2]);
    assert_eq!(longs(&output.matched), vec![1, 2]);
}

#[tokio::test]
async fn test_relation_search_reaches_nested_records() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let grid = Grid::new("orders")
        .datasource(json!([
            {"id": 1, "customer": {"name": "Contoso"}},
            {"id": 2, "customer": {"name": "Fabrikam"}},
            {"id": 3, "customer": null},
        ]))
        .relation_search(RelationSearch::new().relation("customer", ["name"]));

    let mut state = GridState::new(vec![Column::new("id")], &config);
    state.set_search("fabri");

    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(ids(&output.page.items), vec![2]);
}

#[tokio::test]
async fn test_forced_refresh_replaces_cached_collection() {
    let config = GridConfig::default();
    let pipeline = Pipeline::new(config.clone(), InMemoryCache::new());
    let grid = Grid::new("people").datasource(people());
    let state = GridState::new(vec![Column::new("name")], &config);

    pipeline.run(&grid, &state).await.unwrap();
    let replacement: Collection = vec![Record::new().set("id", 9).set("name", "Zed")].into();
    pipeline.refresh_cache("people", replacement).await.unwrap();

    let response = pipeline.run(&grid, &state).await.unwrap();
    assert!(response.cache.is_hit());
    assert_eq!(ids(&response.data().page.items), vec![9]);
}

#[tokio::test]
async fn test_disabled_cache_reads_live_source() {
    let config = GridConfig::default().with_cache_enabled(false);
    let pipeline = Pipeline::new(config.clone(), InMemoryCache::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let grid = Grid::new("people").datasource_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Some(RawSource::Records(people()))
    });
    let state = GridState::new(vec![Column::new("name")], &config);

    for _ in 0..3 {
        let response = pipeline.run(&grid, &state).await.unwrap();
        assert!(response.cache.is_none());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_store_and_memory_paths_agree() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let records = vec![
        Record::new().set("id", 1).set("status", "open").set("code", "10"),
        Record::new().set("id", 2).set("status", "closed").set("code", "9"),
        Record::new().set("id", 3).set("status", "open").set("code", "100"),
        Record::new().set("id", 4).set("status", "open").set("code", "9"),
    ];

    let mut state = GridState::new(
        vec![Column::new("status").searchable(), Column::new("code").sortable()],
        &config,
    );
    state.set_search("open");
    state.sort_by("code");
    state.set_numeric_sort(true);

    let memory = Grid::new("a").datasource(records.clone());
    let store = Grid::new("b").datasource(RawSource::store(MemoryStore::new("orders", records)));

    let from_memory = pipeline.run(&memory, &state).await.unwrap().into_inner();
    let from_store = pipeline.run(&store, &state).await.unwrap().into_inner();

    assert_eq!(ids(&from_memory.page.items), vec![4, 1, 3]);
    assert_eq!(ids(&from_store.page.items), vec![4, 1, 3]);
    assert_eq!(from_memory.matched, from_store.matched);
    assert_eq!(from_store.source, SourceKind::Queryable);
}

/// Delegates to an in-memory cache, failing reads or writes on demand.
struct FlakyCache {
    inner: Arc<InMemoryCache>,
    fail_get: bool,
    fail_set: bool,
}

#[async_trait]
impl CacheProvider for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<CachedValue>, CacheError> {
        if self.fail_get {
            return Err(CacheError::unavailable("read failed"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: CachedValue) -> Result<(), CacheError> {
        if self.fail_set {
            return Err(CacheError::unavailable("write failed"));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear().await
    }

    async fn gc(&self) -> Result<usize, CacheError> {
        self.inner.gc().await
    }
}

#[tokio::test]
async fn test_cache_failures_fall_back_to_live_data() {
    init_logger();
    for (fail_get, fail_set) in [(true, false), (false, true)] {
        let config = GridConfig::default();
        let inner = Arc::new(InMemoryCache::new());
        let provider = FlakyCache {
            inner: inner.clone(),
            fail_get,
            fail_set,
        };
        let pipeline = Pipeline::new(config.clone(), provider);
        let grid = Grid::new("people").datasource(people());

        let mut state = GridState::new(vec![Column::new("name").searchable()], &config);
        state.set_search("anna");

        for _ in 0..2 {
            let response = pipeline.run(&grid, &state).await.unwrap();
            assert!(response.cache.is_none());
            assert_eq!(ids(&response.data().page.items), vec![1]);
            assert_eq!(longs(&response.data().matched), vec![1]);
        }
        assert!(inner.is_empty());
    }
}

#[tokio::test]
async fn test_unreadable_record_is_excluded_from_range_filter() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let grid = Grid::new("orders").datasource(vec![
        Record::new().set("id", 1).set("total", 120),
        Record::new().set("id", 2).set("total", 40),
        Record::new().set("id", 3).set("total", "n/a"),
        Record::new().set("id", 4).set("total", 75.5),
    ]);

    let mut state = GridState::new(vec![Column::new("total")], &config);
    state.set_filter("total", FilterSpec::between(Some(40.into()), Some(100.into())));

    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(ids(&output.page.items), vec![2, 4]);
    assert_eq!(output.page.total_count, 2);
}

#[tokio::test]
async fn test_json_text_is_searched_as_given() {
    let config = GridConfig::default();
    let pipeline = Pipeline::uncached(config.clone());
    let grid = Grid::new("tickets").datasource(json!([
        {"id": 1, "opened": "2024-03-05T10:00:00+02:00"},
        {"id": 2, "opened": "2024-03-06T08:00:00+02:00"},
    ]));

    let mut state = GridState::new(vec![Column::new("opened").searchable()], &config);
    state.set_search("10:00");

    let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
    assert_eq!(ids(&output.page.items), vec![1]);
    assert_eq!(
        output.page.items[0].get("opened"),
        Some(&Value::from("2024-03-05T10:00:00+02:00"))
    );
}
