//! Grid data pipeline
//!
//! One [`Pipeline::run`] resolves the datasource, consults the result
//! cache, filters, sorts, records the matched identifiers, paginates and
//! finally applies computed columns to the returned page.

use std::fmt;
use std::sync::Arc;

use log::debug;
use log::warn;
use serde::Deserialize;
use serde::Serialize;

use super::AddColumns;
use super::DataSource;
use super::FilterEngine;
use super::RawSource;
use super::ResultPage;
use super::RowUpdate;
use super::RowUpdater;
use super::SortResolver;
use super::UpdateMessages;
use super::UpdateOutcome;
use super::UpdateStatus;
use super::classify;
use super::paginate;
use crate::cache::CacheProvider;
use crate::cache::ResultCache;
use crate::error::CacheError;
use crate::error::ConfigError;
use crate::error::Error;
use crate::grid::GridConfig;
use crate::grid::GridState;
use crate::grid::PaginationState;
use crate::grid::RefreshPolicy;
use crate::grid::RelationSearch;
use crate::model::Collection;
use crate::model::Value;
use crate::query::Query;
use crate::response::CacheStatus;
use crate::response::Response;
use crate::store::QueryableStore;

/// Produces a datasource on every run.
pub type DatasourceHook = Arc<dyn Fn() -> Option<RawSource> + Send + Sync>;

/// The static definition of one grid instance.
///
/// # Example
///
/// ```
/// use datagrid_lib::engine::{AddColumns, Grid};
/// use datagrid_lib::model::{Record, Value};
///
/// let grid = Grid::new("orders-grid")
///     .datasource(vec![
///         Record::new().set("id", 1).set("total", 20),
///         Record::new().set("id", 2).set("total", 35),
///     ])
///     .add_columns(AddColumns::new().add("large", |row| {
///         Value::from(row.get("total").and_then(Value::as_f64).unwrap_or(0.0) > 30.0)
///     }));
///
/// assert_eq!(grid.identity(), "orders-grid");
/// ```
#[derive(Clone)]
pub struct Grid {
    identity: String,
    datasource: Option<RawSource>,
    hook: Option<DatasourceHook>,
    relation_search: RelationSearch,
    add_columns: AddColumns,
    update_messages: UpdateMessages,
}

impl Grid {
    /// Creates a grid with the cache identity `identity`.
    ///
    /// The identity must be stable across runs of the same grid and distinct
    /// between grids.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            datasource: None,
            hook: None,
            relation_search: RelationSearch::default(),
            add_columns: AddColumns::default(),
            update_messages: UpdateMessages::default(),
        }
    }

    /// Mounts a datasource.
    pub fn datasource(mut self, source: impl Into<RawSource>) -> Self {
        self.datasource = Some(source.into());
        self
    }

    /// Sets a hook evaluated on every run.
    ///
    /// A value returned by the hook takes precedence over the mounted
    /// datasource; `None` falls back to it.
    pub fn datasource_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Option<RawSource> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Declares related columns searched with the free-text term.
    pub fn relation_search(mut self, relation_search: RelationSearch) -> Self {
        self.relation_search = relation_search;
        self
    }

    /// Declares computed columns.
    pub fn add_columns(mut self, add_columns: AddColumns) -> Self {
        self.add_columns = add_columns;
        self
    }

    /// Sets the inline update messages.
    pub fn update_messages(mut self, messages: UpdateMessages) -> Self {
        self.update_messages = messages;
        self
    }

    /// Returns the cache identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    fn source(&self) -> Result<RawSource, ConfigError> {
        self.hook
            .as_ref()
            .and_then(|hook| hook())
            .or_else(|| self.datasource.clone())
            .ok_or(ConfigError::MissingDatasource)
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("identity", &self.identity)
            .field("datasource", &self.datasource)
            .field("hook", &self.hook.is_some())
            .field("relation_search", &self.relation_search)
            .field("add_columns", &self.add_columns)
            .finish()
    }
}

/// Which datasource variant served a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    InMemory,
    Queryable,
}

/// What a pipeline run hands back to the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridOutput {
    /// The requested page, with computed columns applied.
    pub page: ResultPage,
    /// Primary keys of every matched record, across all pages.
    pub matched: Vec<Value>,
    /// Datasource variant used for this run.
    pub source: SourceKind,
}

/// Runs grids against their datasources.
///
/// The pipeline holds no per-grid state besides the result cache; every
/// run reads the grid definition and the collaborator's [`GridState`].
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::cache::InMemoryCache;
/// use datagrid_lib::engine::{Grid, Pipeline};
/// use datagrid_lib::grid::{Column, GridConfig, GridState};
///
/// let config = GridConfig::default();
/// let pipeline = Pipeline::new(config.clone(), InMemoryCache::new());
/// let state = GridState::new(vec![Column::new("name").searchable()], &config);
///
/// let response = pipeline.run(&grid, &state).await?;
/// println!("{} of {}", response.data().page.len(), response.data().page.total_count);
/// ```
pub struct Pipeline {
    config: GridConfig,
    cache: ResultCache,
}

impl Pipeline {
    /// Creates a pipeline caching in-memory collections in `provider`.
    ///
    /// When `config.cache_enabled` is false the provider is not used.
    pub fn new(config: GridConfig, provider: impl CacheProvider + 'static) -> Self {
        let cache = if config.cache_enabled {
            ResultCache::new(provider)
        } else {
            ResultCache::disabled()
        };
        Self { config, cache }
    }

    /// Creates a pipeline with a preconfigured result cache.
    pub fn with_cache(config: GridConfig, cache: ResultCache) -> Self {
        let cache = if config.cache_enabled {
            cache
        } else {
            ResultCache::disabled()
        };
        Self { config, cache }
    }

    /// Creates a pipeline that never caches.
    pub fn uncached(config: GridConfig) -> Self {
        Self {
            config,
            cache: ResultCache::disabled(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Returns the result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Runs the grid and returns the requested page.
    ///
    /// Cache failures degrade to live resolution. Records whose filter
    /// evaluation fails are excluded. Configuration and store errors are
    /// returned.
    pub async fn run(&self, grid: &Grid, state: &GridState) -> Result<Response<GridOutput>, Error> {
        let (source, status) = self.resolve(grid).await?;

        let mut pagination = state.pagination;
        if state.search.is_active() && pagination.current_page != 1 {
            debug!("Search active, resetting {} to page 1", grid.identity());
            pagination.current_page = 1;
        }

        let (page, matched, kind) = match source {
            DataSource::InMemory(collection) => {
                let (page, matched) = self.run_in_memory(grid, state, &pagination, collection)?;
                (page, matched, SourceKind::InMemory)
            }
            DataSource::Queryable(store) => {
                let (page, matched) = self.run_queryable(grid, state, &pagination, store.as_ref()).await?;
                (page, matched, SourceKind::Queryable)
            }
        };

        let mut page = page;
        page.items = grid.add_columns.transform(std::mem::take(&mut page.items));

        let mut response = Response::new(GridOutput {
            page,
            matched,
            source: kind,
        });
        response.cache = status;
        Ok(response)
    }

    /// Applies an inline edit and reports the outcome.
    ///
    /// The pipeline is re-run according to the configured
    /// [`RefreshPolicy`]; after a successful edit the grid's cached
    /// collection is forgotten first so the refresh sees the change.
    pub async fn apply_update(
        &self,
        grid: &Grid,
        state: &GridState,
        updater: &dyn RowUpdater,
        update: RowUpdate,
    ) -> Result<UpdateOutcome, Error> {
        if state.column(&update.field).is_none() {
            return Err(ConfigError::UnknownColumn(update.field).into());
        }

        let status = UpdateStatus::from(updater.update(&update).await);
        let message = grid.update_messages.message(status, &update.field).to_string();
        debug!("Update of {} on {}: {:?}", update.field, grid.identity(), status);

        let refresh = match self.config.refresh_policy {
            RefreshPolicy::Always => true,
            RefreshPolicy::InMemoryOnly => grid.source()?.is_in_memory(),
            RefreshPolicy::Never => false,
        };

        let refreshed = if refresh {
            if status == UpdateStatus::Success {
                self.forget_or_warn(grid.identity()).await;
            }
            Some(self.run(grid, state).await?)
        } else {
            None
        };

        Ok(UpdateOutcome {
            status,
            message,
            refreshed,
        })
    }

    /// Replaces the cached collection of a grid.
    pub async fn refresh_cache(
        &self,
        identity: &str,
        collection: Collection,
    ) -> Result<Response<Collection>, CacheError> {
        self.cache.put_forced(identity, collection).await
    }

    /// Drops the cached collection of a grid.
    pub async fn forget(&self, identity: &str) -> Result<(), CacheError> {
        self.cache.forget(identity).await
    }

    async fn resolve(&self, grid: &Grid) -> Result<(DataSource, CacheStatus), Error> {
        let identity = grid.identity();

        match self.cache.get(identity).await {
            Ok(Some(hit)) => {
                let status = hit.cache;
                return Ok((DataSource::InMemory(hit.into_inner()), status));
            }
            Ok(None) => {}
            Err(err) => {
                warn!("Cache lookup for {} failed, resolving live: {}", identity, err);
                return Ok((classify(grid.source()?), CacheStatus::None));
            }
        }

        let collection = match classify(grid.source()?) {
            DataSource::InMemory(collection) => collection,
            queryable => return Ok((queryable, CacheStatus::None)),
        };

        match self.cache.remember(identity, move || collection).await {
            Ok(response) => {
                let status = response.cache;
                Ok((DataSource::InMemory(response.into_inner()), status))
            }
            Err(err) => {
                warn!("Caching {} failed, resolving live: {}", identity, err);
                Ok((classify(grid.source()?), CacheStatus::None))
            }
        }
    }

    fn run_in_memory(
        &self,
        grid: &Grid,
        state: &GridState,
        pagination: &PaginationState,
        collection: Collection,
    ) -> Result<(ResultPage, Vec<Value>), Error> {
        let separator = self.config.relation_separator;
        let engine = FilterEngine::new(&state.columns, &grid.relation_search, &self.config);

        let mut records = engine.apply(collection.into_records(), &state.search, &state.filters)?;
        SortResolver::new(separator).sort(&mut records, &state.sort);

        let matched = records
            .iter()
            .map(|record| {
                record
                    .get_path(&self.config.primary_key, separator)
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();

        Ok((paginate(records, pagination), matched))
    }

    async fn run_queryable(
        &self,
        grid: &Grid,
        state: &GridState,
        pagination: &PaginationState,
        store: &dyn QueryableStore,
    ) -> Result<(ResultPage, Vec<Value>), Error> {
        let table = store.table()?.to_string();
        let resolver = SortResolver::new(self.config.relation_separator);
        let engine = FilterEngine::new(&state.columns, &grid.relation_search, &self.config);

        let mut base = Query::new(&table);
        if let Some(predicate) = engine.predicate(&table, &state.search, &state.filters)? {
            base = base.filter(predicate);
        }
        let order = resolver.order_by(&state.sort, &state.columns, Some(&table));

        let total_count = store.count(&base).await?;

        let key = resolver.resolve(&self.config.primary_key, &table);
        let ids = base.clone().select(&[key.as_str()]).order_by(order.clone());
        let matched = store
            .fetch(&ids)
            .await?
            .into_iter()
            .map(|mut record| record.remove(&key).unwrap_or_default())
            .collect();

        let PaginationState {
            page_size,
            current_page,
        } = *pagination;
        let query = base.order_by(order);
        let query = if page_size == 0 {
            query
        } else {
            query.page(page_size, current_page)
        };
        let items = store.fetch(&query).await?;

        Ok((
            ResultPage::new(items, total_count, current_page, page_size),
            matched,
        ))
    }

    async fn forget_or_warn(&self, identity: &str) {
        if let Err(err) = self.cache.forget(identity).await {
            warn!("Could not forget cached collection {}: {}", identity, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use serde_json::json;

    use super::*;
    use crate::cache::InMemoryCache;
    use crate::grid::Column;
    use crate::grid::FilterSpec;
    use crate::model::Record;

    fn config() -> GridConfig {
        GridConfig::default()
    }

    fn state(config: &GridConfig) -> GridState {
        GridState::new(
            vec![
                Column::new("id").sortable(),
                Column::new("status").searchable(),
            ],
            config,
        )
    }

    fn orders() -> serde_json::Value {
        json!([
            {"id": 1, "status": "open"},
            {"id": 2, "status": "closed"},
            {"id": 3, "status": "open"},
        ])
    }

    #[tokio::test]
    async fn test_cached_collection_replaces_live_source() {
        let config = config();
        let pipeline = Pipeline::new(config.clone(), InMemoryCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let grid = Grid::new("orders").datasource_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(RawSource::Json(orders()))
        });
        let state = state(&config);

        let first = pipeline.run(&grid, &state).await.unwrap();
        let second = pipeline.run(&grid, &state).await.unwrap();

        assert!(first.cache.is_miss());
        assert!(second.cache.is_hit());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.data(), second.data());
    }

    #[tokio::test]
    async fn test_missing_datasource_is_fatal() {
        let config = config();
        let pipeline = Pipeline::uncached(config.clone());
        let err = pipeline
            .run(&Grid::new("empty"), &state(&config))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_unqueryable_source_is_fatal() {
        let config = config();
        let pipeline = Pipeline::uncached(config.clone());
        let grid = Grid::new("odd").datasource(json!({"id": 1}));
        let err = pipeline.run(&grid, &state(&config)).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_update_refresh_policies() {
        let config = config().with_refresh_policy(RefreshPolicy::InMemoryOnly);
        let pipeline = Pipeline::uncached(config.clone());
        let grid = Grid::new("orders").datasource(orders());
        let state = state(&config);
        let reject = |_: &RowUpdate| false;

        let outcome = pipeline
            .apply_update(&grid, &state, &reject, RowUpdate::new(1, "status", "done"))
            .await
            .unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.message, "Error updating the data.");
        assert!(outcome.refreshed.is_some());

        let config = config.with_refresh_policy(RefreshPolicy::Never);
        let pipeline = Pipeline::uncached(config);
        let accept = |_: &RowUpdate| true;
        let outcome = pipeline
            .apply_update(&grid, &state, &accept, RowUpdate::new(1, "status", "done"))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(outcome.refreshed.is_none());
    }

    #[tokio::test]
    async fn test_update_of_unknown_column() {
        let config = config();
        let pipeline = Pipeline::uncached(config.clone());
        let grid = Grid::new("orders").datasource(orders());
        let accept = |_: &RowUpdate| true;

        let err = pipeline
            .apply_update(&grid, &state(&config), &accept, RowUpdate::new(1, "nope", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::UnknownColumn(_))));
    }

    #[tokio::test]
    async fn test_successful_update_forgets_cache() {
        let config = config();
        let pipeline = Pipeline::new(config.clone(), InMemoryCache::new());
        let grid = Grid::new("orders").datasource(vec![Record::new().set("id", 1).set("status", "open")]);
        let state = state(&config);

        pipeline.run(&grid, &state).await.unwrap();
        let accept = |_: &RowUpdate| true;
        let outcome = pipeline
            .apply_update(&grid, &state, &accept, RowUpdate::new(1, "status", "done"))
            .await
            .unwrap();

        let refreshed = outcome.refreshed.unwrap();
        assert!(refreshed.cache.is_miss());
    }

    #[tokio::test]
    async fn test_filter_narrows_matched_ids() {
        let config = config();
        let pipeline = Pipeline::uncached(config.clone());
        let grid = Grid::new("orders").datasource(orders());
        let mut state = state(&config);
        state.set_filter("status", FilterSpec::equals("closed"));

        let output = pipeline.run(&grid, &state).await.unwrap().into_inner();
        assert_eq!(output.matched, vec![Value::Int(2)]);
        assert_eq!(output.source, SourceKind::InMemory);
    }
}
