//! Datasource classification

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::error::StoreError;
use crate::model::Collection;
use crate::model::Record;
use crate::query::Query;
use crate::store::QueryableStore;

/// A datasource as handed over by the collaborator, before classification.
#[derive(Clone)]
pub enum RawSource {
    /// A plain array of records.
    Records(Vec<Record>),
    /// An already materialized collection.
    Collection(Collection),
    /// Decoded JSON; arrays are record lists, anything else is not.
    Json(serde_json::Value),
    /// A handle that accepts predicates.
    Store(Arc<dyn QueryableStore>),
}

impl RawSource {
    /// Wraps a store handle.
    pub fn store(store: impl QueryableStore + 'static) -> Self {
        RawSource::Store(Arc::new(store))
    }

    /// Returns `true` if the value enumerates its records directly.
    pub fn is_in_memory(&self) -> bool {
        match self {
            RawSource::Records(_) | RawSource::Collection(_) => true,
            RawSource::Json(json) => json.is_array(),
            RawSource::Store(_) => false,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            RawSource::Records(_) => "records",
            RawSource::Collection(_) => "collection",
            RawSource::Json(serde_json::Value::Array(_)) => "json array",
            RawSource::Json(serde_json::Value::Object(_)) => "json object",
            RawSource::Json(serde_json::Value::String(_)) => "json string",
            RawSource::Json(serde_json::Value::Number(_)) => "json number",
            RawSource::Json(serde_json::Value::Bool(_)) => "json bool",
            RawSource::Json(serde_json::Value::Null) => "json null",
            RawSource::Store(_) => "store",
        }
    }
}

impl fmt::Debug for RawSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSource({})", self.kind())
    }
}

impl From<Vec<Record>> for RawSource {
    fn from(records: Vec<Record>) -> Self {
        RawSource::Records(records)
    }
}

impl From<Collection> for RawSource {
    fn from(collection: Collection) -> Self {
        RawSource::Collection(collection)
    }
}

impl From<serde_json::Value> for RawSource {
    fn from(json: serde_json::Value) -> Self {
        RawSource::Json(json)
    }
}

impl From<Arc<dyn QueryableStore>> for RawSource {
    fn from(store: Arc<dyn QueryableStore>) -> Self {
        RawSource::Store(store)
    }
}

/// A classified datasource. Exactly one variant is active per pipeline run.
#[derive(Clone)]
pub enum DataSource {
    /// Records filtered, sorted and paged in memory.
    InMemory(Collection),
    /// A store that receives the filter, ordering and limits as a query.
    Queryable(Arc<dyn QueryableStore>),
}

impl DataSource {
    /// Returns `true` for the in-memory variant.
    pub fn is_in_memory(&self) -> bool {
        matches!(self, DataSource::InMemory(_))
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::InMemory(collection) => {
                write!(f, "InMemory({} records)", collection.len())
            }
            DataSource::Queryable(store) => match store.table() {
                Ok(table) => write!(f, "Queryable({})", table),
                Err(_) => f.write_str("Queryable(?)"),
            },
        }
    }
}

/// Classifies a raw datasource.
///
/// Arrays and collections are in-memory; everything else is treated as
/// queryable. A value that only falls through to queryable fails with
/// [`StoreError::NotQueryable`] once it is asked for a table, a count or
/// records.
pub fn classify(raw: RawSource) -> DataSource {
    let kind = raw.kind();
    let source = match raw {
        RawSource::Records(records) => DataSource::InMemory(records.into()),
        RawSource::Collection(collection) => DataSource::InMemory(collection),
        RawSource::Json(json) => match Collection::from_json(json) {
            Some(collection) => DataSource::InMemory(collection),
            None => DataSource::Queryable(Arc::new(Unqueryable { kind })),
        },
        RawSource::Store(store) => DataSource::Queryable(store),
    };
    debug!("Classified {} datasource as {:?}", kind, source);
    source
}

/// Stand-in for a value that matched no in-memory shape.
struct Unqueryable {
    kind: &'static str,
}

#[async_trait]
impl QueryableStore for Unqueryable {
    fn table(&self) -> Result<&str, StoreError> {
        Err(StoreError::not_queryable(self.kind))
    }

    async fn count(&self, _query: &Query) -> Result<usize, StoreError> {
        Err(StoreError::not_queryable(self.kind))
    }

    async fn fetch(&self, _query: &Query) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::not_queryable(self.kind))
    }
}
