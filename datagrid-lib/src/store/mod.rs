//! Queryable store capability
//!
//! A queryable datasource is anything that can count and fetch the records
//! matching a [`Query`]. The grid never reads the whole store: filters,
//! ordering and page limits travel with the query.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::Record;
use crate::query::Query;

/// A persistent store that accepts predicates.
///
/// Field names in queries are qualified with the table name
/// (`orders.total`) or with a related table (`customers.name`).
#[async_trait]
pub trait QueryableStore: Send + Sync {
    /// Returns the base table the grid reads.
    ///
    /// Fails with [`StoreError::NotQueryable`] when the datasource only
    /// looked queryable.
    fn table(&self) -> Result<&str, StoreError>;

    /// Counts the records matching the query's filter.
    async fn count(&self, query: &Query) -> Result<usize, StoreError>;

    /// Fetches the records matching the query, ordered and limited.
    async fn fetch(&self, query: &Query) -> Result<Vec<Record>, StoreError>;
}
