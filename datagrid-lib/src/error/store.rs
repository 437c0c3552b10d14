//! Queryable store error types

/// Errors raised while building or executing a query against a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The datasource was classified as queryable but cannot accept predicates.
    #[error("Datasource of kind '{kind}' cannot be queried")]
    NotQueryable {
        /// Short description of the offending value.
        kind: String,
    },

    /// SQLite backend error.
    #[error("Store backend error: {0}")]
    Backend(#[from] async_sqlite::Error),

    /// The query could not be built or executed.
    #[error("Query error: {0}")]
    Query(String),
}

impl StoreError {
    /// Creates a new not-queryable error.
    pub fn not_queryable(kind: impl Into<String>) -> Self {
        Self::NotQueryable { kind: kind.into() }
    }

    /// Creates a new query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Returns `true` if the error stems from a misconfigured datasource.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::NotQueryable { .. })
    }
}
