//! Cache error types

/// Errors raised by cache providers.
///
/// All of these are recoverable: the pipeline falls back to live datasource
/// resolution and never stores a value that failed to round-trip.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// SQLite backend error.
    #[error("Cache backend error: {0}")]
    Backend(#[from] async_sqlite::Error),

    /// Failed to encode a value for storage.
    #[error("Cache serialization error: {0}")]
    Serialization(bincode::Error),

    /// Failed to decode a stored value.
    #[error("Cache deserialization error: {0}")]
    Deserialization(bincode::Error),

    /// The backend refused the operation.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    /// Creates a new unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
