//! Error types

mod cache;
mod config;
mod field;
mod store;

pub use cache::*;
pub use config::*;
pub use field::*;
pub use store::*;

/// Top-level error returned by the grid pipeline.
///
/// Only configuration problems and store failures reach the caller as errors.
/// Cache failures and per-record field errors are absorbed inside the pipeline
/// and are only surfaced here by the lower-level APIs that produce them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cache backend error.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Queryable store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Record field access error.
    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    /// Grid configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns `true` if the caller must fix its configuration before retrying.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Store(err) => err.is_configuration(),
            Self::Cache(_) | Self::Field(_) => false,
        }
    }
}
