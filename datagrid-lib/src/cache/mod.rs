//! Result caching layer
//!
//! Provides a `CacheProvider` trait and implementations for caching
//! serialized data, plus [`ResultCache`], which remembers the materialized
//! collection of each grid identity until it is explicitly forgotten.

mod config;
mod memory;
mod noop;
mod result;
mod sqlite;

pub use config::*;
pub use memory::*;
pub use noop::*;
pub use result::*;
pub use sqlite::*;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::error::CacheError;

/// A cached value with metadata about when it was cached and when it expires.
#[derive(Debug, Clone)]
pub struct CachedValue {
    /// The cached data, serialized as bytes (via bincode).
    pub data: Vec<u8>,
    /// When this value was cached.
    pub created_at: DateTime<Utc>,
    /// When this value expires; `None` keeps it until removed.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedValue {
    /// Creates a new cached value.
    pub fn new(data: Vec<u8>, created_at: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            data,
            created_at,
            expires_at,
        }
    }

    /// Creates a value cached now that never expires.
    pub fn forever(data: Vec<u8>) -> Self {
        Self {
            data,
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Creates a new cached value with a TTL from now.
    pub fn with_ttl(data: Vec<u8>, ttl: std::time::Duration) -> Self {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        Self {
            data,
            created_at: now,
            expires_at: Some(expires_at),
        }
    }

    /// Returns `true` if this cached value has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }
}

/// Trait for cache providers.
///
/// Implementations store and retrieve cached values by string keys.
/// The provider is responsible for:
/// - Never returning expired values from `get()`
/// - Storing values with their expiration metadata
/// - Reporting backend failures instead of swallowing them, so callers can
///   fall back to live data
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::cache::{CacheProvider, InMemoryCache, CachedValue};
///
/// let cache = InMemoryCache::new();
///
/// cache.set("my-key", CachedValue::forever(b"hello".to_vec())).await?;
///
/// if let Some(cached) = cache.get("my-key").await? {
///     println!("Got: {:?}", cached.data);
/// }
/// ```
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Retrieves a cached value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist or the value has expired.
    async fn get(&self, key: &str) -> Result<Option<CachedValue>, CacheError>;

    /// Stores a value in the cache, replacing any previous value.
    async fn set(&self, key: &str, value: CachedValue) -> Result<(), CacheError>;

    /// Removes a value from the cache.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Clears all values from the cache.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    async fn gc(&self) -> Result<usize, CacheError>;
}
