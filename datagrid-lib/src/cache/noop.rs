//! Cache provider that stores nothing.

use async_trait::async_trait;

use super::CacheProvider;
use super::CachedValue;
use crate::error::CacheError;

/// A provider that never holds a value.
///
/// Used when caching is switched off: every lookup misses, so the grid
/// rebuilds its collection from the datasource on every run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl CacheProvider for NoCache {
    async fn get(&self, _key: &str) -> Result<Option<CachedValue>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: CachedValue) -> Result<(), CacheError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn gc(&self) -> Result<usize, CacheError> {
        Ok(0)
    }
}
