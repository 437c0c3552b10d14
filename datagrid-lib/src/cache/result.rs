//! Remember-forever cache of materialized grid collections.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use log::warn;
use tokio::sync::Mutex;

use super::CacheConfig;
use super::CacheProvider;
use super::CachedValue;
use super::NoCache;
use crate::error::CacheError;
use crate::model::Collection;
use crate::response::Response;

/// Caches the materialized collection of each grid identity.
///
/// Entries are written at most once per identity and served until
/// [`forget`](Self::forget) or [`put_forced`](Self::put_forced) replaces
/// them. The check-produce-store sequence in [`remember`](Self::remember)
/// runs under a per-identity lock, so concurrent first accesses materialize
/// the collection once.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::cache::{InMemoryCache, ResultCache};
///
/// let cache = ResultCache::new(InMemoryCache::new());
///
/// let first = cache.remember("orders-grid", || load_orders()).await?;
/// let second = cache.remember("orders-grid", || unreachable!()).await?;
/// assert!(second.is_cached());
/// ```
pub struct ResultCache {
    provider: Arc<dyn CacheProvider>,
    config: CacheConfig,
    enabled: bool,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ResultCache {
    /// Creates a result cache over a provider with the default config.
    pub fn new(provider: impl CacheProvider + 'static) -> Self {
        Self::with_config(Arc::new(provider), CacheConfig::default())
    }

    /// Creates a result cache over a shared provider.
    pub fn with_config(provider: Arc<dyn CacheProvider>, config: CacheConfig) -> Self {
        Self {
            provider,
            config,
            enabled: true,
            locks: DashMap::new(),
        }
    }

    /// Creates a result cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            provider: Arc::new(NoCache),
            config: CacheConfig::default(),
            enabled: false,
            locks: DashMap::new(),
        }
    }

    /// Returns `false` for a cache built with [`disabled`](Self::disabled).
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the remembered collection for an identity.
    pub async fn get(&self, identity: &str) -> Result<Option<Response<Collection>>, CacheError> {
        if !self.enabled {
            return Ok(None);
        }
        let key = self.config.key(identity);
        self.read(&key).await
    }

    /// Returns the remembered collection, or stores and returns the producer's.
    ///
    /// `producer` runs only when nothing is remembered for `identity`. If the
    /// backend fails, the error is returned and nothing is stored.
    pub async fn remember<F>(&self, identity: &str, producer: F) -> Result<Response<Collection>, CacheError>
    where
        F: FnOnce() -> Collection + Send,
    {
        if !self.enabled {
            return Ok(Response::new(producer()));
        }

        let key = self.config.key(identity);
        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;

        if let Some(hit) = self.read(&key).await? {
            return Ok(hit);
        }

        let collection = producer();
        let cached = self.write(&key, &collection).await?;
        debug!("Cache miss for {}: stored {} records", key, collection.len());
        Ok(Response::cache_miss(collection, cached.created_at))
    }

    /// Drops the remembered collection for an identity.
    ///
    /// The identity's lock is released too unless another call still holds it.
    pub async fn forget(&self, identity: &str) -> Result<(), CacheError> {
        if !self.enabled {
            return Ok(());
        }
        let key = self.config.key(identity);
        let lock = self.lock_for(&key);
        let removed = {
            let _guard = lock.lock().await;
            self.provider.remove(&key).await
        };
        drop(lock);
        self.locks.remove_if(&key, |_, held| Arc::strong_count(held) == 1);

        removed?;
        debug!("Forgot cache entry {}", key);
        Ok(())
    }

    /// Replaces the remembered collection unconditionally.
    pub async fn put_forced(
        &self,
        identity: &str,
        collection: Collection,
    ) -> Result<Response<Collection>, CacheError> {
        if !self.enabled {
            return Ok(Response::new(collection));
        }
        let key = self.config.key(identity);
        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;

        self.provider.remove(&key).await?;
        let cached = self.write(&key, &collection).await?;
        debug!("Forced cache entry {} ({} records)", key, collection.len());
        Ok(Response::cache_miss(collection, cached.created_at))
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.entry(key.to_string()).or_default().clone()
    }

    async fn read(&self, key: &str) -> Result<Option<Response<Collection>>, CacheError> {
        let Some(cached) = self.provider.get(key).await? else {
            return Ok(None);
        };

        match bincode::deserialize::<Collection>(&cached.data) {
            Ok(collection) => {
                debug!("Cache hit for {}", key);
                Ok(Some(Response::cache_hit(collection, cached.created_at)))
            }
            Err(err) => {
                warn!("Discarding unreadable cache entry {}: {}", key, err);
                self.provider.remove(key).await?;
                Err(CacheError::Deserialization(err))
            }
        }
    }

    async fn write(&self, key: &str, collection: &Collection) -> Result<CachedValue, CacheError> {
        let data = bincode::serialize(collection).map_err(CacheError::Serialization)?;
        let value = match self.config.ttl {
            Some(ttl) => CachedValue::with_ttl(data, ttl),
            None => CachedValue::forever(data),
        };
        self.provider.set(key, value.clone()).await?;
        Ok(value)
    }
}
