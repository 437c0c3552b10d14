//! SQLite-backed persistent cache implementation.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::ClientBuilder;
use async_sqlite::JournalMode;
use async_sqlite::rusqlite;
use async_sqlite::rusqlite::OptionalExtension;
use async_trait::async_trait;
use chrono::TimeZone;
use chrono::Utc;

use super::CacheProvider;
use super::CachedValue;
use crate::error::CacheError;

/// A persistent cache backed by SQLite.
///
/// Data is stored in a SQLite database file and persists across process
/// restarts, so remembered grid collections survive a restart too. Uses WAL
/// journal mode for better concurrent read performance.
///
/// # Example
///
/// ```ignore
/// use datagrid_lib::cache::SqliteCache;
///
/// // File-based cache
/// let cache = SqliteCache::open("grid-cache.db").await?;
///
/// // In-memory cache (for testing)
/// let cache = SqliteCache::open_in_memory().await?;
/// ```
pub struct SqliteCache {
    client: Client,
}

impl SqliteCache {
    /// Opens a SQLite cache at the specified path.
    ///
    /// Creates the database file and cache table if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let client = ClientBuilder::new()
            .path(path)
            .journal_mode(JournalMode::Wal)
            .open()
            .await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    /// Opens an in-memory SQLite cache.
    ///
    /// Useful for testing. Data is lost when the cache is dropped.
    pub async fn open_in_memory() -> Result<Self, CacheError> {
        let client = ClientBuilder::new().path(":memory:").open().await?;

        Self::init_schema(&client).await?;

        Ok(Self { client })
    }

    async fn init_schema(client: &Client) -> Result<(), CacheError> {
        client
            .conn(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS grid_cache (
                        key TEXT PRIMARY KEY,
                        data BLOB NOT NULL,
                        created_at INTEGER NOT NULL,
                        expires_at INTEGER
                    )",
                    [],
                )?;
                // Index for efficient GC queries
                conn.execute(
                    "CREATE INDEX IF NOT EXISTS idx_grid_cache_expires_at ON grid_cache(expires_at)",
                    [],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Returns the number of entries in the cache (including expired ones).
    pub async fn len(&self) -> Result<usize, CacheError> {
        let count = self
            .client
            .conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM grid_cache", [], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Returns `true` if the cache is empty.
    pub async fn is_empty(&self) -> Result<bool, CacheError> {
        self.len().await.map(|len| len == 0)
    }
}

#[async_trait]
impl CacheProvider for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<CachedValue>, CacheError> {
        let key = key.to_string();
        let now = Utc::now().timestamp();

        let row = self
            .client
            .conn(move |conn| {
                conn.query_row(
                    "SELECT data, created_at, expires_at FROM grid_cache
                     WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
                    rusqlite::params![key, now],
                    |row| {
                        let data: Vec<u8> = row.get(0)?;
                        let created_at: i64 = row.get(1)?;
                        let expires_at: Option<i64> = row.get(2)?;
                        Ok((data, created_at, expires_at))
                    },
                )
                .optional()
            })
            .await?;

        Ok(row.map(|(data, created_at, expires_at)| {
            let created_at = Utc
                .timestamp_opt(created_at, 0)
                .single()
                .unwrap_or_else(Utc::now);
            let expires_at = expires_at.and_then(|ts| Utc.timestamp_opt(ts, 0).single());
            CachedValue::new(data, created_at, expires_at)
        }))
    }

    async fn set(&self, key: &str, value: CachedValue) -> Result<(), CacheError> {
        let key = key.to_string();
        let data = value.data;
        let created_at = value.created_at.timestamp();
        let expires_at = value.expires_at.map(|dt| dt.timestamp());

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO grid_cache (key, data, created_at, expires_at) VALUES (?, ?, ?, ?)",
                    rusqlite::params![key, data, created_at, expires_at],
                )
            })
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let key = key.to_string();

        self.client
            .conn(move |conn| conn.execute("DELETE FROM grid_cache WHERE key = ?", [key]))
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.client
            .conn(|conn| conn.execute("DELETE FROM grid_cache", []))
            .await?;
        Ok(())
    }

    async fn gc(&self) -> Result<usize, CacheError> {
        let now = Utc::now().timestamp();

        let removed = self
            .client
            .conn(move |conn| {
                conn.execute(
                    "DELETE FROM grid_cache WHERE expires_at IS NOT NULL AND expires_at <= ?",
                    [now],
                )
            })
            .await?;
        Ok(removed)
    }
}
