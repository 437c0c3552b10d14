//! Response wrapper with cache status

use chrono::DateTime;
use chrono::Utc;

/// A value returned by the grid together with where its data came from.
///
/// Pipeline runs and cache lookups return this wrapper so callers can tell
/// whether the collection was served from the result cache or freshly
/// materialized.
///
/// # Example
///
/// ```ignore
/// let response = pipeline.run(&grid, &state).await?;
///
/// if response.is_cached() {
///     println!("Served from cache, cached at {:?}", response.cached_at());
/// }
///
/// let output = response.into_inner();
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    data: T,
    /// Information about whether this response came from cache.
    pub cache: CacheStatus,
}

impl<T> Response<T> {
    /// Creates a new response with no cache involvement.
    pub fn new(data: T) -> Self {
        Self {
            data,
            cache: CacheStatus::None,
        }
    }

    /// Creates a new response indicating a cache miss (fresh data, now cached).
    pub fn cache_miss(data: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Miss { cached_at },
        }
    }

    /// Creates a new response indicating a cache hit.
    pub fn cache_hit(data: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            data,
            cache: CacheStatus::Hit { cached_at },
        }
    }

    /// Returns `true` if this response came from the cache.
    pub fn is_cached(&self) -> bool {
        matches!(self.cache, CacheStatus::Hit { .. })
    }

    /// Returns `true` if this was a fresh materialization (cache miss or cache disabled).
    pub fn is_fresh(&self) -> bool {
        !self.is_cached()
    }

    /// Returns when the data was cached, if applicable.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        match &self.cache {
            CacheStatus::None => None,
            CacheStatus::Miss { cached_at } | CacheStatus::Hit { cached_at } => Some(*cached_at),
        }
    }

    /// Returns a reference to the inner data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the response and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Maps the inner data using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        Response {
            data: f(self.data),
            cache: self.cache,
        }
    }
}

/// Cache status for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Cache was disabled, bypassed or unavailable for this run.
    None,
    /// Cache miss - data was freshly materialized and is now cached.
    Miss {
        /// When the data was cached.
        cached_at: DateTime<Utc>,
    },
    /// Cache hit - data was returned from cache.
    Hit {
        /// When the data was originally cached.
        cached_at: DateTime<Utc>,
    },
}

impl CacheStatus {
    /// Returns `true` if this is a cache hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Returns `true` if this is a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }

    /// Returns `true` if caching was not involved.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
