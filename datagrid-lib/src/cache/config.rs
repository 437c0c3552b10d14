//! Cache configuration

use std::time::Duration;

/// Configuration for the result cache.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use datagrid_lib::cache::CacheConfig;
///
/// let config = CacheConfig::default()
///     .with_key_prefix("reports")
///     .with_ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Prefix joined to every grid identity to form the cache key.
    ///
    /// Default: `"datagrid"`
    pub key_prefix: String,

    /// Lifetime of cached collections.
    ///
    /// Default: `None` (remember until forgotten)
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "datagrid".to_string(),
            ttl: None,
        }
    }
}

impl CacheConfig {
    /// Creates a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets a lifetime for cached collections.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Builds the cache key for a grid identity.
    pub fn key(&self, identity: &str) -> String {
        format!("{}:{}", self.key_prefix, identity)
    }
}
