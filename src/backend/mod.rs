//! Cache backend implementations.

use crate::error::Result;
use crate::pattern::GlobPattern;
use std::time::Duration;

pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig};

/// Trait for cache backend implementations.
///
/// Backends store opaque bytes; encoding lives in
/// [`serialization`](crate::serialization) and fail-open behaviour lives in
/// [`CacheStore`](crate::store::CacheStore). Backends report failures
/// honestly through `Result`.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Backend implementations should use interior mutability or external storage.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve value from cache by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found in cache
    /// - `Ok(None)` - Cache miss (key not found or expired)
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store value in cache with optional TTL.
    ///
    /// `ttl: None` stores without expiry in memory, and under the server's
    /// own default policy for networked backends.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Remove value from cache. Deleting an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove every key matching `pattern`, returning how many were removed.
    ///
    /// Best effort: keys written while this runs may or may not survive.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete_pattern(&self, pattern: &GlobPattern) -> Result<u64>;

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Release connections held by the backend. Later calls may fail.
    fn close(&self) {}

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct MinimalBackend;

    impl CacheBackend for MinimalBackend {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }

        async fn delete_pattern(&self, _pattern: &GlobPattern) -> Result<u64> {
            Ok(0)
        }

        fn name(&self) -> &'static str {
            "minimal"
        }
    }

    #[tokio::test]
    async fn test_backend_defaults() {
        let backend = MinimalBackend;
        assert!(backend.health_check().await.expect("health check"));
        backend.close();
    }
}
