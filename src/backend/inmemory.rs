//! In-process cache backend.
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! There is no capacity eviction: entries leave only through explicit
//! deletion, or lazily on access once their TTL has passed.

use super::CacheBackend;
use crate::error::Result;
use crate::pattern::GlobPattern;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// In-memory cache entry with optional expiration.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        CacheEntry { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// Thread-safe in-memory cache backend.
///
/// Clones share the same map. Operations never fail; they are exposed through
/// the async [`CacheBackend`] surface so the store can swap this in for a
/// networked backend.
///
/// # Example
///
/// ```no_run
/// use folio_cache::backend::{InMemoryBackend, CacheBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("portfolio:1", b"value".to_vec(), None).await?;
///     assert!(backend.get("portfolio:1").await?.is_some());
///
///     backend
///         .set("portfolio:2", b"expires".to_vec(), Some(Duration::from_secs(300)))
///         .await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get memory statistics.
    pub fn stats(&self) -> CacheStats {
        let total_bytes: usize = self.store.iter().map(|entry| entry.data.len()).sum();
        let expired_count = self.store.iter().filter(|entry| entry.is_expired()).count();

        CacheStats {
            total_entries: self.store.len(),
            expired_entries: expired_count,
            total_bytes,
        }
    }

    /// Print cache statistics to debug log.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Cache Stats: {} entries ({} expired), {} bytes",
            stats.total_entries, stats.expired_entries, stats.total_bytes
        );
    }
}

impl InMemoryBackend {
    /// Drop every entry. Only the store calls this, on connect and disconnect.
    pub(crate) fn clear(&self) {
        let dropped = self.store.len();
        self.store.clear();
        debug!("InMemory cleared {} entries", dropped);
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        // Drop the expired entry, if any. The guard above is released first.
        self.store.remove_if(key, |_, entry| entry.is_expired());
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry::new(value, ttl);
        self.store.insert(key.to_string(), entry);

        if let Some(d) = ttl {
            debug!("✓ InMemory SET {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ InMemory SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &GlobPattern) -> Result<u64> {
        let before = self.store.len();
        self.store.retain(|key, _| !pattern.matches(key));
        let deleted = before.saturating_sub(self.store.len()) as u64;

        debug!("✓ InMemory DELETE_PATTERN {} ({} keys)", pattern, deleted);
        Ok(deleted)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "inmemory"
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inmemory_backend_set_get() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");

        let result = backend.get("key1").await.expect("Failed to get");
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_miss() {
        let backend = InMemoryBackend::new();

        let result = backend.get("nonexistent").await.expect("Failed to get");
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_inmemory_backend_delete_is_idempotent() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");
        backend.delete("key1").await.expect("Failed to delete");
        backend.delete("key1").await.expect("Second delete failed");

        assert_eq!(backend.get("key1").await.expect("Failed to get"), None);
    }

    #[tokio::test]
    async fn test_inmemory_backend_ttl_expiration() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::from_millis(100)))
            .await
            .expect("Failed to set");

        assert!(backend.get("key1").await.expect("Failed to get").is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(backend.get("key1").await.expect("Failed to get").is_none());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_inmemory_backend_delete_pattern() {
        let backend = InMemoryBackend::new();

        for key in ["user:1:profile", "user:2:profile", "post:1:data"] {
            backend
                .set(key, key.as_bytes().to_vec(), None)
                .await
                .expect("Failed to set");
        }

        let deleted = backend
            .delete_pattern(&GlobPattern::new("user:*"))
            .await
            .expect("Failed to delete pattern");

        assert_eq!(deleted, 2);
        assert_eq!(backend.len(), 1);
        assert!(backend
            .get("post:1:data")
            .await
            .expect("Failed to get")
            .is_some());
    }

    #[tokio::test]
    async fn test_inmemory_backend_clear() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value1".to_vec(), None)
            .await
            .expect("Failed to set");
        backend
            .set("key2", b"value2".to_vec(), None)
            .await
            .expect("Failed to set");

        assert_eq!(backend.len(), 2);
        backend.clear();
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test]
    async fn test_inmemory_backend_stats() {
        let backend = InMemoryBackend::new();

        backend
            .set("key1", b"value_with_data".to_vec(), None)
            .await
            .expect("Failed to set");
        backend
            .set("key2", b"data".to_vec(), None)
            .await
            .expect("Failed to set");

        let stats = backend.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.expired_entries, 0);
        assert_eq!(stats.total_bytes, 19);
    }

    #[tokio::test]
    async fn test_inmemory_backend_clone_shares_store() {
        let backend1 = InMemoryBackend::new();
        backend1
            .set("key", b"value".to_vec(), None)
            .await
            .expect("Failed to set");

        let backend2 = backend1.clone();
        let value = backend2.get("key").await.expect("Failed to get");
        assert_eq!(value, Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_inmemory_backend_thread_safe() {
        let backend = InMemoryBackend::new();
        let mut handles = vec![];

        for i in 0..10 {
            let b = backend.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key_{}", i);
                let value = format!("value_{}", i);
                b.set(&key, value.into_bytes(), None)
                    .await
                    .expect("Failed to set");
            }));
        }

        for handle in handles {
            handle.await.expect("Task failed");
        }

        assert_eq!(backend.len(), 10);
    }
}
