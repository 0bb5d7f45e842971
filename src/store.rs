//! Fail-open cache store with an in-process fallback.
//!
//! [`CacheStore`] is the single entry point handlers use to read and write
//! cached values. It routes each call either to a networked backend or to an
//! in-process [`InMemoryBackend`], depending on the store's [`Availability`]:
//!
//! ```text
//!                 ┌──────────────┐  available   ┌──────────────────┐
//!  get/set/del ──►│  CacheStore  │─────────────►│ networked (Redis) │
//!  clear_pattern  │ availability │              └──────────────────┘
//!                 │     flag     │ unavailable  ┌──────────────────┐
//!                 └──────────────┘─────────────►│ InMemoryBackend   │
//!                                               └──────────────────┘
//! ```
//!
//! The flag starts out `Unavailable`, becomes `Available` after a successful
//! [`connect`](CacheStore::connect), and drops back to `Unavailable` on the
//! first backend failure. No method returns an error: a failing backend turns
//! reads into misses and writes into no-ops. The cache is always a derived
//! view of authoritative data, so the worst case is recomputation.
//!
//! Concurrent writers to one key race and the last write wins. There is no
//! request coalescing.

use crate::backend::{CacheBackend, InMemoryBackend};
use crate::config::{CacheConfig, ConnectPolicy};
use crate::error::Error;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::pattern::GlobPattern;
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "redis")]
use crate::backend::RedisBackend;

/// Reachability of the networked backend, as last observed by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Store selected by [`CacheStore::from_config`] for the enabled features.
#[cfg(feature = "redis")]
pub type DefaultCacheStore = CacheStore<RedisBackend>;

/// Store selected by [`CacheStore::from_config`] for the enabled features.
#[cfg(not(feature = "redis"))]
pub type DefaultCacheStore = CacheStore<InMemoryBackend>;

/// Cache store shared by all request handlers.
///
/// Cloning is cheap and clones share the backend, the fallback map and the
/// availability flag.
///
/// # Example
///
/// ```
/// use folio_cache::{CacheStore, KeyNamespace};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = CacheStore::local();
/// store.connect().await;
///
/// let key = KeyNamespace::Portfolio.key("p_42");
/// store.set(&key, "rendered", Some(Duration::from_secs(60))).await;
/// assert_eq!(store.get::<String>(&key).await.as_deref(), Some("rendered"));
///
/// store.clear_pattern(KeyNamespace::Portfolio.pattern()).await;
/// assert_eq!(store.get::<String>(&key).await, None);
/// # }
/// ```
#[derive(Clone)]
pub struct CacheStore<B: CacheBackend = InMemoryBackend> {
    remote: Option<B>,
    fallback: InMemoryBackend,
    available: Arc<AtomicBool>,
    connect_policy: ConnectPolicy,
    metrics: Arc<dyn CacheMetrics>,
}

impl CacheStore<InMemoryBackend> {
    /// Store without a networked backend. Every call is served in-process.
    pub fn local() -> Self {
        Self::build(None)
    }
}

#[cfg(feature = "redis")]
impl CacheStore<RedisBackend> {
    /// Select the backend from configuration.
    ///
    /// A missing or unparsable connection string yields a store that only
    /// uses the in-process fallback. Call [`connect`](Self::connect) next.
    pub fn from_config(config: &CacheConfig) -> Self {
        let remote = config.redis_url.as_deref().and_then(|url| {
            RedisBackend::from_url(
                url,
                config.effective_pool_size(),
                config.connect.attempt_timeout,
            )
            .map_err(|e| warn!("✗ Ignoring cache backend configuration: {}", e))
            .ok()
        });

        Self::build(remote).with_connect_policy(config.connect.clone())
    }
}

#[cfg(not(feature = "redis"))]
impl CacheStore<InMemoryBackend> {
    /// Select the backend from configuration.
    ///
    /// Built without the `redis` feature, so a configured connection string
    /// is ignored with a warning.
    pub fn from_config(config: &CacheConfig) -> Self {
        if config.redis_url.is_some() {
            warn!("Cache backend URL configured but the `redis` feature is disabled - using in-process cache");
        }
        Self::local().with_connect_policy(config.connect.clone())
    }
}

impl<B: CacheBackend> CacheStore<B> {
    /// Store fronting `remote`. The store stays unavailable until
    /// [`connect`](Self::connect) succeeds.
    pub fn new(remote: B) -> Self {
        Self::build(Some(remote))
    }

    fn build(remote: Option<B>) -> Self {
        CacheStore {
            remote,
            fallback: InMemoryBackend::new(),
            available: Arc::new(AtomicBool::new(false)),
            connect_policy: ConnectPolicy::default(),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics<M: CacheMetrics + 'static>(mut self, metrics: M) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    /// Set the retry schedule used by [`connect`](Self::connect).
    pub fn with_connect_policy(mut self, policy: ConnectPolicy) -> Self {
        self.connect_policy = policy;
        self
    }

    /// Probe the networked backend and record whether it is reachable.
    ///
    /// Retries with capped exponential backoff and bounds every probe with
    /// the policy's timeout. Never fails; the returned value is also
    /// available later through [`availability`](Self::availability).
    ///
    /// A successful probe discards whatever the in-process fallback
    /// accumulated while the backend was away, since invalidations issued
    /// in the meantime never reached it.
    pub async fn connect(&self) -> Availability {
        let Some(remote) = &self.remote else {
            debug!("No networked cache backend configured - using in-process cache");
            return Availability::Unavailable;
        };

        let policy = &self.connect_policy;
        let attempts = policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            let outcome = match tokio::time::timeout(policy.attempt_timeout, remote.health_check())
                .await
            {
                Ok(Ok(true)) => Ok(()),
                Ok(Ok(false)) => Err(Error::BackendError("unexpected PING reply".to_string())),
                Ok(Err(e)) => Err(e),
                Err(elapsed) => Err(Error::from(elapsed)),
            };

            match outcome {
                Ok(()) => {
                    self.fallback.clear();
                    self.mark_available();
                    info!(
                        "✓ Cache backend {} connected (attempt {}/{})",
                        remote.name(),
                        attempt,
                        attempts
                    );
                    return Availability::Available;
                }
                Err(e) => {
                    debug!(
                        "Cache backend {} probe failed (attempt {}/{}): {}",
                        remote.name(),
                        attempt,
                        attempts,
                        e
                    );
                    if attempt < attempts {
                        tokio::time::sleep(policy.backoff(attempt)).await;
                    }
                }
            }
        }

        warn!(
            "✗ Cache backend {} unreachable after {} attempts - using in-process cache",
            remote.name(),
            attempts
        );
        self.mark_unavailable();
        Availability::Unavailable
    }

    /// Fetch and decode the value stored under `key`.
    ///
    /// Returns `None` on a miss, on any backend error, and when the stored
    /// bytes do not decode as `T` (that entry is evicted). Every call decodes
    /// a fresh owned value.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let timer = Instant::now();

        let bytes = match self.active_remote() {
            Some(remote) => match remote.get(key).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.degrade(key, &e);
                    None
                }
            },
            None => {
                self.metrics.record_fallback("get");
                self.fallback.get(key).await.unwrap_or_default()
            }
        };

        let Some(bytes) = bytes else {
            self.metrics.record_miss(key, timer.elapsed());
            return None;
        };

        match deserialize_from_cache::<T>(&bytes) {
            Ok(value) => {
                self.metrics.record_hit(key, timer.elapsed());
                Some(value)
            }
            Err(e) => {
                warn!("Evicting undecodable cache entry {}: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
                self.del(key).await;
                self.metrics.record_miss(key, timer.elapsed());
                None
            }
        }
    }

    /// Encode and store `value` under `key`.
    ///
    /// `ttl: None` stores without expiry in-process and under the
    /// networked backend's default policy otherwise. Failures are logged and
    /// dropped.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let timer = Instant::now();

        let bytes = match serialize_for_cache(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                return;
            }
        };

        let result = match self.active_remote() {
            Some(remote) => remote.set(key, bytes, ttl).await,
            None => {
                self.metrics.record_fallback("set");
                self.fallback.set(key, bytes, ttl).await
            }
        };

        match result {
            Ok(()) => self.metrics.record_set(key, timer.elapsed()),
            Err(e) => self.degrade(key, &e),
        }
    }

    /// Remove the entry under `key`. Absent keys are fine.
    pub async fn del(&self, key: &str) {
        let timer = Instant::now();

        let result = match self.active_remote() {
            Some(remote) => remote.delete(key).await,
            None => {
                self.metrics.record_fallback("del");
                self.fallback.delete(key).await
            }
        };

        match result {
            Ok(()) => self.metrics.record_delete(key, timer.elapsed()),
            Err(e) => self.degrade(key, &e),
        }
    }

    /// Remove every key matching `pattern` (`*` is the only wildcard).
    ///
    /// Best effort with no atomicity: entries written concurrently may or
    /// may not survive.
    pub async fn clear_pattern(&self, pattern: impl Into<GlobPattern>) {
        let pattern = pattern.into();
        let timer = Instant::now();

        let result = match self.active_remote() {
            Some(remote) => remote.delete_pattern(&pattern).await,
            None => {
                self.metrics.record_fallback("clear_pattern");
                self.fallback.delete_pattern(&pattern).await
            }
        };

        match result {
            Ok(deleted) => {
                debug!(
                    "Cleared {} keys matching {} in {:?}",
                    deleted,
                    pattern,
                    timer.elapsed()
                );
                self.metrics.record_delete(pattern.as_str(), timer.elapsed());
            }
            Err(e) => self.degrade(pattern.as_str(), &e),
        }
    }

    /// Release the networked connection and drop every in-process entry.
    pub async fn disconnect(&self) {
        if let Some(remote) = &self.remote {
            remote.close();
        }
        self.mark_unavailable();
        self.fallback.clear();
        debug!("Cache store disconnected");
    }

    /// Whether calls currently go to the networked backend.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn availability(&self) -> Availability {
        if self.is_available() {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }

    /// Name of the backend that would serve the next call.
    pub fn backend_name(&self) -> &'static str {
        match self.active_remote() {
            Some(remote) => remote.name(),
            None => self.fallback.name(),
        }
    }

    /// Whether a networked backend was configured at all.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    fn active_remote(&self) -> Option<&B> {
        self.remote.as_ref().filter(|_| self.is_available())
    }

    fn degrade(&self, key: &str, error: &Error) {
        warn!("Cache operation on {} failed, continuing without cache: {}", key, error);
        self.metrics.record_error(key, &error.to_string());
        if error.is_backend_failure() {
            self.mark_unavailable();
        }
    }

    fn mark_available(&self) {
        if !self.available.swap(true, Ordering::AcqRel) {
            self.metrics.record_availability(Availability::Available);
        }
    }

    fn mark_unavailable(&self) {
        if self.available.swap(false, Ordering::AcqRel) {
            warn!("⚠ Cache backend marked unavailable - serving from in-process cache");
            self.metrics.record_availability(Availability::Unavailable);
        }
    }
}

impl<B: CacheBackend> fmt::Debug for CacheStore<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("remote", &self.remote.as_ref().map(|r| r.name()))
            .field("availability", &self.availability())
            .field("fallback_entries", &self.fallback.len())
            .finish()
    }
}
