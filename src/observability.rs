//! Metrics hooks for cache operations.
//!
//! Implement [`CacheMetrics`] to forward store events to your monitoring
//! system, then attach it with
//! [`CacheStore::with_metrics`](crate::store::CacheStore::with_metrics):
//!
//! ```ignore
//! use folio_cache::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CacheMetrics for PrometheusMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("cache_hits").inc();
//!     }
//!     fn record_fallback(&self, _operation: &str) {
//!         // counter!("cache_fallback_ops").inc();
//!     }
//! }
//!
//! let store = CacheStore::local().with_metrics(PrometheusMetrics);
//! ```
//!
//! Every method has a default that logs through the `log` crate, so an
//! implementation only overrides the events it cares about. The store uses
//! [`NoOpMetrics`] unless told otherwise.

use crate::store::Availability;
use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a cache set operation.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache delete operation.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    /// Record an error that the store swallowed.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }

    /// Record an operation served by the in-process fallback.
    fn record_fallback(&self, operation: &str) {
        debug!("Cache FALLBACK: {}", operation);
    }

    /// Record a change of backend availability.
    fn record_availability(&self, availability: Availability) {
        info!("Cache availability changed: {}", availability);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
    fn record_fallback(&self, _operation: &str) {}
    fn record_availability(&self, _availability: Availability) {}
}
