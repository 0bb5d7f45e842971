//! Memoization of expensive async work through the cache store.
//!
//! [`memoize`] wraps a closure so that repeated calls with the same
//! arguments return the stored result instead of running the work again:
//!
//! ```
//! use folio_cache::{memoize, CacheStore, KeyNamespace};
//! use std::convert::Infallible;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let summarize = memoize(
//!     CacheStore::local(),
//!     KeyNamespace::AiResult.prefix(),
//!     Some(Duration::from_secs(600)),
//!     |bio: String| async move { Ok::<_, Infallible>(format!("summary of {}", bio.len())) },
//! );
//!
//! let first = summarize.call("long bio".to_string()).await.unwrap();
//! let second = summarize.call("long bio".to_string()).await.unwrap();
//! assert_eq!(first, second);
//! # }
//! ```
//!
//! The key is `<prefix>:<arguments as JSON>`. Within the TTL a key is
//! computed at most once per process *for sequential callers*; concurrent
//! first calls on a cold key may all run the work. Work must therefore be
//! idempotent. Failed work is returned to the caller and never stored.

use crate::backend::CacheBackend;
use crate::namespace::{CacheKeyBuilder, SEPARATOR};
use crate::store::CacheStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Wrap `work` so its results are memoized in `store` under `prefix`.
pub fn memoize<B, F>(
    store: CacheStore<B>,
    prefix: impl Into<String>,
    ttl: Option<Duration>,
    work: F,
) -> Memoized<B, F>
where
    B: CacheBackend,
{
    Memoized {
        store,
        prefix: prefix.into(),
        ttl,
        work,
    }
}

/// A memoized unit of work. Build with [`memoize`].
pub struct Memoized<B: CacheBackend, F> {
    store: CacheStore<B>,
    prefix: String,
    ttl: Option<Duration>,
    work: F,
}

impl<B: CacheBackend, F> Memoized<B, F> {
    /// Cache key for `args`, or `None` when the arguments cannot be encoded.
    pub fn key_for<A: Serialize + ?Sized>(&self, args: &A) -> Option<String> {
        match serde_json::to_string(args) {
            Ok(json) => Some(CacheKeyBuilder::build_with_prefix(&self.prefix, &json)),
            Err(e) => {
                warn!(
                    "Cannot derive memoization key under {}: {} - running uncached",
                    self.prefix, e
                );
                None
            }
        }
    }

    /// Return the memoized result for `args`, running the work on a miss.
    ///
    /// # Errors
    ///
    /// Returns whatever error the wrapped work returns. Cache failures never
    /// surface here.
    pub async fn call<A, T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        A: Serialize,
        T: Serialize + DeserializeOwned,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = self.key_for(&args);

        if let Some(key) = &key {
            if let Some(hit) = self.store.get::<T>(key).await {
                debug!("✓ Memoized HIT {}", key);
                return Ok(hit);
            }
        }

        let value = (self.work)(args).await?;

        if let Some(key) = &key {
            self.store.set(key, &value, self.ttl).await;
            debug!("✓ Memoized {} (TTL: {:?})", key, self.ttl);
        }

        Ok(value)
    }

    /// Forget the memoized result for `args`.
    pub async fn invalidate<A: Serialize + ?Sized>(&self, args: &A) {
        if let Some(key) = self.key_for(args) {
            self.store.del(&key).await;
        }
    }

    /// Forget every memoized result under this prefix.
    pub async fn invalidate_all(&self) {
        self.store
            .clear_pattern(format!("{}{}*", self.prefix, SEPARATOR))
            .await;
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_work(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(u32) -> std::future::Ready<Result<u32, Infallible>> {
        move |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(n * 2))
        }
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let doubled = memoize(CacheStore::local(), "double", None, counting_work(calls.clone()));

        assert_eq!(doubled.call(21).await, Ok(42));
        assert_eq!(doubled.call(21).await, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_arguments_use_distinct_keys() {
        let calls = Arc::new(AtomicUsize::new(0));
        let doubled = memoize(CacheStore::local(), "double", None, counting_work(calls.clone()));

        assert_eq!(doubled.call(1).await, Ok(2));
        assert_eq!(doubled.call(2).await, Ok(4));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(doubled.key_for(&1).as_deref(), Some("double:1"));
    }

    #[tokio::test]
    async fn test_work_reruns_after_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let doubled = memoize(
            CacheStore::local(),
            "double",
            Some(Duration::from_millis(50)),
            counting_work(calls.clone()),
        );

        doubled.call(5).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        doubled.call(5).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let flaky = memoize(CacheStore::local(), "flaky", None, move |n: u32| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err("upstream timeout".to_string())
                } else {
                    Ok(n)
                }
            }
        });

        assert!(flaky.call(7).await.is_err());
        assert_eq!(flaky.call(7).await, Ok(7));
        assert_eq!(flaky.call(7).await, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = CacheStore::local();
        let doubled = memoize(store.clone(), "double", None, counting_work(calls.clone()));

        doubled.call(1).await.unwrap();
        doubled.call(2).await.unwrap();

        doubled.invalidate(&1).await;
        doubled.call(1).await.unwrap();
        doubled.call(2).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        store.set("other:1", "keep", None).await;
        doubled.invalidate_all().await;
        doubled.call(2).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(store.get::<String>("other:1").await.as_deref(), Some("keep"));
    }

    #[tokio::test]
    async fn test_structured_arguments() {
        #[derive(Serialize)]
        struct Query {
            user: String,
            page: u32,
        }

        let store = CacheStore::local();
        let lookup = memoize(store, "analytics", None, |q: Query| async move {
            Ok::<_, Infallible>(format!("{}#{}", q.user, q.page))
        });

        let key = lookup.key_for(&Query {
            user: "ada".to_string(),
            page: 2,
        });
        assert_eq!(key.as_deref(), Some(r#"analytics:{"user":"ada","page":2}"#));
        assert_eq!(
            lookup
                .call(Query {
                    user: "ada".to_string(),
                    page: 2,
                })
                .await,
            Ok("ada#2".to_string())
        );
    }
}
