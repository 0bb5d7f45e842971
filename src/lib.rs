//! # folio-cache
//!
//! Caching and HTTP freshness core for the portfolio builder.
//!
//! ## Features
//!
//! - **Namespaced keys:** [`KeyNamespace`] gives every cached domain a fixed
//!   prefix, so invalidating one domain never touches another
//! - **Fail-open store:** [`CacheStore`] talks to Redis when it can and falls
//!   back to process memory when it can't. Cache trouble is never a request
//!   failure
//! - **Memoization:** [`memoize`] wraps expensive async work (AI calls,
//!   analytics aggregation) so repeated arguments are served from cache
//! - **HTTP freshness:** [`FreshnessPolicy`] maps endpoint classes to
//!   `Cache-Control`/`Vary`, and [`conditional`] answers `If-None-Match` /
//!   `If-Modified-Since` with `304 Not Modified`
//!
//! ## Quick Start
//!
//! ```ignore
//! use folio_cache::{
//!     conditional::{evaluate, Conditional, ConditionalContext},
//!     freshness::classes,
//!     CacheConfig, DefaultCacheStore, FreshnessPolicy, KeyNamespace,
//! };
//! use std::time::Duration;
//!
//! // 1. Build the store from REDIS_URL & friends and probe the backend
//! let store = DefaultCacheStore::from_config(&CacheConfig::from_env());
//! store.connect().await;
//!
//! // 2. Cache a rendered portfolio under its namespace
//! let key = KeyNamespace::Portfolio.key(&portfolio_id);
//! let portfolio = match store.get::<Portfolio>(&key).await {
//!     Some(hit) => hit,
//!     None => {
//!         let fresh = load_portfolio(&portfolio_id).await?;
//!         store.set(&key, &fresh, Some(Duration::from_secs(300))).await;
//!         fresh
//!     }
//! };
//!
//! // 3. Answer conditional requests, otherwise send with freshness headers
//! let ctx = ConditionalContext::for_payload(&portfolio, Some(portfolio.updated_at))?;
//! let policy = FreshnessPolicy::default();
//! match evaluate(request.headers(), &ctx) {
//!     Conditional::NotModified(resp) => policy.decorate(resp, classes::PORTFOLIOS, None, None),
//!     Conditional::Proceed => policy.decorate(render(&portfolio), classes::PORTFOLIOS, None, Some(&ctx)),
//! }
//!
//! // 4. After an edit, drop everything cached for portfolios
//! store.clear_pattern(KeyNamespace::Portfolio.pattern()).await;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod conditional;
pub mod config;
pub mod error;
pub mod freshness;
pub mod memoize;
pub mod namespace;
pub mod observability;
pub mod pattern;
pub mod serialization;
pub mod store;

// Re-exports for convenience
pub use backend::{CacheBackend, InMemoryBackend};
pub use conditional::{Conditional, ConditionalContext, EntityTag};
pub use config::{CacheConfig, ConnectPolicy};
pub use error::{Error, Result};
pub use freshness::{FreshnessConfig, FreshnessOverride, FreshnessPolicy, Visibility};
pub use memoize::{memoize, Memoized};
pub use namespace::{CacheKeyBuilder, KeyNamespace};
pub use pattern::GlobPattern;
pub use store::{Availability, CacheStore, DefaultCacheStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
