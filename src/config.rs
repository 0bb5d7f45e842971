//! Environment-driven configuration.
//!
//! | Variable                   | Meaning                                   | Default |
//! |----------------------------|-------------------------------------------|---------|
//! | `REDIS_URL`                | Connection string of the networked store  | unset → in-process fallback |
//! | `REDIS_POOL_SIZE`          | Max pooled connections                    | 16      |
//! | `CACHE_CONNECT_TIMEOUT_MS` | Timeout for each connection probe         | 2000    |
//! | `CACHE_CONNECT_ATTEMPTS`   | Probes made by `connect()` before giving up | 3     |
//!
//! An unset `REDIS_URL` is not an error. Unparsable numbers are logged and
//! replaced by their defaults.

use std::str::FromStr;
use std::sync::Once;
use std::time::Duration;

pub const REDIS_URL_VAR: &str = "REDIS_URL";
pub const REDIS_POOL_SIZE_VAR: &str = "REDIS_POOL_SIZE";
pub const CONNECT_TIMEOUT_VAR: &str = "CACHE_CONNECT_TIMEOUT_MS";
pub const CONNECT_ATTEMPTS_VAR: &str = "CACHE_CONNECT_ATTEMPTS";

const DEFAULT_POOL_SIZE: u32 = 16;

static MISSING_URL_WARNING: Once = Once::new();

/// Retry schedule used by `CacheStore::connect()`.
///
/// Attempt `n` (1-based) waits `base_delay * 2^(n-1)` before the next probe,
/// capped at `max_delay`. Each probe is bounded by `attempt_timeout`, so the
/// whole call finishes in bounded time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        ConnectPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(2),
        }
    }
}

impl ConnectPolicy {
    /// Single probe, no waiting. Handy in tests.
    pub fn once(attempt_timeout: Duration) -> Self {
        ConnectPolicy {
            max_attempts: 1,
            attempt_timeout,
            ..ConnectPolicy::default()
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(2_u32.pow(exponent))
            .min(self.max_delay)
    }
}

/// Cache layer configuration.
#[derive(Clone, Debug, Default)]
pub struct CacheConfig {
    /// Connection string of the networked backend. `None` selects the
    /// in-process fallback.
    pub redis_url: Option<String>,
    pub pool_size: Option<u32>,
    pub connect: ConnectPolicy,
}

impl CacheConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let redis_url = lookup(REDIS_URL_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if redis_url.is_none() {
            MISSING_URL_WARNING.call_once(|| {
                warn!(
                    "{} not set - caching falls back to in-process memory (not shared across instances)",
                    REDIS_URL_VAR
                );
            });
        }

        let defaults = ConnectPolicy::default();
        let connect = ConnectPolicy {
            max_attempts: parse_var(&lookup, CONNECT_ATTEMPTS_VAR)
                .unwrap_or(defaults.max_attempts)
                .max(1),
            attempt_timeout: parse_var::<u64, _>(&lookup, CONNECT_TIMEOUT_VAR)
                .map(Duration::from_millis)
                .unwrap_or(defaults.attempt_timeout),
            ..defaults
        };

        CacheConfig {
            redis_url,
            pool_size: parse_var(&lookup, REDIS_POOL_SIZE_VAR),
            connect,
        }
    }

    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = Some(size);
        self
    }

    pub fn with_connect_policy(mut self, policy: ConnectPolicy) -> Self {
        self.connect = policy;
        self
    }

    /// Pool size, falling back to the default.
    pub fn effective_pool_size(&self) -> u32 {
        self.pool_size.unwrap_or(DEFAULT_POOL_SIZE)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}, using default", name, raw);
            None
        }
    }
}
