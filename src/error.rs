//! Error types for the cache and freshness layers.
//!
//! Most of these never reach application code: [`CacheStore`](crate::store::CacheStore)
//! swallows backend failures and degrades to a miss or a no-op. They surface
//! from the backend trait, from configuration parsing, and from
//! [`EntityTag::compute`](crate::conditional::EntityTag::compute).

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the cache layer.
#[derive(Debug, Clone)]
pub enum Error {
    /// Serialization failed when converting a value to cache bytes or when
    /// fingerprinting a response payload.
    ///
    /// For entity tags this is a caller programming error and is the one
    /// failure that propagates out of this crate.
    SerializationError(String),

    /// Deserialization failed when converting cache bytes back to a value.
    ///
    /// Common causes:
    /// - Entry corrupted in transport or storage
    /// - Entry read back as a different type than it was written as
    ///
    /// **Recovery:** the store evicts the entry and reports a miss.
    DeserializationError(String),

    /// Backend storage error (Redis connection lost, protocol error, ...).
    ///
    /// **Recovery:** the store flips to unavailable and serves from the
    /// in-process fallback until the next successful `connect()`.
    BackendError(String),

    /// Could not establish a connection to the networked backend.
    ConnectionError(String),

    /// Operation exceeded the configured timeout.
    Timeout(String),

    /// Invalid configuration (bad connection string, unparsable env var).
    ConfigError(String),

    /// Invalid cache entry: truncated header or bad magic.
    InvalidCacheEntry(String),

    /// Schema version mismatch between code and cached data.
    ///
    /// Expected during deployments; the entry is evicted and recomputed.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether this error means the networked backend itself is unhealthy,
    /// as opposed to a problem with one particular entry.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Error::BackendError(_) | Error::ConnectionError(_) | Error::Timeout(_)
        )
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        Error::Timeout(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ConfigError("bad url".to_string());
        assert_eq!(err.to_string(), "Config error: bad url");

        let err = Error::VersionMismatch {
            expected: 1,
            found: 2,
        };
        assert_eq!(err.to_string(), "Cache version mismatch: expected 1, found 2");
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }

    #[test]
    fn test_backend_failure_classification() {
        assert!(Error::BackendError("down".into()).is_backend_failure());
        assert!(Error::ConnectionError("refused".into()).is_backend_failure());
        assert!(Error::Timeout("ping".into()).is_backend_failure());
        assert!(!Error::DeserializationError("bad".into()).is_backend_failure());
        assert!(!Error::VersionMismatch {
            expected: 1,
            found: 9
        }
        .is_backend_failure());
    }

    #[test]
    fn test_from_serde_json_syntax_error() {
        let json_err = serde_json::from_str::<u32>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::DeserializationError(_)));
    }
}
