//! Versioned cache entry encoding.
//!
//! Every value written through [`CacheStore`](crate::store::CacheStore) is
//! encoded here, whichever backend ends up holding the bytes. Readers always
//! decode a fresh owned value, so a caller mutating what it got back can never
//! affect what another caller reads.
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│ VERSION (varint)│  JSON PAYLOAD (N bytes)  │
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "FOLC"              u32              serde_json::to_writer(T)
//! ```
//!
//! The header is postcard-encoded. The payload is JSON so that values whose
//! serde shape depends on the data (`serde_json::Value`, untagged enums,
//! `skip_serializing_if`, `flatten`) decode back to what was stored.
//!
//! # Example
//!
//! ```rust
//! use folio_cache::serialization::{serialize_for_cache, deserialize_from_cache};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Portfolio {
//!     id: u64,
//!     title: String,
//! }
//!
//! # fn main() -> folio_cache::Result<()> {
//! let portfolio = Portfolio { id: 1, title: "Ada's work".to_string() };
//! let bytes = serialize_for_cache(&portfolio)?;
//! let decoded: Portfolio = deserialize_from_cache(&bytes)?;
//! assert_eq!(portfolio, decoded);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header for cache entries: b"FOLC"
pub const CACHE_MAGIC: [u8; 4] = *b"FOLC";

/// Current schema version.
///
/// Bump when cached types or the payload encoding change shape. Entries
/// written under another version are rejected on read, evicted, and
/// recomputed by the caller.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Header written in front of every cached payload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHeader {
    /// Magic header: must be b"FOLC"
    pub magic: [u8; 4],
    /// Schema version: must match CURRENT_SCHEMA_VERSION
    pub version: u32,
}

impl CacheHeader {
    /// Header with current magic and version.
    pub const fn current() -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
        }
    }
}

impl Default for CacheHeader {
    fn default() -> Self {
        Self::current()
    }
}

/// Serialize a value with its header for cache storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the header or payload cannot be
/// encoded.
pub fn serialize_for_cache<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    encode_with_header(CacheHeader::current(), value)
}

/// Encode `value` behind an explicit header.
pub(crate) fn encode_with_header<T: Serialize + ?Sized>(
    header: CacheHeader,
    value: &T,
) -> Result<Vec<u8>> {
    let mut bytes = postcard::to_allocvec(&header).map_err(|e| {
        log::error!("Cache header serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })?;
    serde_json::to_writer(&mut bytes, value).map_err(|e| {
        log::error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })?;
    Ok(bytes)
}

/// Deserialize a value from cache storage with validation.
///
/// # Errors
///
/// - `Error::DeserializationError`: Truncated header or corrupted payload
/// - `Error::InvalidCacheEntry`: Invalid magic header
/// - `Error::VersionMismatch`: Schema version mismatch
pub fn deserialize_from_cache<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let (header, payload) = postcard::take_from_bytes::<CacheHeader>(bytes).map_err(|e| {
        log::debug!("Cache header deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if header.magic != CACHE_MAGIC {
        log::warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC,
            header.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, header.magic
        )));
    }

    if header.version != CURRENT_SCHEMA_VERSION {
        log::warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION,
            header.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: header.version,
        });
    }

    serde_json::from_slice(payload).map_err(|e| {
        log::debug!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })
}
