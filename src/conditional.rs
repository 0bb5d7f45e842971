//! Conditional request validation (`ETag` / `If-None-Match`,
//! `Last-Modified` / `If-Modified-Since`).
//!
//! A handler computes validators for the payload it is about to send, asks
//! [`evaluate`] whether the client's copy is still current, and either
//! returns the ready-made `304 Not Modified` or sends the full body:
//!
//! ```
//! use folio_cache::conditional::{evaluate, Conditional, ConditionalContext};
//! use http::header::IF_NONE_MATCH;
//! use http::{HeaderMap, StatusCode};
//!
//! let payload = serde_json::json!({ "title": "Portfolio", "projects": 3 });
//! let ctx = ConditionalContext::for_payload(&payload, None).unwrap();
//!
//! let mut request_headers = HeaderMap::new();
//! request_headers.insert(IF_NONE_MATCH, ctx.header_value().unwrap());
//!
//! match evaluate::<String>(&request_headers, &ctx) {
//!     Conditional::NotModified(response) => {
//!         assert_eq!(response.status(), StatusCode::NOT_MODIFIED)
//!     }
//!     Conditional::Proceed => unreachable!(),
//! }
//! ```
//!
//! Entity tags are strong validators: the quoted hex SHA-256 of the
//! payload's JSON encoding. Payloads containing hash maps should use
//! ordered maps so equal content encodes identically.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use http::header::{HeaderMap, HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use http::{Response, StatusCode};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Strong entity tag, stored in its quoted wire form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityTag(String);

impl EntityTag {
    /// Tag for the JSON encoding of `payload`.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` when the payload cannot be
    /// encoded as JSON.
    pub fn compute<T: Serialize + ?Sized>(payload: &T) -> Result<Self> {
        let bytes =
            serde_json::to_vec(payload).map_err(|e| Error::SerializationError(e.to_string()))?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Tag for raw response bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        EntityTag(format!("\"{}\"", hex::encode(digest)))
    }

    /// Quoted form, as sent in the `ETag` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an `If-None-Match` value names this tag.
    ///
    /// Comparison is on the whole trimmed value; lists and weak tags never
    /// match.
    pub fn matches(&self, if_none_match: &str) -> bool {
        if_none_match.trim() == self.0
    }

    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validators previously computed for a response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionalContext {
    pub entity_tag: Option<EntityTag>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ConditionalContext {
    /// Validators for `payload`, optionally with its modification time.
    pub fn for_payload<T: Serialize + ?Sized>(
        payload: &T,
        last_modified: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        Ok(ConditionalContext {
            entity_tag: Some(EntityTag::compute(payload)?),
            last_modified,
        })
    }

    pub fn with_entity_tag(mut self, tag: EntityTag) -> Self {
        self.entity_tag = Some(tag);
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Whether the client's cached copy (per `request_headers`) is current.
    pub fn is_fresh(&self, request_headers: &HeaderMap) -> bool {
        is_fresh(
            request_headers,
            self.entity_tag.as_ref(),
            self.last_modified,
        )
    }

    /// `ETag` header value, if a tag is present.
    pub fn header_value(&self) -> Option<HeaderValue> {
        self.entity_tag.as_ref().and_then(EntityTag::header_value)
    }

    /// Write `ETag` and `Last-Modified` for whichever validators are set.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        if let Some(value) = self.header_value() {
            headers.insert(ETAG, value);
        }
        if let Some(last_modified) = self.last_modified {
            if let Ok(value) = HeaderValue::from_str(&format_http_date(last_modified)) {
                headers.insert(LAST_MODIFIED, value);
            }
        }
    }
}

/// Outcome of conditional request evaluation.
#[derive(Debug)]
pub enum Conditional<B> {
    /// The client needs the full response.
    Proceed,
    /// The client's copy is current; send this `304` as-is.
    NotModified(Response<B>),
}

impl<B> Conditional<B> {
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Conditional::NotModified(_))
    }
}

/// Whether the client's cached copy is still current.
///
/// True when `If-None-Match` equals `entity_tag`, or when `If-Modified-Since`
/// is at or after `last_modified` (compared at whole-second precision).
/// Missing or malformed request headers count as absent, so the answer is
/// then `false`.
pub fn is_fresh(
    request_headers: &HeaderMap,
    entity_tag: Option<&EntityTag>,
    last_modified: Option<DateTime<Utc>>,
) -> bool {
    if let Some(tag) = entity_tag {
        if let Some(if_none_match) = header_str(request_headers, IF_NONE_MATCH) {
            if tag.matches(if_none_match) {
                return true;
            }
        }
    }

    if let Some(last_modified) = last_modified {
        if let Some(since) = header_str(request_headers, IF_MODIFIED_SINCE).and_then(parse_http_date)
        {
            // HTTP dates carry no sub-second part
            return since.timestamp() >= last_modified.timestamp();
        }
    }

    false
}

/// Bodyless `304 Not Modified` carrying the validators in `ctx`.
pub fn not_modified_response<B: Default>(ctx: &ConditionalContext) -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::NOT_MODIFIED;
    ctx.apply_headers(response.headers_mut());
    response
}

/// Decide between a `304` and the full response.
pub fn evaluate<B: Default>(request_headers: &HeaderMap, ctx: &ConditionalContext) -> Conditional<B> {
    if ctx.is_fresh(request_headers) {
        debug!(
            "✓ Conditional request satisfied (etag: {:?})",
            ctx.entity_tag.as_ref().map(EntityTag::as_str)
        );
        Conditional::NotModified(not_modified_response(ctx))
    } else {
        Conditional::Proceed
    }
}

/// Format as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP date formats. Returns `None` when malformed.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    [RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

fn header_str(headers: &HeaderMap, name: http::header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
