//! HTTP freshness policy per endpoint class.
//!
//! Each endpoint class maps to a [`FreshnessConfig`] describing how long a
//! response may be reused (`max-age`), how long a stale copy may still be
//! served while it is revalidated in the background
//! (`stale-while-revalidate`), and whether shared caches may keep it
//! (`public`/`private`).
//!
//! # Built-in classes
//!
//! | Class               | Visibility | max-age  | stale-while-revalidate |
//! |---------------------|------------|----------|------------------------|
//! | `static`            | public     | 1 year   | -                      |
//! | `templates`         | public     | 1 hour   | 1 day                  |
//! | `public-portfolios` | public     | 5 min    | 10 min                 |
//! | `portfolios`        | private    | 1 min    | -                      |
//! | `user`              | private    | 1 min    | -                      |
//! | `analytics`         | private    | 5 min    | -                      |
//! | `ai-results`        | private    | 10 min   | -                      |
//! | `realtime`          | private    | 0        | -                      |
//!
//! Unknown classes get the fallback (`private, max-age=0`).
//!
//! # Example
//!
//! ```
//! use folio_cache::freshness::{classes, FreshnessPolicy};
//! use http::header::CACHE_CONTROL;
//!
//! let policy = FreshnessPolicy::default();
//! let headers = policy.headers_for(classes::TEMPLATES, None);
//! assert_eq!(
//!     headers[CACHE_CONTROL],
//!     "public, max-age=3600, stale-while-revalidate=86400"
//! );
//! ```

use crate::conditional::ConditionalContext;
use http::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CACHE_CONTROL,
    VARY,
};
use http::Response;
use std::collections::HashMap;
use std::fmt;

/// Names of the built-in endpoint classes.
pub mod classes {
    pub const STATIC: &str = "static";
    pub const TEMPLATES: &str = "templates";
    pub const PUBLIC_PORTFOLIOS: &str = "public-portfolios";
    pub const PORTFOLIOS: &str = "portfolios";
    pub const USER: &str = "user";
    pub const ANALYTICS: &str = "analytics";
    pub const AI_RESULTS: &str = "ai-results";
    pub const REALTIME: &str = "realtime";
}

const ONE_MINUTE: u32 = 60;
const ONE_HOUR: u32 = 60 * ONE_MINUTE;
const ONE_DAY: u32 = 24 * ONE_HOUR;
const ONE_YEAR: u32 = 365 * ONE_DAY;

/// Who may store a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Shared caches (CDNs, proxies) may store it.
    Public,
    /// Only the requesting client may store it.
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Freshness settings for one endpoint class. Durations are in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreshnessConfig {
    pub max_age: u32,
    pub stale_while_revalidate: u32,
    pub visibility: Visibility,
}

impl FreshnessConfig {
    pub const fn public(max_age: u32, stale_while_revalidate: u32) -> Self {
        FreshnessConfig {
            max_age,
            stale_while_revalidate,
            visibility: Visibility::Public,
        }
    }

    pub const fn private(max_age: u32) -> Self {
        FreshnessConfig {
            max_age,
            stale_while_revalidate: 0,
            visibility: Visibility::Private,
        }
    }

    /// Render the `Cache-Control` directive list.
    pub fn cache_control(&self) -> String {
        let mut directives = format!("{}, max-age={}", self.visibility, self.max_age);
        if self.stale_while_revalidate > 0 {
            directives.push_str(&format!(
                ", stale-while-revalidate={}",
                self.stale_while_revalidate
            ));
        }
        directives
    }

    /// Apply per-call overrides on top of this configuration.
    pub fn with_overrides(mut self, overrides: &FreshnessOverride) -> Self {
        if let Some(max_age) = overrides.max_age {
            self.max_age = max_age;
        }
        if let Some(swr) = overrides.stale_while_revalidate {
            self.stale_while_revalidate = swr;
        }
        if let Some(visibility) = overrides.visibility {
            self.visibility = visibility;
        }
        self
    }
}

/// Per-call adjustments to a class's configuration. Unset fields keep the
/// class value.
///
/// ```
/// use folio_cache::freshness::{FreshnessOverride, Visibility};
///
/// // a portfolio the owner just published: shareable, short-lived
/// let overrides = FreshnessOverride::default()
///     .with_visibility(Visibility::Public)
///     .with_max_age(30);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreshnessOverride {
    pub max_age: Option<u32>,
    pub stale_while_revalidate: Option<u32>,
    pub visibility: Option<Visibility>,
}

impl FreshnessOverride {
    pub fn with_max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_stale_while_revalidate(mut self, seconds: u32) -> Self {
        self.stale_while_revalidate = Some(seconds);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// Immutable mapping from endpoint class to freshness settings.
#[derive(Clone, Debug)]
pub struct FreshnessPolicy {
    classes: HashMap<String, FreshnessConfig>,
    fallback: FreshnessConfig,
    vary: HeaderValue,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        FreshnessPolicy::builder().build()
    }
}

impl FreshnessPolicy {
    /// Builder pre-populated with the built-in classes.
    pub fn builder() -> FreshnessPolicyBuilder {
        FreshnessPolicyBuilder::default()
    }

    /// Configuration registered for `class`, or the fallback.
    pub fn config_for(&self, class: &str) -> &FreshnessConfig {
        match self.classes.get(class) {
            Some(config) => config,
            None => {
                warn!(
                    "Unknown endpoint class {:?} - using fallback freshness ({})",
                    class,
                    self.fallback.cache_control()
                );
                &self.fallback
            }
        }
    }

    /// Whether `class` is registered.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Effective configuration for one call.
    pub fn resolve(&self, class: &str, overrides: Option<&FreshnessOverride>) -> FreshnessConfig {
        let config = *self.config_for(class);
        match overrides {
            Some(overrides) => config.with_overrides(overrides),
            None => config,
        }
    }

    /// `Cache-Control` and `Vary` headers for `class`.
    pub fn headers_for(&self, class: &str, overrides: Option<&FreshnessOverride>) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        self.apply_headers(&mut headers, class, overrides);
        headers
    }

    /// Write `Cache-Control` and `Vary` into `headers`, replacing any
    /// existing values.
    pub fn apply_headers(
        &self,
        headers: &mut HeaderMap,
        class: &str,
        overrides: Option<&FreshnessOverride>,
    ) {
        let config = self.resolve(class, overrides);
        match HeaderValue::from_str(&config.cache_control()) {
            Ok(value) => {
                headers.insert(CACHE_CONTROL, value);
            }
            Err(e) => error!("Unrenderable Cache-Control for {}: {}", class, e),
        }
        headers.insert(VARY, self.vary.clone());
    }

    /// Return `response` with freshness headers for `class`, plus `ETag`
    /// and `Last-Modified` when `validators` carries them.
    pub fn decorate<B>(
        &self,
        mut response: Response<B>,
        class: &str,
        overrides: Option<&FreshnessOverride>,
        validators: Option<&ConditionalContext>,
    ) -> Response<B> {
        self.apply_headers(response.headers_mut(), class, overrides);
        if let Some(validators) = validators {
            validators.apply_headers(response.headers_mut());
        }
        response
    }

    /// Rendered `Vary` value.
    pub fn vary(&self) -> &HeaderValue {
        &self.vary
    }
}

/// Startup-time builder for [`FreshnessPolicy`].
#[derive(Clone, Debug)]
pub struct FreshnessPolicyBuilder {
    classes: HashMap<String, FreshnessConfig>,
    fallback: FreshnessConfig,
    vary: Vec<HeaderName>,
}

impl Default for FreshnessPolicyBuilder {
    fn default() -> Self {
        let classes = [
            (classes::STATIC, FreshnessConfig::public(ONE_YEAR, 0)),
            (classes::TEMPLATES, FreshnessConfig::public(ONE_HOUR, ONE_DAY)),
            (
                classes::PUBLIC_PORTFOLIOS,
                FreshnessConfig::public(5 * ONE_MINUTE, 10 * ONE_MINUTE),
            ),
            (classes::PORTFOLIOS, FreshnessConfig::private(ONE_MINUTE)),
            (classes::USER, FreshnessConfig::private(ONE_MINUTE)),
            (classes::ANALYTICS, FreshnessConfig::private(5 * ONE_MINUTE)),
            (classes::AI_RESULTS, FreshnessConfig::private(10 * ONE_MINUTE)),
            (classes::REALTIME, FreshnessConfig::private(0)),
        ]
        .into_iter()
        .map(|(name, config)| (name.to_string(), config))
        .collect();

        FreshnessPolicyBuilder {
            classes,
            fallback: FreshnessConfig::private(0),
            vary: vec![ACCEPT_ENCODING, ACCEPT, AUTHORIZATION],
        }
    }
}

impl FreshnessPolicyBuilder {
    /// Register or replace a class.
    pub fn with_class(mut self, name: impl Into<String>, config: FreshnessConfig) -> Self {
        self.classes.insert(name.into(), config);
        self
    }

    /// Drop every built-in class.
    pub fn without_builtin_classes(mut self) -> Self {
        self.classes.clear();
        self
    }

    /// Configuration used for unknown classes.
    pub fn with_fallback(mut self, config: FreshnessConfig) -> Self {
        self.fallback = config;
        self
    }

    /// Add a request header to `Vary`.
    pub fn with_vary(mut self, header: HeaderName) -> Self {
        if !self.vary.contains(&header) {
            self.vary.push(header);
        }
        self
    }

    pub fn build(self) -> FreshnessPolicy {
        let joined = self
            .vary
            .iter()
            .map(HeaderName::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        // header names are always valid header values
        let vary = HeaderValue::from_str(&joined)
            .unwrap_or_else(|_| HeaderValue::from_static("accept-encoding, accept, authorization"));

        FreshnessPolicy {
            classes: self.classes,
            fallback: self.fallback,
            vary,
        }
    }
}
