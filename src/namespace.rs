//! Cache key namespaces and key composition.
//!
//! Every key is `<prefix>:<discriminator>`. Patterns for a namespace are
//! `<prefix>:*`, so the trailing separator keeps groups apart even when one
//! bare prefix is a substring of another.
//!
//! Discriminators are not validated. A caller that later clears by pattern
//! must not put the `*` wildcard inside its own discriminators.

use crate::error::Error;
use crate::pattern::GlobPattern;
use std::fmt;
use std::str::FromStr;

/// Separator between key parts.
pub const SEPARATOR: char = ':';

/// Logical groups of cache keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyNamespace {
    /// Rendered portfolios served to visitors and owners.
    Portfolio,
    /// Results returned by the AI content generator.
    AiResult,
    /// Aggregated analytics reports.
    Analytics,
    /// Responses from third-party integrations (GitHub, LinkedIn, ...).
    ExternalIntegration,
    /// Portfolio templates and theme metadata.
    Template,
    /// Per-user profile data.
    User,
    /// Session-scoped data.
    Session,
}

impl KeyNamespace {
    pub const ALL: [KeyNamespace; 7] = [
        KeyNamespace::Portfolio,
        KeyNamespace::AiResult,
        KeyNamespace::Analytics,
        KeyNamespace::ExternalIntegration,
        KeyNamespace::Template,
        KeyNamespace::User,
        KeyNamespace::Session,
    ];

    /// Bare prefix string, without separator.
    pub const fn prefix(self) -> &'static str {
        match self {
            KeyNamespace::Portfolio => "portfolio",
            KeyNamespace::AiResult => "ai-result",
            KeyNamespace::Analytics => "analytics",
            KeyNamespace::ExternalIntegration => "external-integration",
            KeyNamespace::Template => "template",
            KeyNamespace::User => "user",
            KeyNamespace::Session => "session",
        }
    }

    /// Full key for `discriminator` in this namespace.
    pub fn key(self, discriminator: impl fmt::Display) -> String {
        CacheKeyBuilder::build_with_prefix(self.prefix(), &discriminator)
    }

    /// Pattern matching every key in this namespace.
    pub fn pattern(self) -> GlobPattern {
        GlobPattern::new(format!("{}{}*", self.prefix(), SEPARATOR))
    }
}

impl fmt::Display for KeyNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for KeyNamespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyNamespace::ALL
            .into_iter()
            .find(|ns| ns.prefix() == s)
            .ok_or_else(|| Error::ConfigError(format!("Unknown key namespace: {}", s)))
    }
}

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build cache key with custom prefix.
    pub fn build_with_prefix(prefix: &str, id: &dyn fmt::Display) -> String {
        format!("{}{}{}", prefix, SEPARATOR, id)
    }

    /// Build composite key from multiple parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join(":")
    }

    /// Parse a composite key into parts.
    pub fn parse(key: &str) -> Vec<&str> {
        key.split(SEPARATOR).collect()
    }

    /// Namespace a key belongs to, if it was built from one.
    pub fn namespace_of(key: &str) -> Option<KeyNamespace> {
        key.split_once(SEPARATOR)
            .and_then(|(prefix, _)| prefix.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_key() {
        assert_eq!(KeyNamespace::Portfolio.key("p_42"), "portfolio:p_42");
        assert_eq!(KeyNamespace::AiResult.key(7), "ai-result:7");
    }

    #[test]
    fn test_cache_key_builder_custom_prefix() {
        let key = CacheKeyBuilder::build_with_prefix("custom", &"123");
        assert_eq!(key, "custom:123");
    }

    #[test]
    fn test_composite_key_builder() {
        let key = CacheKeyBuilder::build_composite(&["user", "123", "profile"]);
        assert_eq!(key, "user:123:profile");
    }

    #[test]
    fn test_composite_key_parser() {
        let parts = CacheKeyBuilder::parse("user:123:profile");
        assert_eq!(parts, vec!["user", "123", "profile"]);
    }

    #[test]
    fn test_namespace_of() {
        assert_eq!(
            CacheKeyBuilder::namespace_of("template:dark"),
            Some(KeyNamespace::Template)
        );
        assert_eq!(CacheKeyBuilder::namespace_of("bogus:1"), None);
        assert_eq!(CacheKeyBuilder::namespace_of("portfolio"), None);
    }

    #[test]
    fn test_prefix_round_trip() {
        for ns in KeyNamespace::ALL {
            assert_eq!(ns.prefix().parse::<KeyNamespace>().unwrap(), ns);
        }
        assert!("nope".parse::<KeyNamespace>().is_err());
    }

    #[test]
    fn test_prefixes_are_unique() {
        for a in KeyNamespace::ALL {
            for b in KeyNamespace::ALL {
                if a != b {
                    assert_ne!(a.prefix(), b.prefix());
                }
            }
        }
    }

    #[test]
    fn test_namespace_patterns_never_cross_match() {
        for a in KeyNamespace::ALL {
            let pattern = a.pattern();
            for b in KeyNamespace::ALL {
                let key = b.key("some:discriminator");
                assert_eq!(pattern.matches(&key), a == b, "{} vs {}", pattern, key);
            }
        }
    }
}
