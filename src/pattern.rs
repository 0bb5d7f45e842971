//! Glob patterns for bulk key deletion.
//!
//! `*` is the only wildcard. It matches any run of characters, including an
//! empty one, and may appear more than once. Every other character matches
//! itself, so discriminators containing `?`, `[`, `.` or `+` cannot widen a
//! pattern by accident.

use std::fmt;

/// Wildcard token recognised in patterns.
pub const WILDCARD: char = '*';

/// A parsed glob pattern anchored at both ends.
///
/// ```
/// use folio_cache::pattern::GlobPattern;
///
/// let pattern = GlobPattern::new("user:*");
/// assert!(pattern.matches("user:1:profile"));
/// assert!(!pattern.matches("post:1:data"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobPattern {
    raw: String,
    /// Literal runs between wildcards. `n` wildcards produce `n + 1` segments.
    segments: Vec<String>,
}

impl GlobPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let segments = raw.split(WILDCARD).map(str::to_string).collect();
        GlobPattern { raw, segments }
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern contains no wildcard and matches one exact key.
    pub fn is_literal(&self) -> bool {
        self.segments.len() == 1
    }

    /// The literal text before the first wildcard.
    pub fn literal_prefix(&self) -> &str {
        &self.segments[0]
    }

    /// Test `key` against the pattern.
    pub fn matches(&self, key: &str) -> bool {
        if self.is_literal() {
            return key == self.raw;
        }

        let first = &self.segments[0];
        let last = &self.segments[self.segments.len() - 1];

        if key.len() < first.len() + last.len() {
            return false;
        }
        if !key.starts_with(first.as_str()) || !key.ends_with(last.as_str()) {
            return false;
        }

        // Greedy leftmost placement of the middle segments is sufficient for
        // a single wildcard kind.
        let mut rest = &key[first.len()..key.len() - last.len()];
        for segment in &self.segments[1..self.segments.len() - 1] {
            match rest.find(segment.as_str()) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }

        true
    }

    /// Render for Redis `SCAN MATCH`, escaping every Redis glob
    /// metacharacter except the wildcard.
    pub fn to_redis_glob(&self) -> String {
        let mut out = String::with_capacity(self.raw.len() + 4);
        for ch in self.raw.chars() {
            if matches!(ch, '?' | '[' | ']' | '\\' | '^') {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for GlobPattern {
    fn from(s: &str) -> Self {
        GlobPattern::new(s)
    }
}

impl From<String> for GlobPattern {
    fn from(s: String) -> Self {
        GlobPattern::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern() {
        let p = GlobPattern::new("user:*");
        assert!(p.matches("user:1:profile"));
        assert!(p.matches("user:"));
        assert!(!p.matches("user"));
        assert!(!p.matches("post:1:data"));
        assert!(!p.matches("xuser:1"));
    }

    #[test]
    fn test_literal_pattern() {
        let p = GlobPattern::new("portfolio:42");
        assert!(p.is_literal());
        assert!(p.matches("portfolio:42"));
        assert!(!p.matches("portfolio:421"));
    }

    #[test]
    fn test_suffix_and_infix_wildcards() {
        let p = GlobPattern::new("*:profile");
        assert!(p.matches("user:1:profile"));
        assert!(!p.matches("user:1:settings"));

        let p = GlobPattern::new("user:*:profile");
        assert!(p.matches("user:1:profile"));
        assert!(p.matches("user::profile"));
        assert!(!p.matches("user:1:profiles"));
    }

    #[test]
    fn test_multiple_wildcards() {
        let p = GlobPattern::new("a*b*c");
        assert!(p.matches("abc"));
        assert!(p.matches("aXXbYYc"));
        assert!(!p.matches("acb"));

        // Overlapping first/last segments must not share characters.
        let p = GlobPattern::new("ab*ba");
        assert!(!p.matches("aba"));
        assert!(p.matches("abba"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let p = GlobPattern::new("search:a.b?*");
        assert!(p.matches("search:a.b?query"));
        assert!(!p.matches("search:aXbYquery"));

        let p = GlobPattern::new("q:[1]*");
        assert!(p.matches("q:[1]x"));
        assert!(!p.matches("q:1x"));
    }

    #[test]
    fn test_lone_wildcard_matches_everything() {
        let p = GlobPattern::new("*");
        assert!(p.matches(""));
        assert!(p.matches("anything:at:all"));
        assert_eq!(p.literal_prefix(), "");
    }

    #[test]
    fn test_redis_glob_escaping() {
        assert_eq!(GlobPattern::new("user:*").to_redis_glob(), "user:*");
        assert_eq!(
            GlobPattern::new("q:[a]?*").to_redis_glob(),
            "q:\\[a\\]\\?*"
        );
        assert_eq!(GlobPattern::new("a\\b*").to_redis_glob(), "a\\\\b*");
    }
}
