//! Path patterns.
//!
//! Patterns are `/`-separated and anchored at both ends:
//!
//! - `kv/internal/bad` matches exactly that path.
//! - `kv/*/config` matches one arbitrary segment in the middle.
//! - `kv/data/*` matches `kv/data` and anything below it.
//! - `kv/data/foo*` matches any path under `kv/data/` whose next segment
//!   starts with `foo`.
//! - `*` matches every non-empty path.
//!
//! One leading `/` is ignored on both sides. A trailing `/` is significant.
//! Patterns never fail to compile: an empty pattern, or one with a `..`
//! segment, simply matches nothing. Paths with a `..` segment never match.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

const WILDCARD: &str = "*";
const PARENT: &str = "..";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tail {
    /// Path must end exactly after the head.
    End,
    /// Zero or more further segments.
    Rest,
    /// At least one further segment, the first starting with this text.
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    Never,
    Exact(String),
    Glob { head: Vec<Segment>, tail: Tail },
}

/// How specific a pattern is. Larger values win.
///
/// Ordered by: exact patterns first, then more literal segments, then fewer
/// wildcards, then a longer literal prefix on a trailing `foo*` segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Specificity {
    exact: bool,
    literal_segments: usize,
    wildcards: usize,
    suffix_prefix_len: usize,
}

impl Specificity {
    /// Whether the pattern contains no wildcard at all.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.exact
    }

    /// Number of literal segments.
    #[must_use]
    pub const fn literal_segments(&self) -> usize {
        self.literal_segments
    }

    /// Number of wildcard positions (`*` segments and a trailing `foo*`).
    #[must_use]
    pub const fn wildcards(&self) -> usize {
        self.wildcards
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.exact
            .cmp(&other.exact)
            .then(self.literal_segments.cmp(&other.literal_segments))
            .then(other.wildcards.cmp(&self.wildcards))
            .then(self.suffix_prefix_len.cmp(&other.suffix_prefix_len))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    text: String,
    matcher: Matcher,
    specificity: Specificity,
}

impl PathPattern {
    /// Compile a pattern.
    ///
    /// # Example
    ///
    /// ```
    /// use vigil_policy::PathPattern;
    ///
    /// let pattern = PathPattern::new("kv/data/*");
    /// assert!(pattern.matches("kv/data/foo"));
    /// assert!(pattern.matches("/kv/data/foo/bar"));
    /// assert!(!pattern.matches("kv/metadata/foo"));
    /// ```
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let (matcher, specificity) = compile(&text);
        Self {
            text,
            matcher,
            specificity,
        }
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether this pattern can match anything at all.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.matcher != Matcher::Never
    }

    /// Whether the pattern contains no wildcard.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.specificity.exact
    }

    /// Ranking used for longest-most-specific precedence.
    #[must_use]
    pub const fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Test a request path against this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let Some(path) = normalize_path(path) else {
            return false;
        };

        match &self.matcher {
            Matcher::Never => false,
            Matcher::Exact(text) => text == path,
            Matcher::Glob { head, tail } => {
                let segments: Vec<&str> = path.split('/').collect();
                if segments.len() < head.len() {
                    return false;
                }
                let (front, rest) = segments.split_at(head.len());

                let head_ok = head.iter().zip(front).all(|(want, got)| match want {
                    Segment::Literal(lit) => lit == got,
                    Segment::Any => !got.is_empty(),
                });
                if !head_ok {
                    return false;
                }

                match tail {
                    Tail::End => rest.is_empty(),
                    Tail::Rest => true,
                    Tail::Prefix(prefix) => rest
                        .first()
                        .is_some_and(|first| first.starts_with(prefix.as_str())),
                }
            },
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for PathPattern {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for PathPattern {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl Serialize for PathPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Test `path` against `pattern` without keeping the compiled form.
#[must_use]
pub fn matches(pattern: &str, path: &str) -> bool {
    PathPattern::new(pattern).matches(path)
}

/// Specificity of `pattern`.
#[must_use]
pub fn specificity(pattern: &str) -> Specificity {
    PathPattern::new(pattern).specificity()
}

fn normalize_path(path: &str) -> Option<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() || path.split('/').any(|seg| seg == PARENT) {
        return None;
    }
    Some(path)
}

fn compile(text: &str) -> (Matcher, Specificity) {
    let Some(body) = normalize_path(text) else {
        return (Matcher::Never, Specificity::default());
    };

    let mut segments: Vec<&str> = body.split('/').collect();
    let last = segments.pop().unwrap_or_default();

    let tail = if last == WILDCARD {
        Tail::Rest
    } else if let Some(prefix) = last.strip_suffix('*') {
        Tail::Prefix(prefix.to_string())
    } else {
        segments.push(last);
        Tail::End
    };

    let head: Vec<Segment> = segments
        .into_iter()
        .map(|seg| {
            if seg == WILDCARD {
                Segment::Any
            } else {
                Segment::Literal(seg.to_string())
            }
        })
        .collect();

    let any_segments = head.iter().filter(|s| **s == Segment::Any).count();
    let literal_segments = head.len().saturating_sub(any_segments);

    if any_segments == 0 && tail == Tail::End {
        let specificity = Specificity {
            exact: true,
            literal_segments,
            wildcards: 0,
            suffix_prefix_len: 0,
        };
        return (Matcher::Exact(body.to_string()), specificity);
    }

    let (tail_wildcards, suffix_prefix_len) = match &tail {
        Tail::End => (0, 0),
        Tail::Rest => (1, 0),
        Tail::Prefix(prefix) => (1, prefix.len()),
    };

    let specificity = Specificity {
        exact: false,
        literal_segments,
        wildcards: any_segments.saturating_add(tail_wildcards),
        suffix_prefix_len,
    };
    (Matcher::Glob { head, tail }, specificity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let p = PathPattern::new("kv/internal/bad");
        assert!(p.is_exact());
        assert!(p.matches("kv/internal/bad"));
        assert!(p.matches("/kv/internal/bad"));
        assert!(!p.matches("kv/internal/bad/x"));
        assert!(!p.matches("kv/internal"));
        assert!(!p.matches("KV/internal/bad"));
    }

    #[test]
    fn test_leading_slash_ignored_on_pattern() {
        let p = PathPattern::new("/auth/token/lookup-self");
        assert!(p.matches("auth/token/lookup-self"));
        assert!(p.matches("/auth/token/lookup-self"));
    }

    #[test]
    fn test_trailing_slash_significant() {
        let p = PathPattern::new("/transit/");
        assert!(p.matches("transit/"));
        assert!(!p.matches("transit"));
        assert!(!p.matches("transit/keys"));
    }

    #[test]
    fn test_trailing_wildcard_matches_prefix() {
        let p = PathPattern::new("kv/data/*");
        assert!(p.matches("kv/data/foo"));
        assert!(p.matches("kv/data/foo/bar/baz"));
        assert!(p.matches("kv/data"));
        assert!(!p.matches("kv/dat"));
        assert!(!p.matches("kv/metadata/foo"));
    }

    #[test]
    fn test_inner_wildcard_matches_one_segment() {
        let p = PathPattern::new("kv/*/config");
        assert!(p.matches("kv/app/config"));
        assert!(!p.matches("kv/config"));
        assert!(!p.matches("kv/a/b/config"));
        assert!(!p.matches("kv//config"));
    }

    #[test]
    fn test_suffix_wildcard() {
        let p = PathPattern::new("kv/data/foo*");
        assert!(p.matches("kv/data/foo"));
        assert!(p.matches("kv/data/foobar"));
        assert!(p.matches("kv/data/foobar/nested"));
        assert!(!p.matches("kv/data/fo"));
        assert!(!p.matches("kv/data"));
    }

    #[test]
    fn test_bare_wildcard_matches_everything_non_empty() {
        let p = PathPattern::new("*");
        assert!(p.matches("kv"));
        assert!(p.matches("sys/tools/random"));
        assert!(!p.matches(""));
        assert!(!p.matches("/"));
    }

    #[test]
    fn test_degenerate_patterns_match_nothing() {
        for text in ["", "/", "kv/../sys", ".."] {
            let p = PathPattern::new(text);
            assert!(!p.is_valid(), "{text:?} should compile to never");
            assert!(!p.matches("kv"));
            assert!(!p.matches("sys"));
        }
    }

    #[test]
    fn test_traversal_paths_never_match() {
        assert!(!matches("*", "kv/../sys/raw"));
        assert!(!matches("kv/*", "kv/../../etc"));
    }

    #[test]
    fn test_literal_outranks_wildcard() {
        assert!(specificity("kv/data/foo") > specificity("kv/data/*"));
        assert!(specificity("a") > specificity("a/b/c/d/*"));
        assert!(specificity("kv/data/*") > specificity("kv/*"));
        assert!(specificity("kv/*") > specificity("*"));
    }

    #[test]
    fn test_specificity_orders_wildcards() {
        // same literal count, fewer wildcards wins
        assert!(specificity("kv/data/*") > specificity("kv/data/*/*"));
        // longer suffix prefix wins
        assert!(specificity("kv/data/foo*") > specificity("kv/data/*"));
        assert!(specificity("kv/data/foob*") > specificity("kv/data/foo*"));
    }

    #[test]
    fn test_specificity_ties() {
        assert_eq!(specificity("kv/*"), specificity("sys/*"));
        assert_eq!(specificity("/kv/*"), specificity("kv/*"));
    }

    #[test]
    fn test_serde_as_string() {
        let p: PathPattern = serde_json::from_str(r#""kv/data/*""#).unwrap();
        assert!(p.matches("kv/data/x"));
        assert_eq!(serde_json::to_string(&p).unwrap(), r#""kv/data/*""#);
    }
}
