//! Wildcard pattern language for ACL rules
//!
//! A pattern is one of:
//! 1. Exact literal: `"doc1"` matches only `"doc1"`
//! 2. Universal wildcard: `"*"` matches any value, including the empty string
//! 3. Prefix wildcard: `"doc*"` matches every value starting with `"doc"`
//!
//! Matching is plain string comparison; patterns are never compiled to regexes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Wildcard character
pub const WILDCARD: char = '*';

/// Pattern syntax errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty or blank")]
    Empty,

    #[error("pattern contains a control character at byte {position}")]
    ControlCharacter { position: usize },

    #[error("pattern may contain at most one '*', and only as its last character")]
    MisplacedWildcard,
}

/// Validate pattern syntax
pub fn validate(pattern: &str) -> Result<(), PatternError> {
    if pattern.trim().is_empty() {
        return Err(PatternError::Empty);
    }

    if let Some((position, _)) = pattern.char_indices().find(|(_, c)| is_control(*c)) {
        return Err(PatternError::ControlCharacter { position });
    }

    match pattern.find(WILDCARD) {
        None => Ok(()),
        Some(index) if index == pattern.len() - 1 => Ok(()),
        Some(_) => Err(PatternError::MisplacedWildcard),
    }
}

/// Code points below 32 and DEL
fn is_control(c: char) -> bool {
    (c as u32) < 32 || c as u32 == 127
}

/// Check if `value` matches `pattern`
///
/// Patterns without a trailing `*` match by equality only.
///
/// ```rust
/// use simplesync_authz::pattern::matches_pattern;
///
/// assert!(matches_pattern("doc1", "doc1"));
/// assert!(matches_pattern("*", ""));
/// assert!(matches_pattern("doc*", "doc42"));
/// assert!(!matches_pattern("doc*", "do"));
/// ```
pub fn matches_pattern(pattern: &str, value: &str) -> bool {
    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => value.starts_with(prefix),
        None => pattern == value,
    }
}

/// Specificity score: the pattern length, minus 0.5 for a trailing wildcard
///
/// Higher scores rank first. The half-point penalty puts `"ab*"` (2.5)
/// between `"ab"` (2.0) and `"abc"` (3.0).
pub fn specificity(pattern: &str) -> f64 {
    let score = pattern.len() as f64;
    if pattern.ends_with(WILDCARD) {
        score - 0.5
    } else {
        score
    }
}

/// A validated pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern(String);

impl Pattern {
    /// Parse and validate a pattern
    pub fn parse(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        validate(&pattern)?;
        Ok(Self(pattern))
    }

    /// The `*` pattern
    pub fn any() -> Self {
        Self(WILDCARD.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.ends_with(WILDCARD)
    }

    pub fn matches(&self, value: &str) -> bool {
        matches_pattern(&self.0, value)
    }

    pub fn specificity(&self) -> f64 {
        specificity(&self.0)
    }
}

impl TryFrom<String> for Pattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.0
    }
}

impl AsRef<str> for Pattern {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_pattern("doc1", "doc1"));
        assert!(!matches_pattern("doc1", "doc2"));
        assert!(!matches_pattern("doc1", "doc10"));
    }

    #[test]
    fn test_universal_wildcard() {
        assert!(matches_pattern("*", "anything"));
        assert!(matches_pattern("*", ""));
        assert!(matches_pattern("*", ".acl"));
    }

    #[test]
    fn test_prefix_wildcard() {
        assert!(matches_pattern("u*", "u1"));
        assert!(matches_pattern("u*", "u"));
        assert!(matches_pattern("user.*", "user.alice"));
        assert!(!matches_pattern("user.*", "user"));
        assert!(!matches_pattern("u*", "admin"));
    }

    #[test]
    fn test_no_regex_semantics() {
        assert!(!matches_pattern("d.c", "doc"));
        assert!(matches_pattern("d.c", "d.c"));
        assert!(!matches_pattern("[a]*", "a"));
        assert!(matches_pattern("[a]*", "[a]x"));
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(!matches_pattern("Doc1", "doc1"));
        assert!(!matches_pattern("DOC*", "doc1"));
    }

    #[test]
    fn test_validation() {
        assert_eq!(validate(""), Err(PatternError::Empty));
        assert_eq!(validate("   "), Err(PatternError::Empty));
        assert_eq!(validate(" \u{a0}"), Err(PatternError::Empty));
        assert!(validate(" doc").is_ok());
        assert_eq!(validate("a*b*"), Err(PatternError::MisplacedWildcard));
        assert_eq!(validate("*a"), Err(PatternError::MisplacedWildcard));
        assert_eq!(validate("**"), Err(PatternError::MisplacedWildcard));
        assert_eq!(validate("a\nb"), Err(PatternError::ControlCharacter { position: 1 }));
        assert_eq!(validate("ab\u{7f}"), Err(PatternError::ControlCharacter { position: 2 }));

        assert!(validate("*").is_ok());
        assert!(validate("doc*").is_ok());
        assert!(validate("doc 1").is_ok());
        assert!(validate("dokument-ä").is_ok());
    }

    #[test]
    fn test_specificity_values() {
        assert_eq!(specificity("*"), 0.5);
        assert_eq!(specificity("a"), 1.0);
        assert_eq!(specificity("ab*"), 2.5);
        assert_eq!(specificity("doc1"), 4.0);
    }

    #[test]
    fn test_pattern_serde_validates() {
        let pattern: Pattern = serde_json::from_str(r#""doc*""#).unwrap();
        assert!(pattern.is_wildcard());
        assert_eq!(serde_json::to_string(&pattern).unwrap(), r#""doc*""#);

        assert!(serde_json::from_str::<Pattern>(r#""a*b*""#).is_err());
    }

    proptest! {
        #[test]
        fn prop_literal_matches_iff_equal(p in "[a-z0-9.]{1,8}", v in "[a-z0-9.]{0,8}") {
            prop_assert_eq!(matches_pattern(&p, &v), p == v);
            prop_assert!(matches_pattern(&p, &p));
        }

        #[test]
        fn prop_prefix_matches_extensions(prefix in "[a-z]{0,6}", rest in "[a-z]{0,6}") {
            let pattern = format!("{prefix}*");
            let value = format!("{prefix}{rest}");
            prop_assert!(matches_pattern(&pattern, &value));
        }

        #[test]
        fn prop_specificity_tracks_length(p in "[a-z]{1,16}") {
            let wild = format!("{p}*");
            prop_assert_eq!(specificity(&p), p.len() as f64);
            prop_assert_eq!(specificity(&wild), specificity(&p) + 0.5);
            let longer = format!("{p}x");
            prop_assert!(specificity(&longer) > specificity(&p));
        }
    }
}
