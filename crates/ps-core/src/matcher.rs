//! Value matchers
//!
//! A [`ValueMatcher`] answers "does this string satisfy me". Rules use one to
//! pick query pairs and, for host-scoped rules, a second one to gate on the URL.

use std::fmt;
use std::hash::{Hash, Hasher};

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

// Patterns come from remote lists; keep the compiled program bounded.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;
const PATTERN_DFA_SIZE_LIMIT: usize = 1 << 21;

/// Predicate over a string.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    /// Case-sensitive substring containment.
    Literal(String),
    /// Exact equality with the part of the input before its first `=`.
    Token(String),
    /// Case-insensitive regular expression, matched anywhere in the input.
    Pattern(Regex),
}

impl ValueMatcher {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn token(text: impl Into<String>) -> Self {
        Self::Token(text.into())
    }

    /// Compile `pattern` (without the surrounding slashes).
    pub fn pattern(pattern: &str) -> Result<Self> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(PATTERN_SIZE_LIMIT)
            .dfa_size_limit(PATTERN_DFA_SIZE_LIMIT)
            .build()
            .map(Self::Pattern)
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    #[inline]
    pub fn is_match(&self, input: &str) -> bool {
        match self {
            Self::Literal(text) => input.contains(text.as_str()),
            Self::Token(text) => query_key(input) == text,
            Self::Pattern(regex) => regex.is_match(input),
        }
    }

    /// The source text this matcher was built from.
    pub fn source(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Token(text) => text.as_str(),
            Self::Pattern(regex) => regex.as_str(),
        }
    }

    fn kind(&self) -> u8 {
        match self {
            Self::Literal(_) => 0,
            Self::Token(_) => 1,
            Self::Pattern(_) => 2,
        }
    }
}

/// The key half of a `key=value` pair (the whole input if there is no `=`).
#[inline]
pub fn query_key(pair: &str) -> &str {
    match pair.find('=') {
        Some(pos) => &pair[..pos],
        None => pair,
    }
}

impl fmt::Display for ValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) | Self::Token(text) => write!(f, "\"{text}\""),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl PartialEq for ValueMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.source() == other.source()
    }
}

impl Eq for ValueMatcher {}

impl Hash for ValueMatcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.source().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_is_substring_and_case_sensitive() {
        let m = ValueMatcher::literal("amazon.com");
        assert!(m.is_match("https://www.amazon.com/dp/B0?tag=x"));
        assert!(!m.is_match("https://www.AMAZON.com/dp/B0"));
        assert!(!m.is_match("https://ebay.com"));
    }

    #[test]
    fn test_token_compares_key_only() {
        let m = ValueMatcher::token("si");
        assert!(m.is_match("si=ABCDEF"));
        assert!(m.is_match("si"));
        assert!(m.is_match("si=a=b"));
        assert!(!m.is_match("silly=this_is_fake"));
        assert!(!m.is_match("xsi=1"));
        assert!(!m.is_match(""));
    }

    #[test]
    fn test_token_empty_matches_empty_key() {
        let m = ValueMatcher::token("");
        assert!(m.is_match("=value"));
        assert!(!m.is_match("k=value"));
    }

    #[test]
    fn test_pattern_is_case_insensitive_and_unanchored() {
        let m = ValueMatcher::pattern("^abtest").unwrap();
        assert!(m.is_match("abtest=123"));
        assert!(m.is_match("ABTEST=123"));
        assert!(!m.is_match("notabtest=123"));

        let m = ValueMatcher::pattern("c[a-z]*").unwrap();
        assert!(m.is_match("xyz=abc"));
    }

    #[test]
    fn test_invalid_pattern_rejected_at_construction() {
        let err = ValueMatcher::pattern("utm_(source").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "utm_(source"));
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(ValueMatcher::literal("amazon.com").to_string(), "\"amazon.com\"");
        assert_eq!(ValueMatcher::token("c").to_string(), "\"c\"");
        assert_eq!(ValueMatcher::pattern(r"amazon\..*?").unwrap().to_string(), r"/amazon\..*?/");
    }

    #[test]
    fn test_equality_uses_variant_and_text() {
        assert_eq!(ValueMatcher::token("c"), ValueMatcher::token("c"));
        assert_eq!(ValueMatcher::pattern("a+").unwrap(), ValueMatcher::pattern("a+").unwrap());
        assert_ne!(ValueMatcher::token("c"), ValueMatcher::literal("c"));
        assert_ne!(ValueMatcher::token("c"), ValueMatcher::token("d"));
    }

    #[test]
    fn test_query_key() {
        assert_eq!(query_key("a=1"), "a");
        assert_eq!(query_key("a"), "a");
        assert_eq!(query_key("=1"), "");
        assert_eq!(query_key("a=1=2"), "a");
    }
}
