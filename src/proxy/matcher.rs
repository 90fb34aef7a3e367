//! Request matching logic.
//!
//! # Responsibilities
//! - Decide whether a request URL belongs to this proxy
//! - Literal prefix test anchored at position 0
//! - Pattern search anywhere in the URL
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - The matched string is path plus query, as the host server sees it
//! - Patterns are compiled once at construction

use std::fmt;

use regex::Regex;

use crate::proxy::error::ConfigError;

/// Predicate deciding whether a request is proxied.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches URLs starting with the given string.
    Prefix(String),
    /// Matches URLs containing a match for the pattern.
    Pattern(Regex),
}

impl Matcher {
    /// Create a literal prefix matcher.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Matcher::Prefix(prefix.into())
    }

    /// Compile a pattern matcher.
    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Matcher::Pattern)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Returns true if the URL satisfies this matcher.
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => url.starts_with(prefix.as_str()),
            Matcher::Pattern(regex) => regex.is_match(url),
        }
    }
}

impl From<&str> for Matcher {
    fn from(prefix: &str) -> Self {
        Matcher::prefix(prefix)
    }
}

impl From<String> for Matcher {
    fn from(prefix: String) -> Self {
        Matcher::Prefix(prefix)
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Matcher::Pattern(regex)
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Prefix(prefix) => write!(f, "prefix:{}", prefix),
            Matcher::Pattern(regex) => write!(f, "pattern:{}", regex.as_str()),
        }
    }
}
