//! Sensitive-key filtering for outgoing reports
//!
//! Replaces the values of matching keys with a redaction marker before a
//! payload is serialized. Keys are never removed, so a consumer of the
//! report can still see that a value existed.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Map, Value};

/// Marker substituted for the value of every matched key.
pub const REDACTED: &str = "[FILTERED]";

/// Characters that mark a configuration entry as a regex pattern rather
/// than a literal key name.
const PATTERN_CHARS: &[char] = &[
    '.', '*', '+', '?', '[', ']', '(', ')', '{', '}', '|', '^', '$', '\\',
];

/// A single filter rule, matched against mapping keys.
#[derive(Debug, Clone)]
pub enum FilterRule {
    /// Case-insensitive exact key match.
    Literal(String),
    /// Compiled regular expression, matched anywhere in the key unless
    /// the pattern itself anchors with `^` or `$`.
    Pattern(Regex),
}

impl FilterRule {
    /// Create a literal rule.
    pub fn literal(key: impl Into<String>) -> Self {
        Self::Literal(key.into())
    }

    /// Compile a pattern rule. Fails on malformed regex syntax.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Ok(Self::Pattern(Regex::new(source)?))
    }

    /// Parse a configuration entry into a rule.
    ///
    /// Entries containing regex metacharacters are compiled as patterns;
    /// everything else becomes a literal. Compilation errors are returned
    /// so the configuration resolver can report them once at startup.
    pub fn parse(source: &str) -> Result<Self, regex::Error> {
        if source.contains(PATTERN_CHARS) {
            Self::pattern(source)
        } else {
            Ok(Self::literal(source))
        }
    }

    /// Whether this rule matches the given mapping key.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Literal(name) => name.eq_ignore_ascii_case(key),
            Self::Pattern(regex) => regex.is_match(key),
        }
    }
}

/// An ordered set of filter rules applied to one class of data
/// (parameters, headers and cookies, session, or environment).
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    rules: Vec<FilterRule>,
}

impl FilterSet {
    /// Create a filter set from compiled rules.
    pub fn new(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    /// A set with no rules; `redact` passes data through unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether any rule in the set matches the key.
    pub fn matches(&self, key: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(key))
    }

    /// Redact a JSON object, replacing the values of matched keys with
    /// [`REDACTED`]. Unmatched entries are cloned as-is.
    pub fn redact(&self, data: &Map<String, Value>) -> Map<String, Value> {
        data.iter()
            .map(|(key, value)| {
                if self.matches(key) {
                    (key.clone(), Value::String(REDACTED.to_string()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect()
    }

    /// Redact a plain string map (headers, cookies, environment).
    pub fn redact_strings(&self, data: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        data.iter()
            .map(|(key, value)| {
                if self.matches(key) {
                    (key.clone(), REDACTED.to_string())
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect()
    }
}
