//! Encoded query builder
//!
//! The remote's filter language joins conditions with `^`. This is a
//! string builder, not a parser.

use std::fmt;

/// Builder for `^`-joined encoded query strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedQuery {
    clauses: Vec<String>,
}

impl EncodedQuery {
    /// Empty query (matches everything)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field=value` clause
    #[must_use]
    pub fn and(mut self, field: &str, value: impl fmt::Display) -> Self {
        self.clauses.push(format!("{field}={value}"));
        self
    }

    /// Add a clause verbatim (operators such as `LIKE`, `<`, `STARTSWITH`)
    ///
    /// Empty clauses are ignored.
    #[must_use]
    pub fn and_raw(mut self, clause: impl Into<String>) -> Self {
        let clause = clause.into();
        if !clause.is_empty() {
            self.clauses.push(clause);
        }
        self
    }

    /// Add a `fieldISEMPTY` clause
    #[must_use]
    pub fn is_empty(self, field: &str) -> Self {
        self.and_raw(format!("{field}ISEMPTY"))
    }

    /// Whether no clauses were added
    #[inline]
    #[must_use]
    pub fn has_clauses(&self) -> bool {
        !self.clauses.is_empty()
    }

    /// Render into the wire form
    #[must_use]
    pub fn build(&self) -> String {
        self.clauses.join("^")
    }
}

impl fmt::Display for EncodedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

impl From<EncodedQuery> for String {
    fn from(query: EncodedQuery) -> Self {
        query.build()
    }
}
