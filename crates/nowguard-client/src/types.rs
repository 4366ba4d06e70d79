//! Request and response types for the remote data client

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single remote record: field name to JSON value
pub type Record = Map<String, Value>;

/// Read a field as a string, rendering non-string scalars
///
/// Missing fields and nulls come back as an empty string, which is how the
/// remote represents unset values.
#[must_use]
pub fn field_str(record: &Record, field: &str) -> String {
    match record.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Options for fetching one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOptions {
    /// Field projection; `None` returns every field
    pub fields: Option<Vec<String>>,
    /// Return display values instead of raw values
    pub display_values: bool,
}

impl GetOptions {
    /// Default options: all fields, raw values
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given fields
    #[inline]
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Ask for display values
    #[inline]
    #[must_use]
    pub fn display_values(mut self) -> Self {
        self.display_values = true;
        self
    }
}

/// A filtered, paginated table query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Table to query
    pub table: String,
    /// Encoded filter expression (may be empty)
    pub filter: String,
    /// Field projection; `None` returns every field
    pub fields: Option<Vec<String>>,
    /// Requested row limit; `None` lets the caller's policy decide
    pub limit: Option<usize>,
    /// Rows to skip
    pub offset: usize,
    /// Sort field
    pub order_by: Option<String>,
}

impl QueryRequest {
    /// Query `table` with `filter`
    #[must_use]
    pub fn new(table: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: filter.into(),
            fields: None,
            limit: None,
            offset: 0,
            order_by: None,
        }
    }

    /// Restrict to the given fields
    #[inline]
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set row limit
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set offset
    #[inline]
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sort by field
    #[inline]
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
    /// Records on this page
    pub records: Vec<Record>,
    /// Total matching rows reported by the remote
    pub total_count: usize,
}

impl QueryPage {
    /// Page whose total equals its record count
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        let total_count = records.len();
        Self {
            records,
            total_count,
        }
    }
}

/// An aggregate/statistics query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRequest {
    /// Table to aggregate
    pub table: String,
    /// Encoded filter expression (may be empty)
    pub filter: String,
    /// Group-by fields
    pub group_by: Vec<String>,
    /// Fields to average
    pub avg_fields: Vec<String>,
    /// Fields to take the minimum of
    pub min_fields: Vec<String>,
    /// Fields to take the maximum of
    pub max_fields: Vec<String>,
    /// Fields to sum
    pub sum_fields: Vec<String>,
    /// Having clause
    pub having: Option<String>,
    /// Sort field
    pub order_by: Option<String>,
}

impl AggregateRequest {
    /// Plain count over `table` matching `filter`
    #[must_use]
    pub fn count(table: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: filter.into(),
            ..Self::default()
        }
    }

    /// Group by a field
    #[inline]
    #[must_use]
    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by.push(field.into());
        self
    }
}

/// Aggregate response payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Raw `stats` object returned by the remote
    pub stats: Map<String, Value>,
    /// Per-group results when grouping was requested
    #[serde(default)]
    pub groups: Vec<Value>,
}

impl AggregateStats {
    /// Stats holding only a count
    #[must_use]
    pub fn with_count(count: u64) -> Self {
        let mut stats = Map::new();
        stats.insert("count".to_string(), Value::String(count.to_string()));
        Self {
            stats,
            groups: Vec::new(),
        }
    }

    /// Record count; the remote reports it as a string, some proxies as a number
    #[must_use]
    pub fn count(&self) -> u64 {
        match self.stats.get("count") {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}
