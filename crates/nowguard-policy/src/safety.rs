//! Query safety: row caps and date-bounded filters on large tables

use crate::access::check_table_access;
use crate::error::PolicyError;
use std::collections::HashSet;

/// Field names whose presence marks a filter as date-bounded
pub const DATE_FIELDS: &[&str] = &[
    "sys_created_on",
    "sys_updated_on",
    "opened_at",
    "closed_at",
    "sys_recorded_at",
];

/// Per-request query safety policy, derived from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySafetyPolicy {
    /// Global row cap
    pub max_row_limit: usize,
    /// High-volume tables
    pub large_table_names: HashSet<String>,
    /// Date field names recognized in filters
    pub date_fields: &'static [&'static str],
}

impl QuerySafetyPolicy {
    /// Policy with the given cap and large tables, using [`DATE_FIELDS`]
    #[must_use]
    pub fn new<I, S>(max_row_limit: usize, large_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            max_row_limit,
            large_table_names: large_tables.into_iter().map(Into::into).collect(),
            date_fields: DATE_FIELDS,
        }
    }

    /// Whether `table` is high-volume
    #[inline]
    #[must_use]
    pub fn is_large_table(&self, table: &str) -> bool {
        self.large_table_names.contains(table)
    }

    /// Substring test for any configured date field
    ///
    /// Not a parse of the filter grammar: a date field name anywhere in the
    /// string counts.
    #[must_use]
    pub fn has_date_filter(&self, filter: &str) -> bool {
        self.date_fields.iter().any(|field| filter.contains(field))
    }

    /// Effective limit: the request if within the cap, else the cap
    #[inline]
    #[must_use]
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(limit) if limit <= self.max_row_limit => limit,
            _ => self.max_row_limit,
        }
    }
}

/// Outcome of a successful safety check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeQuery {
    /// Limit to send to the remote
    pub effective_limit: usize,
    /// Whether the caller's explicit limit was lowered
    pub capped: bool,
}

/// Validate a query against access and safety rules
///
/// 1. deny-list check
/// 2. limit capping (never raises a requested limit)
/// 3. large tables need a date field somewhere in the filter
///
/// # Errors
/// - `PolicyError::AccessDenied` if the table is deny-listed
/// - `PolicyError::QuerySafetyViolation` if a large table lacks a date filter
pub fn enforce_query_safety(
    table: &str,
    filter: &str,
    requested_limit: Option<usize>,
    policy: &QuerySafetyPolicy,
) -> Result<SafeQuery, PolicyError> {
    check_table_access(table)?;

    let effective_limit = policy.effective_limit(requested_limit);
    let capped = requested_limit.is_some_and(|limit| limit > effective_limit);

    if policy.is_large_table(table) && !policy.has_date_filter(filter) {
        return Err(PolicyError::QuerySafetyViolation {
            table: table.to_string(),
        });
    }

    Ok(SafeQuery {
        effective_limit,
        capped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> QuerySafetyPolicy {
        QuerySafetyPolicy::new(100, ["syslog", "sys_audit"])
    }

    #[test]
    fn caps_limit() {
        let out = enforce_query_safety("incident", "", Some(500), &policy()).unwrap();
        assert_eq!(out.effective_limit, 100);
        assert!(out.capped);
    }

    #[test]
    fn keeps_smaller_limit() {
        let out = enforce_query_safety("incident", "", Some(10), &policy()).unwrap();
        assert_eq!(out.effective_limit, 10);
        assert!(!out.capped);
    }

    #[test]
    fn missing_limit_uses_max() {
        let out = enforce_query_safety("incident", "", None, &policy()).unwrap();
        assert_eq!(out.effective_limit, 100);
        assert!(!out.capped);
    }

    #[test]
    fn large_table_requires_date_field() {
        let err = enforce_query_safety("syslog", "level=0", Some(10), &policy()).unwrap_err();
        assert!(matches!(err, PolicyError::QuerySafetyViolation { .. }));

        let ok = enforce_query_safety(
            "syslog",
            "level=0^sys_created_on>=2026-01-01",
            Some(10),
            &policy(),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn deny_list_checked_first() {
        let err = enforce_query_safety("sys_user_token", "", Some(1), &policy()).unwrap_err();
        assert!(matches!(err, PolicyError::AccessDenied { .. }));
    }

    #[test]
    fn date_field_match_is_substring() {
        // Known limitation: the name anywhere in the filter satisfies the check.
        let ok = enforce_query_safety(
            "syslog",
            "messageLIKEopened_at",
            None,
            &policy(),
        );
        assert!(ok.is_ok());
    }
}
