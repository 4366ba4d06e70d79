//! Minimal evaluator for `^`-joined encoded queries
//!
//! Understands the operators the core emits. Unknown clauses match
//! everything so fixtures stay permissive.

use nowguard_client::{field_str, Record};

const OPERATORS: &[&str] = &[
    "ISNOTEMPTY",
    "ISEMPTY",
    "STARTSWITH",
    "LIKE",
    "!=",
    ">=",
    "<=",
    "=",
    "<",
    ">",
];

fn split_clause(clause: &str) -> Option<(&str, &str, &str)> {
    let field_end = clause
        .find(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.'))
        .unwrap_or(clause.len());
    let (field, rest) = clause.split_at(field_end);
    if field.is_empty() {
        return None;
    }
    OPERATORS
        .iter()
        .find(|op| rest.starts_with(**op))
        .map(|op| (field, *op, &rest[op.len()..]))
}

fn clause_matches(record: &Record, clause: &str) -> bool {
    let Some((field, op, value)) = split_clause(clause) else {
        return true;
    };
    let actual = field_str(record, field);
    match op {
        "ISEMPTY" => actual.is_empty(),
        "ISNOTEMPTY" => !actual.is_empty(),
        "STARTSWITH" => actual.starts_with(value),
        "LIKE" => actual.contains(value),
        "!=" => actual != value,
        ">=" => actual.as_str() >= value,
        "<=" => actual.as_str() <= value,
        "=" => actual == value,
        "<" => actual.as_str() < value,
        ">" => actual.as_str() > value,
        _ => true,
    }
}

/// Whether `record` satisfies every clause of `filter`
pub fn matches(record: &Record, filter: &str) -> bool {
    filter
        .split('^')
        .filter(|clause| !clause.is_empty())
        .all(|clause| clause_matches(record, clause))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: serde_json::Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn equality_and_like() {
        let r = rec(json!({"active": "true", "script": "gs.include('x')"}));
        assert!(matches(&r, "active=true^scriptLIKEgs.include("));
        assert!(!matches(&r, "active=false"));
    }

    #[test]
    fn comparison_and_empty() {
        let r = rec(json!({"sys_created_on": "2020-01-01 00:00:00", "window_end": ""}));
        assert!(matches(&r, "sys_created_on<2021-01-01 00:00:00^window_endISEMPTY"));
        assert!(!matches(&r, "sys_created_on>=2021-01-01 00:00:00"));
    }

    #[test]
    fn startswith() {
        let r = rec(json!({"name": "incident.read"}));
        assert!(matches(&r, "nameSTARTSWITHincident"));
        assert!(!matches(&r, "nameSTARTSWITHproblem"));
    }

    #[test]
    fn empty_filter_matches_all() {
        assert!(matches(&rec(json!({})), ""));
    }
}
