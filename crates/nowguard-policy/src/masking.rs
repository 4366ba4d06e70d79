//! Sensitive field masking
//!
//! Matching is on field names only and ignores the table.

use once_cell::sync::Lazy;
use regex::{RegexSet, RegexSetBuilder};
use serde_json::{Map, Value};

/// Sentinel written over sensitive values
pub const MASK_VALUE: &str = "***MASKED***";

/// Case-insensitive field-name patterns, in evaluation order
pub const SENSITIVE_FIELD_PATTERNS: &[&str] = &[
    "password",
    "token",
    "secret",
    "credential",
    "api_key",
    "private_key",
];

static SENSITIVE: Lazy<RegexSet> = Lazy::new(|| {
    RegexSetBuilder::new(SENSITIVE_FIELD_PATTERNS)
        .case_insensitive(true)
        .build()
        .expect("sensitive field patterns are valid regexes")
});

/// Whether a field name matches any sensitivity pattern
#[inline]
#[must_use]
pub fn is_sensitive_field(field_name: &str) -> bool {
    SENSITIVE.is_match(field_name)
}

/// Copy of `record` with every sensitive field replaced by [`MASK_VALUE`]
///
/// The sentinel replaces the value whatever its JSON type. The input is
/// never modified.
#[must_use]
pub fn mask_sensitive_fields(record: &Map<String, Value>) -> Map<String, Value> {
    record
        .iter()
        .map(|(key, value)| {
            if is_sensitive_field(key) {
                (key.clone(), Value::String(MASK_VALUE.to_string()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn masks_matching_fields() {
        let original = record(json!({
            "name": "svc",
            "user_password": "hunter2",
            "API_KEY": "abc",
            "refresh_token": "xyz",
        }));
        let masked = mask_sensitive_fields(&original);
        assert_eq!(masked["name"], json!("svc"));
        assert_eq!(masked["user_password"], json!(MASK_VALUE));
        assert_eq!(masked["API_KEY"], json!(MASK_VALUE));
        assert_eq!(masked["refresh_token"], json!(MASK_VALUE));
    }

    #[test]
    fn non_string_values_are_replaced() {
        let original = record(json!({"secret_count": 3, "credential": {"nested": true}}));
        let masked = mask_sensitive_fields(&original);
        assert_eq!(masked["secret_count"], json!(MASK_VALUE));
        assert_eq!(masked["credential"], json!(MASK_VALUE));
    }

    #[test]
    fn original_is_untouched() {
        let original = record(json!({"password": "p", "number": "INC001"}));
        let before = original.clone();
        let _ = mask_sensitive_fields(&original);
        assert_eq!(original, before);
    }

    #[test]
    fn field_order_is_preserved() {
        let original = record(json!({"a": 1, "private_key": 2, "b": 3}));
        let keys: Vec<_> = mask_sensitive_fields(&original).keys().cloned().collect();
        let expected: Vec<_> = original.keys().cloned().collect();
        assert_eq!(keys, expected);
    }
}
