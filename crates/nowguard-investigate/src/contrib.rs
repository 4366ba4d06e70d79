//! Helpers shared by the investigation modules

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use nowguard_client::{
    field_str, ClientResult, GetOptions, QueryRequest, Record, RemoteDataClient,
};
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{InvestigationError, Result};

/// Timestamp format used by the remote in filters and records
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Keep a contributor's value, or log and drop it
pub(crate) fn optional<T>(contributor: &str, result: ClientResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(contributor, error = %err, "optional contributor skipped");
            None
        }
    }
}

/// Run a query whose failure only removes this contributor
pub(crate) async fn optional_records(
    client: &dyn RemoteDataClient,
    contributor: &str,
    request: QueryRequest,
) -> Option<Vec<Record>> {
    optional(contributor, client.query_records(&request).await).map(|page| page.records)
}

/// Fetch the record an element id points at
pub(crate) async fn fetch(client: &dyn RemoteDataClient, table: &str, id: &str) -> Result<Record> {
    Ok(client.get_record(table, id, &GetOptions::new()).await?)
}

/// `now` minus `amount` units
pub(crate) fn cutoff(
    now: DateTime<Utc>,
    amount: u64,
    unit: fn(i64) -> Option<chrono::Duration>,
    param: &str,
) -> Result<DateTime<Utc>> {
    i64::try_from(amount)
        .ok()
        .and_then(unit)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| {
            InvestigationError::InvalidInput(format!("parameter '{param}' is out of range"))
        })
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Whether the record's `field` is older than `cutoff`
///
/// Unparseable or missing timestamps count as old; the remote filter
/// already selected them.
pub(crate) fn older_than(record: &Record, field: &str, cutoff: DateTime<Utc>) -> bool {
    parse_timestamp(&field_str(record, field)).map_or(true, |ts| ts < cutoff)
}

/// Order timestamp values numerically when both are numbers, else as text
pub(crate) fn cmp_timestamps(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => text(a).cmp(&text(b)),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `"<table>:<sys_id>"`
pub(crate) fn element_of(table: &str, record: &Record) -> String {
    format!("{table}:{}", field_str(record, "sys_id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cutoff_formats_like_the_remote() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let ts = cutoff(now, 30, chrono::Duration::try_days, "stale_days").unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-01 12:00:00");
        assert_eq!(parse_timestamp("2024-03-01 12:00:00"), Some(ts));
        assert!(cutoff(now, u64::MAX, chrono::Duration::try_days, "stale_days").is_err());
    }

    #[test]
    fn age_check() {
        let cut = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let old = json!({"ts": "2023-06-01 00:00:00"}).as_object().cloned().unwrap();
        let new = json!({"ts": "2024-06-01 00:00:00"}).as_object().cloned().unwrap();
        let junk = json!({"ts": "yesterday"}).as_object().cloned().unwrap();
        assert!(older_than(&old, "ts", cut));
        assert!(!older_than(&new, "ts", cut));
        assert!(older_than(&junk, "ts", cut));
    }

    #[test]
    fn timestamps_compare_numerically_when_possible() {
        assert_eq!(cmp_timestamps(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(cmp_timestamps(&json!("2"), &json!("10")), Ordering::Greater);
        assert_eq!(
            cmp_timestamps(&json!("2024-01-02 00:00:00"), &json!("2024-01-01 00:00:00")),
            Ordering::Greater
        );
    }
}
