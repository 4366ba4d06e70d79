//! Error-level syslog entries clustered by source

use crate::contrib::{cmp_timestamps, cutoff, fetch, format_timestamp, optional};
use crate::element::ElementId;
use crate::error::Result;
use crate::params::InvestigationParams;
use crate::registry::{Investigation, InvestigationKind};
use crate::result::{ExplanationResult, Finding, InvestigationResult};
use chrono::Utc;
use indexmap::IndexMap;
use nowguard_client::{
    field_str, AggregateRequest, EncodedQuery, QueryRequest, Record, RemoteDataClient,
};
use serde_json::{json, Value};

const SYSLOG: &str = "syslog";
const TIMESTAMP_FIELD: &str = "sys_created_on";
const SAMPLE_MESSAGES: usize = 3;

/// Clusters recent syslog errors by `source`
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClustering;

/// One finding per source, most frequent first
///
/// Ties keep the order in which sources first appear. Entries without a
/// source are grouped under `unknown`.
#[must_use]
pub fn cluster_errors(entries: &[Record]) -> Vec<Finding> {
    let mut clusters: IndexMap<String, Vec<&Record>> = IndexMap::new();
    for entry in entries {
        let source = match field_str(entry, "source") {
            s if s.is_empty() => "unknown".to_string(),
            s => s,
        };
        clusters.entry(source).or_default().push(entry);
    }

    let mut clusters: Vec<_> = clusters.into_iter().collect();
    clusters.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    clusters
        .into_iter()
        .map(|(source, members)| {
            let timestamps: Vec<Value> = members
                .iter()
                .map(|e| {
                    e.get(TIMESTAMP_FIELD)
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()))
                })
                .collect();
            let first_seen = timestamps.iter().min_by(|a, b| cmp_timestamps(a, b)).cloned();
            let last_seen = timestamps.iter().max_by(|a, b| cmp_timestamps(a, b)).cloned();
            let samples: Vec<String> = members
                .iter()
                .take(SAMPLE_MESSAGES)
                .map(|e| field_str(e, "message"))
                .collect();

            Finding::new(
                "error_cluster",
                format!("{SYSLOG}:{}", field_str(members[0], "sys_id")),
                format!("{} errors from source '{source}'", members.len()),
            )
            .with_field("source", source)
            .with_field("frequency", members.len())
            .with_field("first_seen", first_seen.unwrap_or(Value::Null))
            .with_field("last_seen", last_seen.unwrap_or(Value::Null))
            .with_field("sample_messages", samples)
        })
        .collect()
}

#[async_trait::async_trait]
impl Investigation for ErrorClustering {
    fn kind(&self) -> InvestigationKind {
        InvestigationKind::ErrorAnalysis
    }

    async fn run(
        &self,
        client: &dyn RemoteDataClient,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult> {
        let hours = params.u64_or("hours", 24)?;
        let limit = params.usize_or("limit", 100)?;
        let source = params.str("source");
        let since = format_timestamp(cutoff(Utc::now(), hours, chrono::Duration::try_hours, "hours")?);

        let mut filter = EncodedQuery::new().and("level", 0);
        if let Some(source) = source {
            filter = filter.and_raw(format!("sourceLIKE{source}"));
        }
        let filter = filter.and_raw(format!("{TIMESTAMP_FIELD}>={since}"));

        let page = client
            .query_records(
                &QueryRequest::new(SYSLOG, filter)
                    .with_fields(["sys_id", "message", "source", "level", TIMESTAMP_FIELD])
                    .with_limit(limit)
                    .order_by(TIMESTAMP_FIELD),
            )
            .await?;

        let findings = cluster_errors(&page.records);
        Ok(InvestigationResult::new(self.kind(), findings)
            .with_summary(
                "params",
                json!({"hours": hours, "source": source, "limit": limit}),
            )
            .with_summary("since", since)
            .with_summary("total_errors", page.records.len()))
    }

    async fn explain(
        &self,
        client: &dyn RemoteDataClient,
        element_id: &str,
    ) -> Result<ExplanationResult> {
        let (table, id) = ElementId::parse_record(element_id)?;
        let record = fetch(client, &table, &id).await?;
        let source = field_str(&record, "source");

        let occurrences = if source.is_empty() {
            None
        } else {
            let filter = EncodedQuery::new().and("level", 0).and("source", &source);
            optional(
                "source_error_count",
                client.aggregate(&AggregateRequest::count(&table, filter)).await,
            )
            .map(|stats| stats.count())
        };

        let mut parts = vec![
            format!("Syslog error from source '{source}'."),
            format!("Message: {}", field_str(&record, "message")),
            format!("Logged at: {}.", field_str(&record, TIMESTAMP_FIELD)),
        ];
        if let Some(count) = occurrences {
            parts.push(format!("This source has logged {count} errors in total."));
        }
        parts.push("Check the source script or process for the root cause of this error.".into());

        let mut result = ExplanationResult::new(element_id, &parts).with_context("record", record);
        if let Some(count) = occurrences {
            result = result.with_context("source_error_count", count);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, source: &str, ts: Value, message: &str) -> Record {
        json!({"sys_id": id, "source": source, "sys_created_on": ts, "message": message})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn clusters_by_frequency() {
        let findings = cluster_errors(&[
            entry("1", "A", json!(1), "m1"),
            entry("2", "A", json!(2), "m2"),
            entry("3", "B", json!(3), "m3"),
        ]);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].field("source"), Some(&json!("A")));
        assert_eq!(findings[0].field("frequency"), Some(&json!(2)));
        assert_eq!(findings[0].field("first_seen"), Some(&json!(1)));
        assert_eq!(findings[0].field("last_seen"), Some(&json!(2)));
        assert_eq!(findings[0].element_id, "syslog:1");
        assert_eq!(findings[1].field("source"), Some(&json!("B")));
    }

    #[test]
    fn ties_keep_first_seen_order_and_samples_cap_at_three() {
        let mut entries = vec![entry("b", "B", json!("t"), "x")];
        entries.extend((0..5).map(|i| entry(&format!("a{i}"), "A", json!("t"), &format!("m{i}"))));
        entries.push(entry("c", "", json!("t"), "y"));
        entries.push(entry("d", "D", json!("t"), "z"));

        let findings = cluster_errors(&entries);
        let sources: Vec<_> = findings
            .iter()
            .filter_map(|f| f.field("source").and_then(Value::as_str).map(str::to_string))
            .collect();
        assert_eq!(sources, vec!["A", "B", "unknown", "D"]);
        assert_eq!(
            findings[0].field("sample_messages"),
            Some(&json!(["m0", "m1", "m2"]))
        );
    }
}
