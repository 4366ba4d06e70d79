//! Rows from the remote's performance pattern tables
//!
//! Each pattern table is an independent optional contributor. Instances
//! without a given plugin simply lack the table, so failures are skipped.

use crate::contrib::{element_of, fetch, optional_records};
use crate::element::ElementId;
use crate::error::Result;
use crate::params::InvestigationParams;
use crate::registry::{Investigation, InvestigationKind};
use crate::result::{ExplanationResult, Finding, InvestigationResult};
use futures::future::join_all;
use nowguard_client::{field_str, EncodedQuery, QueryRequest, Record, RemoteDataClient};
use serde_json::json;

/// `(table, category)` pairs, in reporting order
pub const PERFORMANCE_TABLES: [(&str, &str); 7] = [
    ("sys_query_pattern", "slow_query"),
    ("sys_transaction_pattern", "slow_transaction"),
    ("sys_script_pattern", "slow_script"),
    ("sys_mutex_pattern", "mutex_contention"),
    ("sysevent_pattern", "event_pattern"),
    ("sys_interaction_pattern", "slow_interaction"),
    ("syslog_cancellation", "cancelled_transaction"),
];

const CANCELLATION_TABLE: &str = "syslog_cancellation";

/// Queries every pattern table for currently tracked patterns
#[derive(Debug, Clone, Copy, Default)]
pub struct SlowTransactionScan;

/// Filter selecting live patterns in `table`
fn pattern_filter(table: &str) -> String {
    if table == CANCELLATION_TABLE {
        String::new()
    } else {
        EncodedQuery::new()
            .is_empty("window_end")
            .is_empty("window_start")
            .build()
    }
}

fn pattern_finding(table: &str, category: &str, record: &Record) -> Finding {
    let name = match field_str(record, "name") {
        n if n.is_empty() => field_str(record, "sys_id"),
        n => n,
    };
    Finding::new(
        category,
        element_of(table, record),
        format!("Performance pattern from {table}"),
    )
    .with_field("table", table)
    .with_field("name", name)
    .with_field("count", field_str(record, "count"))
    .with_field("sys_created_on", field_str(record, "sys_created_on"))
}

#[async_trait::async_trait]
impl Investigation for SlowTransactionScan {
    fn kind(&self) -> InvestigationKind {
        InvestigationKind::SlowTransactions
    }

    async fn run(
        &self,
        client: &dyn RemoteDataClient,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult> {
        let limit = params.usize_or("limit", 20)?;
        let categories = params.csv_set("categories");

        let selected: Vec<(&str, &str)> = PERFORMANCE_TABLES
            .into_iter()
            .filter(|(_, category)| {
                categories
                    .as_ref()
                    .map_or(true, |allowed| allowed.contains(*category))
            })
            .collect();

        let results = join_all(selected.iter().map(move |&(table, category)| async move {
            let request = QueryRequest::new(table, pattern_filter(table)).with_limit(limit);
            let records = optional_records(client, table, request).await;
            (table, category, records)
        }))
        .await;

        let mut findings = Vec::new();
        let mut skipped = Vec::new();
        for (table, category, records) in results {
            match records {
                Some(records) => findings.extend(
                    records
                        .iter()
                        .map(|r| pattern_finding(table, category, r)),
                ),
                None => skipped.push(table),
            }
        }

        let queried: Vec<&str> = selected.iter().map(|(table, _)| *table).collect();
        Ok(InvestigationResult::new(self.kind(), findings)
            .with_summary(
                "params",
                json!({"limit": limit, "categories": params.str("categories")}),
            )
            .with_summary("tables_queried", queried)
            .with_summary("tables_skipped", skipped))
    }

    async fn explain(
        &self,
        client: &dyn RemoteDataClient,
        element_id: &str,
    ) -> Result<ExplanationResult> {
        let (table, id) = ElementId::parse_record(element_id)?;
        let record = fetch(client, &table, &id).await?;

        let name = match field_str(&record, "name") {
            n if n.is_empty() => "N/A".to_string(),
            n => n,
        };
        let mut parts = vec![
            format!("Performance pattern from '{table}'."),
            format!("Name: {name}."),
        ];
        let count = field_str(&record, "count");
        if !count.is_empty() {
            parts.push(format!("Hit count: {count}."));
        }
        parts.push(
            "Review this pattern to determine if query optimization, script optimization, or architecture changes are needed."
                .to_string(),
        );

        Ok(ExplanationResult::new(element_id, &parts).with_context("record", record))
    }
}
