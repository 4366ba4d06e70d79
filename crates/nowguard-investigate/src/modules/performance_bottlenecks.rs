//! Heavy automation, frequent jobs and long-running flows

use crate::contrib::{element_of, fetch, optional_records};
use crate::element::ElementId;
use crate::error::Result;
use crate::params::InvestigationParams;
use crate::registry::{Investigation, InvestigationKind};
use crate::result::{ExplanationResult, Finding, InvestigationResult};
use indexmap::IndexMap;
use nowguard_client::{
    field_str, AggregateRequest, EncodedQuery, QueryRequest, Record, RemoteDataClient,
};
use serde_json::json;

/// Active business rules above which a table counts as heavily automated
pub const HEAVY_AUTOMATION_THRESHOLD: usize = 10;
const RULE_SCAN_LIMIT: usize = 500;
const EXPLAIN_RULE_LIMIT: usize = 50;

/// Finds tables and jobs likely to slow the instance down
#[derive(Debug, Clone, Copy, Default)]
pub struct BottleneckScan;

/// Tables with more than the threshold of active rules, busiest first
///
/// At most `limit` tables are considered before thresholding.
#[must_use]
pub fn heavy_automation(rules: &[Record], limit: usize) -> Vec<Finding> {
    let mut per_table: IndexMap<String, usize> = IndexMap::new();
    for rule in rules {
        *per_table.entry(field_str(rule, "collection")).or_default() += 1;
    }
    let mut ranked: Vec<_> = per_table.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(limit)
        .filter(|(_, count)| *count > HEAVY_AUTOMATION_THRESHOLD)
        .map(|(table, count)| {
            Finding::new(
                "heavy_automation",
                table.as_str(),
                format!(
                    "Table '{table}' has {count} active business rules (threshold: {HEAVY_AUTOMATION_THRESHOLD})"
                ),
            )
            .with_field("name", table.as_str())
            .with_field("br_count", count)
        })
        .collect()
}

#[async_trait::async_trait]
impl Investigation for BottleneckScan {
    fn kind(&self) -> InvestigationKind {
        InvestigationKind::PerformanceBottlenecks
    }

    async fn run(
        &self,
        client: &dyn RemoteDataClient,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult> {
        let limit = params.usize_or("limit", 20)?;

        let rules = QueryRequest::new("sys_script", EncodedQuery::new().and("active", true))
            .with_fields(["sys_id", "name", "collection", "active"])
            .with_limit(RULE_SCAN_LIMIT);
        let jobs = QueryRequest::new("sysauto_script", EncodedQuery::new().and("active", true))
            .with_fields(["sys_id", "name", "run_type", "run_dayofweek", "sys_updated_on"])
            .with_limit(limit);
        let flows = QueryRequest::new(
            "flow_context",
            EncodedQuery::new().and("state", "IN_PROGRESS"),
        )
        .with_fields(["sys_id", "name", "state", "sys_created_on"])
        .with_limit(limit);

        let (rules, jobs, flows) = futures::join!(
            optional_records(client, "active_business_rules", rules),
            optional_records(client, "active_scheduled_jobs", jobs),
            optional_records(client, "running_flows", flows),
        );

        let mut findings = heavy_automation(&rules.unwrap_or_default(), limit);
        findings.extend(jobs.unwrap_or_default().iter().map(|r| {
            let name = field_str(r, "name");
            Finding::new(
                "frequent_job",
                element_of("sysauto_script", r),
                format!("Active scheduled job: {name}"),
            )
            .with_field("name", name)
            .with_field("run_type", field_str(r, "run_type"))
        }));
        findings.extend(flows.unwrap_or_default().iter().map(|r| {
            Finding::new(
                "long_running_flow",
                element_of("flow_context", r),
                format!("Flow in progress since {}", field_str(r, "sys_created_on")),
            )
            .with_field("name", field_str(r, "name"))
        }));

        Ok(InvestigationResult::new(self.kind(), findings)
            .with_summary("params", json!({"limit": limit})))
    }

    async fn explain(
        &self,
        client: &dyn RemoteDataClient,
        element_id: &str,
    ) -> Result<ExplanationResult> {
        match ElementId::parse(element_id)? {
            ElementId::Record { table, id } => {
                let record = fetch(client, &table, &id).await?;
                let parts = [
                    format!("Record from '{table}': {}.", field_str(&record, "name")),
                    "This record is flagged as a potential performance bottleneck.".to_string(),
                    "Review its configuration and execution frequency.".to_string(),
                ];
                Ok(ExplanationResult::new(element_id, &parts).with_context("record", record))
            }
            ElementId::Table(table) => {
                let rules = QueryRequest::new(
                    "sys_script",
                    EncodedQuery::new()
                        .and("collection", &table)
                        .and("active", true),
                )
                .with_fields(["sys_id", "name", "when"])
                .with_limit(EXPLAIN_RULE_LIMIT);
                let count_request = AggregateRequest::count(&table, "");

                let (count, rules) = futures::join!(
                    client.aggregate(&count_request),
                    optional_records(client, "table_business_rules", rules),
                );
                let record_count = count?.count();
                let rule_count = rules.map_or(0, |r| r.len());

                let parts = [
                    format!(
                        "Table '{table}' has {rule_count} active business rules and {record_count} records."
                    ),
                    format!(
                        "Tables with more than {HEAVY_AUTOMATION_THRESHOLD} business rules can cause performance issues."
                    ),
                    "Consider consolidating or disabling unnecessary rules.".to_string(),
                ];
                Ok(ExplanationResult::new(element_id, &parts)
                    .with_context("record_count", record_count)
                    .with_context("br_count", rule_count))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_on(table: &str, n: usize) -> Vec<Record> {
        (0..n)
            .filter_map(|i| {
                json!({"sys_id": format!("{table}{i}"), "collection": table})
                    .as_object()
                    .cloned()
            })
            .collect()
    }

    #[test]
    fn only_groups_over_threshold() {
        let mut rules = rules_on("incident", 11);
        rules.extend(rules_on("problem", 10));
        rules.extend(rules_on("change_request", 14));

        let findings = heavy_automation(&rules, 20);
        let tables: Vec<_> = findings.iter().map(|f| f.element_id.as_str()).collect();
        assert_eq!(tables, vec!["change_request", "incident"]);
        assert_eq!(findings[0].field("br_count"), Some(&json!(14)));
    }

    #[test]
    fn limit_applies_before_threshold() {
        let mut rules = rules_on("incident", 12);
        rules.extend(rules_on("problem", 11));
        assert_eq!(heavy_automation(&rules, 1).len(), 1);
    }
}
