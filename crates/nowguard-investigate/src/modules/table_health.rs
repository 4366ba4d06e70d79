//! Health report for one table
//!
//! Combines a record count, automation density and recent errors into a
//! single report. The count is mandatory; the rest are optional.

use crate::contrib::{cutoff, format_timestamp, optional_records};
use crate::element::ElementId;
use crate::error::{InvestigationError, Result};
use crate::params::InvestigationParams;
use crate::registry::{Investigation, InvestigationKind};
use crate::result::{ExplanationResult, Finding, InvestigationResult};
use chrono::Utc;
use nowguard_client::{AggregateRequest, EncodedQuery, QueryRequest, Record, RemoteDataClient};
use serde_json::json;

const BUSINESS_RULE_THRESHOLD: usize = 10;
const ACL_THRESHOLD: usize = 20;
const AUTOMATION_LIMIT: usize = 200;
const RECENT_ERROR_LIMIT: usize = 20;

/// Builds the per-table health report
#[derive(Debug, Clone, Copy, Default)]
pub struct TableHealthReport;

/// Indicators derived from fixed thresholds
#[must_use]
pub fn health_indicators(business_rules: usize, acls: usize, recent_errors: usize) -> Vec<String> {
    let mut indicators = Vec::new();
    if business_rules > BUSINESS_RULE_THRESHOLD {
        indicators.push(format!("High business rule count ({business_rules})"));
    }
    if acls > ACL_THRESHOLD {
        indicators.push(format!("High ACL count ({acls})"));
    }
    if recent_errors > 0 {
        indicators.push(format!("{recent_errors} recent errors in syslog"));
    }
    indicators
}

fn active_on(table_field: &str, table: &str) -> EncodedQuery {
    EncodedQuery::new().and(table_field, table).and("active", true)
}

#[async_trait::async_trait]
impl Investigation for TableHealthReport {
    fn kind(&self) -> InvestigationKind {
        InvestigationKind::TableHealth
    }

    async fn run(
        &self,
        client: &dyn RemoteDataClient,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult> {
        let Some(table) = params.str("table") else {
            return Ok(InvestigationResult::missing_param(self.kind(), "table"));
        };
        let hours = params.u64_or("hours", 24)?;
        let since = format_timestamp(cutoff(Utc::now(), hours, chrono::Duration::try_hours, "hours")?);

        let count_request = AggregateRequest::count(table, "");
        let rules = QueryRequest::new("sys_script", active_on("collection", table))
            .with_fields(["sys_id", "name", "when"])
            .with_limit(AUTOMATION_LIMIT);
        let client_scripts = QueryRequest::new("sys_script_client", active_on("table", table))
            .with_fields(["sys_id", "name", "type"])
            .with_limit(AUTOMATION_LIMIT);
        let acls = QueryRequest::new(
            "sys_security_acl",
            EncodedQuery::new().and_raw(format!("nameSTARTSWITH{table}")),
        )
        .with_fields(["sys_id", "name", "operation"])
        .with_limit(AUTOMATION_LIMIT);
        let ui_policies = QueryRequest::new("sys_ui_policy", active_on("table", table))
            .with_fields(["sys_id", "short_description"])
            .with_limit(AUTOMATION_LIMIT);
        let errors = QueryRequest::new(
            "syslog",
            EncodedQuery::new()
                .and("level", 0)
                .and_raw(format!("sourceLIKE{table}"))
                .and_raw(format!("sys_created_on>={since}")),
        )
        .with_fields(["sys_id", "message", "source", "sys_created_on"])
        .with_limit(RECENT_ERROR_LIMIT)
        .order_by("sys_created_on");

        let (count, rules, client_scripts, acls, ui_policies, errors) = futures::join!(
            client.aggregate(&count_request),
            optional_records(client, "business_rules", rules),
            optional_records(client, "client_scripts", client_scripts),
            optional_records(client, "acls", acls),
            optional_records(client, "ui_policies", ui_policies),
            optional_records(client, "recent_errors", errors),
        );
        let record_count = count?.count();

        let mut skipped = Vec::new();
        let mut take = |name: &'static str, records: Option<Vec<Record>>| {
            records.unwrap_or_else(|| {
                skipped.push(name);
                Vec::new()
            })
        };
        let rules = take("business_rules", rules);
        let client_scripts = take("client_scripts", client_scripts);
        let acls = take("acls", acls);
        let ui_policies = take("ui_policies", ui_policies);
        let errors = take("recent_errors", errors);

        let indicators = health_indicators(rules.len(), acls.len(), errors.len());
        let findings = indicators
            .iter()
            .map(|indicator| Finding::new("health_indicator", table, indicator.as_str()))
            .collect();

        Ok(InvestigationResult::new(self.kind(), findings)
            .with_summary("table", table)
            .with_summary("record_count", record_count)
            .with_summary(
                "automation",
                json!({
                    "business_rules": {"count": rules.len(), "records": rules},
                    "client_scripts": {"count": client_scripts.len(), "records": client_scripts},
                    "acl_count": acls.len(),
                    "ui_policies": {"count": ui_policies.len(), "records": ui_policies},
                }),
            )
            .with_summary("recent_errors", errors)
            .with_summary("health_indicators", indicators)
            .with_summary("skipped_contributors", skipped))
    }

    async fn explain(
        &self,
        client: &dyn RemoteDataClient,
        element_id: &str,
    ) -> Result<ExplanationResult> {
        let table = match ElementId::parse(element_id)? {
            ElementId::Table(table) => table,
            ElementId::Record { .. } => {
                return Err(InvestigationError::InvalidInput(format!(
                    "table_health elements are table names, got '{element_id}'"
                )))
            }
        };

        let record_count = client
            .aggregate(&AggregateRequest::count(&table, ""))
            .await?
            .count();

        let parts = [
            format!("Table '{table}' contains {record_count} records."),
            "Run a full table_health investigation for detailed automation and error analysis."
                .to_string(),
        ];
        Ok(ExplanationResult::new(element_id, &parts).with_context("record_count", record_count))
    }
}
