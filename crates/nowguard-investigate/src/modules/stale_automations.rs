//! Stuck flows, disabled scripts and stale scheduled jobs

use crate::contrib::{cutoff, element_of, fetch, format_timestamp, older_than, optional_records};
use crate::element::ElementId;
use crate::error::Result;
use crate::params::InvestigationParams;
use crate::registry::{Investigation, InvestigationKind};
use crate::result::{ExplanationResult, Finding, InvestigationResult};
use chrono::{DateTime, Utc};
use nowguard_client::{field_str, EncodedQuery, QueryRequest, Record, RemoteDataClient};
use serde_json::json;

/// Flags automations nobody has touched in `stale_days`
#[derive(Debug, Clone, Copy, Default)]
pub struct StaleAutomationScan;

fn stuck_flows(records: Vec<Record>, cutoff: DateTime<Utc>) -> impl Iterator<Item = Finding> {
    records
        .into_iter()
        .filter(move |r| older_than(r, "sys_created_on", cutoff))
        .map(|r| {
            Finding::new(
                "stuck_flow",
                element_of("flow_context", &r),
                format!(
                    "Flow stuck in IN_PROGRESS since {}",
                    field_str(&r, "sys_created_on")
                ),
            )
            .with_field("name", field_str(&r, "name"))
        })
}

fn stale_jobs(records: Vec<Record>, cutoff: DateTime<Utc>) -> impl Iterator<Item = Finding> {
    records
        .into_iter()
        .filter(move |r| older_than(r, "sys_updated_on", cutoff))
        .map(|r| {
            Finding::new(
                "stale_scheduled_job",
                element_of("sysauto_script", &r),
                format!(
                    "Scheduled job not updated since {}",
                    field_str(&r, "sys_updated_on")
                ),
            )
            .with_field("name", field_str(&r, "name"))
        })
}

#[async_trait::async_trait]
impl Investigation for StaleAutomationScan {
    fn kind(&self) -> InvestigationKind {
        InvestigationKind::StaleAutomations
    }

    async fn run(
        &self,
        client: &dyn RemoteDataClient,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult> {
        let stale_days = params.u64_or("stale_days", 30)?;
        let limit = params.usize_or("limit", 20)?;
        let threshold = cutoff(Utc::now(), stale_days, chrono::Duration::try_days, "stale_days")?;
        let cutoff_str = format_timestamp(threshold);

        let flows = QueryRequest::new(
            "flow_context",
            EncodedQuery::new()
                .and("state", "IN_PROGRESS")
                .and_raw(format!("sys_created_on<{cutoff_str}")),
        )
        .with_fields(["sys_id", "name", "state", "sys_created_on"])
        .with_limit(limit);
        let rules = QueryRequest::new("sys_script", EncodedQuery::new().and("active", false))
            .with_fields(["sys_id", "name", "collection", "sys_updated_on"])
            .with_limit(limit);
        let includes =
            QueryRequest::new("sys_script_include", EncodedQuery::new().and("active", false))
                .with_fields(["sys_id", "name", "api_name", "sys_updated_on"])
                .with_limit(limit);
        let jobs = QueryRequest::new(
            "sysauto_script",
            EncodedQuery::new().and_raw(format!("sys_updated_on<{cutoff_str}")),
        )
        .with_fields(["sys_id", "name", "run_type", "sys_updated_on"])
        .with_limit(limit);

        let (flows, rules, includes, jobs) = futures::join!(
            optional_records(client, "stuck_flows", flows),
            optional_records(client, "disabled_business_rules", rules),
            optional_records(client, "disabled_script_includes", includes),
            optional_records(client, "stale_scheduled_jobs", jobs),
        );

        let mut findings: Vec<Finding> = stuck_flows(flows.unwrap_or_default(), threshold).collect();
        findings.extend(rules.unwrap_or_default().into_iter().map(|r| {
            Finding::new(
                "disabled_business_rule",
                element_of("sys_script", &r),
                format!("Disabled BR on table '{}'", field_str(&r, "collection")),
            )
            .with_field("name", field_str(&r, "name"))
        }));
        findings.extend(includes.unwrap_or_default().into_iter().map(|r| {
            Finding::new(
                "disabled_script_include",
                element_of("sys_script_include", &r),
                format!("Disabled script include '{}'", field_str(&r, "api_name")),
            )
            .with_field("name", field_str(&r, "name"))
        }));
        findings.extend(stale_jobs(jobs.unwrap_or_default(), threshold));

        Ok(InvestigationResult::new(self.kind(), findings)
            .with_summary("params", json!({"stale_days": stale_days, "limit": limit}))
            .with_summary("cutoff", cutoff_str))
    }

    async fn explain(
        &self,
        client: &dyn RemoteDataClient,
        element_id: &str,
    ) -> Result<ExplanationResult> {
        let (table, id) = ElementId::parse_record(element_id)?;
        let record = fetch(client, &table, &id).await?;
        let name = field_str(&record, "name");

        let mut parts = vec![format!("Record from '{table}' with sys_id '{id}'.")];
        match table.as_str() {
            "flow_context" => {
                parts.push(format!(
                    "Flow '{name}' has been in state '{}' since {}.",
                    field_str(&record, "state"),
                    field_str(&record, "sys_created_on")
                ));
                parts.push(
                    "Consider cancelling this flow if it is no longer needed, or investigate why it is stuck."
                        .to_string(),
                );
            }
            "sys_script" => parts.push(format!(
                "Business rule '{name}' is disabled. Review whether it should be removed or re-enabled."
            )),
            "sys_script_include" => parts.push(format!(
                "Script include '{name}' is disabled. Check if any other scripts reference it."
            )),
            "sysauto_script" => parts.push(format!(
                "Scheduled job '{name}' has not been updated recently. Verify it is still needed."
            )),
            _ => {}
        }

        Ok(ExplanationResult::new(element_id, &parts).with_context("record", record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn recent_records_are_dropped_client_side() {
        let cut = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let records = vec![
            json!({"sys_id": "f1", "sys_created_on": "2023-01-01 00:00:00"}),
            json!({"sys_id": "f2", "sys_created_on": "2024-02-01 00:00:00"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();

        let findings: Vec<_> = stuck_flows(records, cut).collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].element_id, "flow_context:f1");
    }
}
