//! Deprecated API usage in script bodies

use crate::contrib::{element_of, fetch, optional_records};
use crate::element::ElementId;
use crate::error::Result;
use crate::params::InvestigationParams;
use crate::registry::{Investigation, InvestigationKind};
use crate::result::{ExplanationResult, Finding, InvestigationResult};
use futures::future::join_all;
use nowguard_client::{field_str, EncodedQuery, QueryRequest, RemoteDataClient};
use serde_json::json;

/// Patterns searched for, in reporting order
pub const DEPRECATED_PATTERNS: [&str; 5] = [
    "Packages.",
    "gs.include(",
    "current.setWorkflow(false)",
    "GlideRecordSecure(",
    "g_form.flash(",
];

/// Tables whose `script` field holds server or client code
pub const SCRIPT_TABLES: [&str; 6] = [
    "sys_script",
    "sys_script_include",
    "sys_script_client",
    "sys_ui_action",
    "sysauto_script",
    "sys_script_fix",
];

/// Scans every script table for every deprecated pattern
#[derive(Debug, Clone, Copy, Default)]
pub struct DeprecatedApiScan;

#[async_trait::async_trait]
impl Investigation for DeprecatedApiScan {
    fn kind(&self) -> InvestigationKind {
        InvestigationKind::DeprecatedApis
    }

    async fn run(
        &self,
        client: &dyn RemoteDataClient,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult> {
        let limit = params.usize_or("limit", 20)?;

        let searches = DEPRECATED_PATTERNS.into_iter().flat_map(move |pattern| {
            SCRIPT_TABLES.into_iter().map(move |table| async move {
                let request = QueryRequest::new(
                    table,
                    EncodedQuery::new().and_raw(format!("scriptLIKE{pattern}")),
                )
                .with_fields(["sys_id", "name"])
                .with_limit(limit);
                let contributor = format!("{table}:{pattern}");
                let records = optional_records(client, &contributor, request).await;
                (pattern, table, records.unwrap_or_default())
            })
        });

        // join_all keeps input order, so findings stay grouped by pattern
        let findings: Vec<Finding> = join_all(searches)
            .await
            .into_iter()
            .flat_map(|(pattern, table, records)| {
                records.into_iter().map(move |r| {
                    Finding::new(
                        "deprecated_api",
                        element_of(table, &r),
                        format!("Uses deprecated pattern '{pattern}'"),
                    )
                    .with_field("pattern", pattern)
                    .with_field("name", field_str(&r, "name"))
                    .with_field("table", table)
                })
            })
            .collect();

        Ok(InvestigationResult::new(self.kind(), findings)
            .with_summary("params", json!({"limit": limit}))
            .with_summary("patterns_searched", json!(DEPRECATED_PATTERNS))
            .with_summary("tables_searched", json!(SCRIPT_TABLES)))
    }

    async fn explain(
        &self,
        client: &dyn RemoteDataClient,
        element_id: &str,
    ) -> Result<ExplanationResult> {
        let (table, id) = ElementId::parse_record(element_id)?;
        let record = fetch(client, &table, &id).await?;
        let script = field_str(&record, "script");
        let found: Vec<&str> = DEPRECATED_PATTERNS
            .into_iter()
            .filter(|p| script.contains(p))
            .collect();

        let mut parts = vec![format!(
            "Script '{}' in table '{table}' uses deprecated API patterns.",
            field_str(&record, "name")
        )];
        if !found.is_empty() {
            parts.push(format!("Found: {}.", found.join(", ")));
        }
        parts.push(
            "Deprecated APIs may be removed in future platform versions and can cause upgrade issues."
                .to_string(),
        );
        parts.push(
            "Review the script and replace deprecated calls with supported alternatives."
                .to_string(),
        );

        Ok(ExplanationResult::new(element_id, &parts)
            .with_context("patterns_found", found)
            .with_context("record", record))
    }
}
