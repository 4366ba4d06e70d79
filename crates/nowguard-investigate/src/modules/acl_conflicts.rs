//! Same-name ACLs with differing conditions
//!
//! Every ACL with the same name is evaluated by the remote, so two rules
//! named `incident.read` whose conditions disagree grant access in ways
//! that are hard to predict.

use crate::contrib::{fetch, optional_records};
use crate::element::ElementId;
use crate::error::{InvestigationError, Result};
use crate::params::InvestigationParams;
use crate::registry::{Investigation, InvestigationKind};
use crate::result::{ExplanationResult, Finding, InvestigationResult};
use indexmap::IndexMap;
use nowguard_client::{field_str, EncodedQuery, QueryRequest, Record, RemoteDataClient};
use serde_json::{json, Value};
use std::collections::HashSet;

const ACL_TABLE: &str = "sys_security_acl";
const ACL_FIELDS: [&str; 6] = ["sys_id", "name", "operation", "condition", "script", "active"];
const ACL_SCAN_LIMIT: usize = 500;

/// Groups ACLs by name and reports groups that disagree
#[derive(Debug, Clone, Copy, Default)]
pub struct AclConflictDetector;

/// Conflict groups in first-seen order
///
/// A group conflicts when it has at least two members and at least two
/// distinct conditions.
#[must_use]
pub fn find_conflicts(acls: &[Record]) -> Vec<Finding> {
    let mut groups: IndexMap<String, Vec<&Record>> = IndexMap::new();
    for acl in acls {
        groups.entry(field_str(acl, "name")).or_default().push(acl);
    }

    groups
        .into_iter()
        .filter(|(_, members)| {
            let conditions: HashSet<String> =
                members.iter().map(|acl| field_str(acl, "condition")).collect();
            members.len() >= 2 && conditions.len() >= 2
        })
        .map(|(name, members)| {
            let element = format!("{ACL_TABLE}:{}", field_str(members[0], "sys_id"));
            let summary: Vec<Value> = members
                .iter()
                .map(|acl| {
                    json!({
                        "sys_id": field_str(acl, "sys_id"),
                        "operation": field_str(acl, "operation"),
                        "condition": field_str(acl, "condition"),
                        "active": field_str(acl, "active"),
                    })
                })
                .collect();
            Finding::new(
                "acl_conflict",
                element,
                format!(
                    "ACL '{name}' has {} overlapping rules with different conditions",
                    members.len()
                ),
            )
            .with_field("name", name)
            .with_field("count", members.len())
            .with_field("acls", summary)
        })
        .collect()
}

#[async_trait::async_trait]
impl Investigation for AclConflictDetector {
    fn kind(&self) -> InvestigationKind {
        InvestigationKind::AclConflicts
    }

    async fn run(
        &self,
        client: &dyn RemoteDataClient,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult> {
        let Some(table) = params.str("table") else {
            return Ok(InvestigationResult::missing_param(self.kind(), "table"));
        };

        let filter = EncodedQuery::new().and_raw(format!("nameSTARTSWITH{table}"));
        let page = client
            .query_records(
                &QueryRequest::new(ACL_TABLE, filter)
                    .with_fields(ACL_FIELDS)
                    .with_limit(ACL_SCAN_LIMIT),
            )
            .await?;

        let findings = find_conflicts(&page.records);
        tracing::debug!(
            table,
            checked = page.records.len(),
            conflicts = findings.len(),
            "acl conflict scan complete"
        );
        Ok(InvestigationResult::new(self.kind(), findings)
            .with_summary("table", table)
            .with_summary("total_acls_checked", page.records.len()))
    }

    async fn explain(
        &self,
        client: &dyn RemoteDataClient,
        element_id: &str,
    ) -> Result<ExplanationResult> {
        let id = match ElementId::parse(element_id)? {
            ElementId::Record { table, id } if table == ACL_TABLE => id,
            ElementId::Table(id) => id,
            ElementId::Record { table, .. } => {
                return Err(InvestigationError::InvalidInput(format!(
                    "acl_conflicts elements live in {ACL_TABLE}, not {table}"
                )))
            }
        };

        let record = fetch(client, ACL_TABLE, &id).await?;
        let name = field_str(&record, "name");
        let condition = match field_str(&record, "condition") {
            c if c.is_empty() => "(none)".to_string(),
            c => c,
        };

        let siblings = optional_records(
            client,
            "acl_siblings",
            QueryRequest::new(ACL_TABLE, EncodedQuery::new().and("name", &name))
                .with_fields(ACL_FIELDS)
                .with_limit(ACL_SCAN_LIMIT),
        )
        .await
        .unwrap_or_default();

        let parts = [
            format!(
                "ACL '{name}' controls {} access.",
                field_str(&record, "operation")
            ),
            format!("Condition: '{condition}'."),
            format!(
                "{} ACLs currently share this name; the remote evaluates all of them, so conflicting conditions can lead to unexpected access behavior.",
                siblings.len().max(1)
            ),
            "Review whether these ACLs should be consolidated.".to_string(),
        ];

        Ok(ExplanationResult::new(element_id, &parts)
            .with_context("record", record)
            .with_context("related_acls", siblings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acl(id: &str, name: &str, condition: &str) -> Record {
        json!({"sys_id": id, "name": name, "condition": condition, "operation": "read"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn same_name_different_conditions_conflict() {
        let findings = find_conflicts(&[
            acl("a1", "incident.read", "active=true"),
            acl("a2", "incident.read", "priority=1"),
        ]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].element_id, "sys_security_acl:a1");
        assert_eq!(findings[0].field("count"), Some(&json!(2)));
    }

    #[test]
    fn identical_conditions_are_not_a_conflict() {
        let findings = find_conflicts(&[
            acl("a1", "incident.read", "active=true"),
            acl("a2", "incident.read", "active=true"),
        ]);
        assert!(findings.is_empty());
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let findings = find_conflicts(&[
            acl("b1", "incident.write", "x"),
            acl("a1", "incident.read", "x"),
            acl("b2", "incident.write", "y"),
            acl("a2", "incident.read", "y"),
        ]);
        let names: Vec<_> = findings.iter().map(|f| f.field("name").cloned()).collect();
        assert_eq!(
            names,
            vec![Some(json!("incident.write")), Some(json!("incident.read"))]
        );
    }
}
