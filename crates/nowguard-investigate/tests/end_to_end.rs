//! Investigations driven end to end against an in-memory store

use chrono::{Duration, Utc};
use nowguard_client::ClientError;
use nowguard_investigate::{dispatch, InvestigationError, InvestigationKind, InvestigationParams};
use nowguard_test_utils::{Call, FixtureClient};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn hours_ago(hours: i64) -> String {
    (Utc::now() - Duration::hours(hours))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[tokio::test]
async fn error_clusters_rank_by_frequency() {
    let (t1, t2, t3) = (hours_ago(3), hours_ago(2), hours_ago(1));
    let client = FixtureClient::new().with_records(
        "syslog",
        [
            json!({"sys_id": "l1", "level": "0", "source": "A", "sys_created_on": t1, "message": "boom"}),
            json!({"sys_id": "l2", "level": "0", "source": "A", "sys_created_on": t2, "message": "boom again"}),
            json!({"sys_id": "l3", "level": "0", "source": "B", "sys_created_on": t3, "message": "other"}),
        ],
    );

    let result = dispatch::run(&client, "error_analysis", &InvestigationParams::new())
        .await
        .unwrap();

    assert_eq!(result.investigation, InvestigationKind::ErrorAnalysis);
    assert_eq!(result.finding_count, 2);
    let top = &result.findings[0];
    assert_eq!(top.field("source"), Some(&json!("A")));
    assert_eq!(top.field("frequency"), Some(&json!(2)));
    assert_eq!(top.field("first_seen"), Some(&json!(t1)));
    assert_eq!(top.field("last_seen"), Some(&json!(t2)));
    assert_eq!(top.field("sample_messages"), Some(&json!(["boom", "boom again"])));
    assert_eq!(top.element_id, "syslog:l1");
    assert_eq!(result.summary["total_errors"], json!(3));
}

#[tokio::test]
async fn error_analysis_bounds_the_window() {
    let client = FixtureClient::new().with_records(
        "syslog",
        [
            json!({"sys_id": "old", "level": "0", "source": "A", "sys_created_on": hours_ago(48)}),
            json!({"sys_id": "new", "level": "0", "source": "A", "sys_created_on": hours_ago(1)}),
            json!({"sys_id": "warn", "level": "1", "source": "A", "sys_created_on": hours_ago(1)}),
        ],
    );

    let result = dispatch::run(
        &client,
        "error_analysis",
        &InvestigationParams::new().with("hours", 24).with("source", "A"),
    )
    .await
    .unwrap();

    assert_eq!(result.finding_count, 1);
    assert_eq!(result.findings[0].field("frequency"), Some(&json!(1)));
    let queries = client.queries_against("syslog");
    let Call::Query { filter, .. } = &queries[0] else {
        unreachable!()
    };
    assert!(filter.starts_with("level=0^sourceLIKEA^sys_created_on>="));
}

#[tokio::test]
async fn error_analysis_propagates_syslog_failure() {
    let client =
        FixtureClient::new().with_failure("syslog", ClientError::Forbidden("no syslog".into()));
    let err = dispatch::run(&client, "error_analysis", &InvestigationParams::new())
        .await
        .unwrap_err();
    assert!(matches!(err, InvestigationError::Client(ClientError::Forbidden(_))));
}

#[tokio::test]
async fn same_name_acls_with_different_conditions_conflict() {
    let client = FixtureClient::new().with_records(
        "sys_security_acl",
        [
            json!({"sys_id": "a1", "name": "incident.read", "condition": "active=true", "operation": "read"}),
            json!({"sys_id": "a2", "name": "incident.read", "condition": "priority=1", "operation": "read"}),
        ],
    );

    let params = InvestigationParams::new().with("table", "incident");
    let result = dispatch::run(&client, "acl_conflicts", &params).await.unwrap();

    assert_eq!(result.finding_count, 1);
    assert_eq!(result.findings[0].field("count"), Some(&json!(2)));
    assert_eq!(result.summary["total_acls_checked"], json!(2));

    let explained = dispatch::explain(&client, "acl_conflicts", &result.findings[0].element_id)
        .await
        .unwrap();
    assert_eq!(explained.element, "sys_security_acl:a1");
    assert!(explained.explanation.contains("incident.read"));
    assert_eq!(explained.context["related_acls"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn distinct_acl_names_do_not_conflict() {
    let client = FixtureClient::new().with_records(
        "sys_security_acl",
        [
            json!({"sys_id": "a1", "name": "incident.read", "condition": "x"}),
            json!({"sys_id": "a2", "name": "incident.write", "condition": "y"}),
        ],
    );
    let params = InvestigationParams::new().with("table", "incident");
    let result = dispatch::run(&client, "acl_conflicts", &params).await.unwrap();
    assert_eq!(result.finding_count, 0);
}

#[tokio::test]
async fn missing_table_is_reported_not_raised() {
    let client = FixtureClient::new();
    for name in ["acl_conflicts", "table_health"] {
        let result = dispatch::run(&client, name, &InvestigationParams::new())
            .await
            .unwrap();
        assert_eq!(result.finding_count, 0);
        assert_eq!(
            result.error.as_deref(),
            Some("Missing required parameter: table")
        );
    }
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn unknown_investigation_lists_valid_names() {
    let client = FixtureClient::new();
    let err = dispatch::run(&client, "nope", &InvestigationParams::new())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Unknown investigation 'nope'. Available: acl_conflicts"));

    let err = dispatch::explain(&client, "nope", "incident").await.unwrap_err();
    assert!(matches!(err, InvestigationError::UnknownInvestigation { .. }));
}

#[tokio::test]
async fn slow_transactions_skip_missing_tables() {
    let client = FixtureClient::new()
        .with_records(
            "sys_query_pattern",
            [json!({"sys_id": "q1", "name": "slow GlideRecord", "count": "42", "window_end": "", "window_start": ""})],
        )
        .with_records(
            "syslog_cancellation",
            [json!({"sys_id": "c1", "name": "cancelled"})],
        )
        .with_failure("sys_mutex_pattern", ClientError::NotFound("no table".into()));

    let result = dispatch::run(&client, "slow_transactions", &InvestigationParams::new())
        .await
        .unwrap();

    let categories: Vec<_> = result.findings.iter().map(|f| f.category.as_str()).collect();
    assert_eq!(categories, vec!["slow_query", "cancelled_transaction"]);
    assert_eq!(result.summary["tables_skipped"], json!(["sys_mutex_pattern"]));
    assert_eq!(result.summary["tables_queried"].as_array().map(Vec::len), Some(7));
}

#[tokio::test]
async fn slow_transactions_category_filter() {
    let client = FixtureClient::new();
    let params = InvestigationParams::new().with("categories", "slow_query, mutex_contention");
    let result = dispatch::run(&client, "slow_transactions", &params).await.unwrap();
    assert_eq!(
        result.summary["tables_queried"],
        json!(["sys_query_pattern", "sys_mutex_pattern"])
    );
    assert_eq!(client.calls().len(), 2);
}

#[tokio::test]
async fn table_health_survives_optional_failures() {
    let rules: Vec<Value> = (0..11)
        .map(|i| json!({"sys_id": format!("br{i}"), "collection": "incident", "active": "true"}))
        .collect();
    let client = FixtureClient::new()
        .with_count("incident", 1234)
        .with_records("sys_script", rules)
        .with_failure("sys_security_acl", ClientError::Forbidden("acl".into()));

    let params = InvestigationParams::new().with("table", "incident");
    let result = dispatch::run(&client, "table_health", &params).await.unwrap();

    assert_eq!(result.summary["record_count"], json!(1234));
    assert_eq!(result.summary["automation"]["business_rules"]["count"], json!(11));
    assert_eq!(result.summary["skipped_contributors"], json!(["acls"]));
    assert_eq!(result.finding_count, 1);
    assert_eq!(result.findings[0].element_id, "incident");
    assert_eq!(result.findings[0].detail, "High business rule count (11)");

    let explained = dispatch::explain(&client, "table_health", "incident").await.unwrap();
    assert_eq!(explained.context["record_count"], json!(1234));
}

#[tokio::test]
async fn table_health_count_is_mandatory() {
    let client =
        FixtureClient::new().with_failure("incident", ClientError::ServerError("down".into()));
    let params = InvestigationParams::new().with("table", "incident");
    let err = dispatch::run(&client, "table_health", &params).await.unwrap_err();
    assert!(matches!(err, InvestigationError::Client(ClientError::ServerError(_))));
}

#[tokio::test]
async fn stale_automations_checks_age() {
    let client = FixtureClient::new()
        .with_records(
            "flow_context",
            [
                json!({"sys_id": "f1", "name": "old flow", "state": "IN_PROGRESS", "sys_created_on": days_ago(90)}),
                json!({"sys_id": "f2", "name": "new flow", "state": "IN_PROGRESS", "sys_created_on": days_ago(1)}),
            ],
        )
        .with_records(
            "sys_script",
            [json!({"sys_id": "br1", "name": "off", "collection": "incident", "active": "false"})],
        )
        .with_failure("sys_script_include", ClientError::Unauthorized("nope".into()));

    let result = dispatch::run(&client, "stale_automations", &InvestigationParams::new())
        .await
        .unwrap();

    let ids: Vec<_> = result.findings.iter().map(|f| f.element_id.as_str()).collect();
    assert_eq!(ids, vec!["flow_context:f1", "sys_script:br1"]);

    let explained = dispatch::explain(&client, "stale_automations", "flow_context:f1")
        .await
        .unwrap();
    assert!(explained.explanation.contains("old flow"));
}

#[tokio::test]
async fn deprecated_apis_report_pattern_and_table() {
    let client = FixtureClient::new()
        .with_records(
            "sys_script_include",
            [json!({"sys_id": "si1", "name": "Legacy", "script": "gs.include('Util');"})],
        )
        .with_failure("sys_script_fix", ClientError::Forbidden("fix".into()));

    let result = dispatch::run(&client, "deprecated_apis", &InvestigationParams::new())
        .await
        .unwrap();

    assert_eq!(result.finding_count, 1);
    let finding = &result.findings[0];
    assert_eq!(finding.element_id, "sys_script_include:si1");
    assert_eq!(finding.field("pattern"), Some(&json!("gs.include(")));

    let explained = dispatch::explain(&client, "deprecated_apis", &finding.element_id)
        .await
        .unwrap();
    assert_eq!(explained.context["patterns_found"], json!(["gs.include("]));
}

#[tokio::test]
async fn bottlenecks_flag_heavy_tables() {
    let rules: Vec<Value> = (0..12)
        .map(|i| json!({"sys_id": format!("br{i}"), "collection": "task", "active": "true"}))
        .collect();
    let client = FixtureClient::new()
        .with_records("sys_script", rules)
        .with_records(
            "flow_context",
            [json!({"sys_id": "f1", "name": "sync", "state": "IN_PROGRESS"})],
        );

    let result = dispatch::run(&client, "performance_bottlenecks", &InvestigationParams::new())
        .await
        .unwrap();
    let categories: Vec<_> = result.findings.iter().map(|f| f.category.as_str()).collect();
    assert_eq!(categories, vec!["heavy_automation", "long_running_flow"]);

    let explained = dispatch::explain(&client, "performance_bottlenecks", "task")
        .await
        .unwrap();
    assert_eq!(explained.context["br_count"], json!(12));
}

#[tokio::test]
async fn explain_rejects_malformed_element_ids() {
    let client = FixtureClient::new();
    let err = dispatch::explain(&client, "error_analysis", "syslog")
        .await
        .unwrap_err();
    assert!(matches!(err, InvestigationError::InvalidInput(_)));

    let err = dispatch::explain(&client, "table_health", "incident:abc")
        .await
        .unwrap_err();
    assert!(matches!(err, InvestigationError::InvalidInput(_)));
}
