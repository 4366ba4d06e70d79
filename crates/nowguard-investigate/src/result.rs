//! Investigation output types

use crate::registry::InvestigationKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One problem found by a `run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Finding category, e.g. `error_cluster`
    pub category: String,
    /// Identifier to pass to `explain`
    pub element_id: String,
    /// Human-readable summary
    pub detail: String,
    /// Category-specific fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Finding {
    /// Finding with no extra fields
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        element_id: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            element_id: element_id.into(),
            detail: detail.into(),
            fields: Map::new(),
        }
    }

    /// Attach a field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Look up an extra field
    #[inline]
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Output of an investigation's `run`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationResult {
    /// Which investigation produced this
    pub investigation: InvestigationKind,
    /// Always `findings.len()`
    pub finding_count: usize,
    /// Findings in ranked order
    pub findings: Vec<Finding>,
    /// Set only when a required parameter was missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Module-specific summary fields
    #[serde(flatten)]
    pub summary: Map<String, Value>,
}

impl InvestigationResult {
    /// Result holding `findings`
    #[must_use]
    pub fn new(investigation: InvestigationKind, findings: Vec<Finding>) -> Self {
        Self {
            investigation,
            finding_count: findings.len(),
            findings,
            error: None,
            summary: Map::new(),
        }
    }

    /// Zero-finding result reporting a missing required parameter
    #[must_use]
    pub fn missing_param(investigation: InvestigationKind, param: &str) -> Self {
        Self {
            error: Some(format!("Missing required parameter: {param}")),
            ..Self::new(investigation, Vec::new())
        }
    }

    /// Attach a summary field
    #[inline]
    #[must_use]
    pub fn with_summary(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.summary.insert(key.to_string(), value.into());
        self
    }

    /// Whether this is a missing-parameter result
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Output of an investigation's `explain`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationResult {
    /// Element id as supplied
    pub element: String,
    /// Prose explanation
    pub explanation: String,
    /// Supporting record and context
    #[serde(flatten)]
    pub context: Map<String, Value>,
}

impl ExplanationResult {
    /// Explanation joined from sentences
    #[must_use]
    pub fn new(element: impl Into<String>, parts: &[String]) -> Self {
        Self {
            element: element.into(),
            explanation: parts.join(" "),
            context: Map::new(),
        }
    }

    /// Attach context
    #[inline]
    #[must_use]
    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finding_flattens_fields() {
        let finding = Finding::new("error_cluster", "syslog:1", "3 errors")
            .with_field("frequency", 3);
        assert_eq!(
            serde_json::to_value(&finding).unwrap(),
            json!({
                "category": "error_cluster",
                "element_id": "syslog:1",
                "detail": "3 errors",
                "frequency": 3
            })
        );
    }

    #[test]
    fn missing_param_result() {
        let result = InvestigationResult::missing_param(InvestigationKind::AclConflicts, "table");
        assert!(result.is_error());
        assert_eq!(result.finding_count, 0);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["investigation"], "acl_conflicts");
        assert_eq!(value["error"], "Missing required parameter: table");
    }

    #[test]
    fn error_omitted_on_success() {
        let value = serde_json::to_value(
            InvestigationResult::new(InvestigationKind::TableHealth, Vec::new())
                .with_summary("record_count", 12),
        )
        .unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["record_count"], 12);
    }
}
