//! Response envelope
//!
//! Every gateway response handed to an outer surface is wrapped the same
//! way: a correlation id for log matching, a status, and either data or a
//! coded error.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outcome marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Operation completed
    Success,
    /// Operation failed; see `error`
    Error,
}

/// Coded error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Standard response wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Fresh v4 UUID per response
    pub correlation_id: String,
    /// Success or error
    pub status: Status,
    /// Payload; `null` on error
    pub data: Value,
    /// Error details, only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    /// Non-fatal notices such as limit capping
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Envelope {
    /// Successful response carrying `data`
    #[must_use]
    pub fn success(data: impl Serialize) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(err) => return Self::failure(&GatewayError::InvalidInput(err.to_string())),
        };
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            status: Status::Success,
            data,
            error: None,
            warnings: Vec::new(),
        }
    }

    /// Error response for `err`
    #[must_use]
    pub fn failure(err: &GatewayError) -> Self {
        let envelope = Self {
            correlation_id: Uuid::new_v4().to_string(),
            status: Status::Error,
            data: Value::Null,
            error: Some(ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
            }),
            warnings: Vec::new(),
        };
        tracing::debug!(
            correlation_id = %envelope.correlation_id,
            code = err.code(),
            "error envelope"
        );
        envelope
    }

    /// Wrap either arm of `result`
    #[must_use]
    pub fn from_result<T: Serialize>(result: &Result<T, GatewayError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::failure(err),
        }
    }

    /// With warnings
    #[inline]
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Whether this is a success envelope
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nowguard_state::StateError;
    use serde_json::json;

    #[test]
    fn success_shape() {
        let envelope = Envelope::success(json!({"count": 3}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], json!("success"));
        assert_eq!(value["data"]["count"], json!(3));
        assert!(value.get("error").is_none());
        assert!(Uuid::parse_str(&envelope.correlation_id).is_ok());
    }

    #[test]
    fn failure_carries_code() {
        let err = GatewayError::from(StateError::InvalidOrExpiredToken);
        let value = serde_json::to_value(Envelope::failure(&err)).unwrap();
        assert_eq!(value["status"], json!("error"));
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["error"]["code"], json!("INVALID_OR_EXPIRED_TOKEN"));
    }

    #[test]
    fn correlation_ids_differ() {
        let a = Envelope::success(1);
        let b = Envelope::success(1);
        assert_ne!(a.correlation_id, b.correlation_id);
    }
}
