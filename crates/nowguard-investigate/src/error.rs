//! Error types for the investigation framework

use nowguard_client::ClientError;
use thiserror::Error;

/// Errors surfaced by `run` and `explain`
///
/// Failures of optional contributors never appear here; they are logged
/// and the contributor is treated as having found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvestigationError {
    /// Name not present in the registry
    #[error("Unknown investigation '{name}'. Available: {}", .available.join(", "))]
    UnknownInvestigation {
        /// Name as supplied
        name: String,
        /// Valid names, sorted
        available: Vec<&'static str>,
    },

    /// Malformed parameter or element identifier
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A mandatory remote call failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Result alias for investigation operations
pub type Result<T, E = InvestigationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_lists_available_names() {
        let err = InvestigationError::UnknownInvestigation {
            name: "nope".to_string(),
            available: vec!["acl_conflicts", "error_analysis"],
        };
        assert_eq!(
            err.to_string(),
            "Unknown investigation 'nope'. Available: acl_conflicts, error_analysis"
        );
    }

    #[test]
    fn client_errors_convert() {
        let err: InvestigationError = ClientError::NotFound("syslog/abc".into()).into();
        assert!(matches!(err, InvestigationError::Client(ClientError::NotFound(_))));
    }
}
