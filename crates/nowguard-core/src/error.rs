//! Error types for the gateway
//!
//! Unifies the per-crate errors:
//! - Policy violations (deny-list, query safety, write gating)
//! - Workflow state failures (tokens, seed tags)
//! - Remote client failures, passed through verbatim
//! - Investigation failures
//! - Caller input and configuration problems

use nowguard_client::ClientError;
use nowguard_investigate::InvestigationError;
use nowguard_policy::{PolicyError, UnknownEnvironment};
use nowguard_state::StateError;

/// Main gateway error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Blocked by policy
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Preview token or seed ledger failure
    #[error(transparent)]
    State(#[from] StateError),

    /// Remote call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Investigation failed
    #[error(transparent)]
    Investigation(#[from] InvestigationError),

    /// Caller supplied something unusable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether a policy decision blocked the operation
    #[inline]
    #[must_use]
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, Self::Policy(_))
    }

    /// Whether the remote client failed, directly or inside an investigation
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Client(_) | Self::Investigation(InvestigationError::Client(_))
        )
    }

    /// Stable machine-readable code for response envelopes
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Policy(PolicyError::AccessDenied { .. }) => "ACCESS_DENIED",
            Self::Policy(PolicyError::QuerySafetyViolation { .. }) => "QUERY_SAFETY_VIOLATION",
            Self::Policy(PolicyError::WriteGatingDenied { .. }) => "WRITE_GATING_DENIED",
            Self::State(StateError::InvalidOrExpiredToken) => "INVALID_OR_EXPIRED_TOKEN",
            Self::State(StateError::UnknownSeedTag(_)) => "UNKNOWN_SEED_TAG",
            Self::Client(err) | Self::Investigation(InvestigationError::Client(err)) => {
                client_code(err)
            }
            Self::Investigation(InvestigationError::UnknownInvestigation { .. }) => "NOT_FOUND",
            Self::State(StateError::MalformedToken(_))
            | Self::Investigation(InvestigationError::InvalidInput(_))
            | Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

fn client_code(err: &ClientError) -> &'static str {
    match err {
        ClientError::Unauthorized(_) => "UNAUTHORIZED",
        ClientError::Forbidden(_) => "FORBIDDEN",
        ClientError::NotFound(_) => "NOT_FOUND",
        ClientError::ServerError(_) => "SERVER_ERROR",
        ClientError::Request { .. } => "REQUEST_ERROR",
    }
}

impl From<UnknownEnvironment> for GatewayError {
    fn from(err: UnknownEnvironment) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result alias for gateway operations
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;
