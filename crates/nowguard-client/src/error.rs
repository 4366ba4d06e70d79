//! Transport error taxonomy for the remote data client
//!
//! The governance core never retries. Every variant here is surfaced to the
//! immediate caller, except where an investigation drops an optional
//! contributor.

/// Errors a remote data call can fail with
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Credentials were rejected (401)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted (403)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Table or record does not exist (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// Remote failed internally (5xx)
    #[error("server error: {0}")]
    ServerError(String),

    /// Any other non-success status
    #[error("request failed with status {status}: {message}")]
    Request {
        /// Status code reported by the transport
        status: u16,
        /// Message extracted from the response body
        message: String,
    },
}

impl ClientError {
    /// Classify a status code and message into a variant
    ///
    /// Mirrors how the transport maps HTTP responses: 401, 403, 404 and
    /// 5xx get dedicated variants, anything else becomes `Request`.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            500..=599 => Self::ServerError(message),
            _ => Self::Request { status, message },
        }
    }

    /// Status code associated with this error
    #[inline]
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::ServerError(_) => 500,
            Self::Request { status, .. } => *status,
        }
    }

    /// Whether the error is an authentication or authorization failure
    #[inline]
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Forbidden(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_classifies() {
        assert!(matches!(
            ClientError::from_status(401, "bad creds"),
            ClientError::Unauthorized(_)
        ));
        assert!(matches!(
            ClientError::from_status(403, "nope"),
            ClientError::Forbidden(_)
        ));
        assert!(matches!(
            ClientError::from_status(404, "missing"),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            ClientError::from_status(503, "down"),
            ClientError::ServerError(_)
        ));
        assert_eq!(
            ClientError::from_status(429, "slow down"),
            ClientError::Request {
                status: 429,
                message: "slow down".to_string()
            }
        );
    }

    #[test]
    fn status_round_trips_for_request() {
        let err = ClientError::from_status(409, "conflict");
        assert_eq!(err.status(), 409);
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn auth_predicate() {
        assert!(ClientError::Unauthorized(String::new()).is_auth());
        assert!(ClientError::Forbidden(String::new()).is_auth());
        assert!(!ClientError::NotFound(String::new()).is_auth());
    }
}
