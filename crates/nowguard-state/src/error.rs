//! Workflow state errors

/// Failures surfaced by the workflow state layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Token string is not a well-formed token
    #[error("malformed preview token: '{0}'")]
    MalformedToken(String),

    /// Token unknown, already consumed, or past its TTL
    #[error("invalid or expired preview token")]
    InvalidOrExpiredToken,

    /// No records tracked under this seed tag
    #[error("no records found for seed tag '{0}'")]
    UnknownSeedTag(String),
}
