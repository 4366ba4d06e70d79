//! Write gating

use crate::access::is_denied;
use crate::config::Environment;
use crate::error::{PolicyError, WriteDenial};

/// Decide whether a write to `table` may proceed
///
/// The deny-list is absolute. Production additionally needs an override.
#[must_use]
pub fn can_write(table: &str, environment: Environment, override_requested: bool) -> bool {
    write_denial(table, environment, override_requested).is_none()
}

/// Reason the write would be refused, if any
#[must_use]
pub fn write_denial(
    table: &str,
    environment: Environment,
    override_requested: bool,
) -> Option<WriteDenial> {
    if is_denied(table) {
        return Some(WriteDenial::DeniedTable);
    }
    if environment.is_production() && !override_requested {
        return Some(WriteDenial::ProductionWithoutOverride);
    }
    None
}

/// [`can_write`] as a typed result
///
/// # Errors
/// `PolicyError::WriteGatingDenied` carrying the [`WriteDenial`] reason.
pub fn require_write(
    table: &str,
    environment: Environment,
    override_requested: bool,
) -> Result<(), PolicyError> {
    match write_denial(table, environment, override_requested) {
        None => Ok(()),
        Some(reason) => Err(PolicyError::WriteGatingDenied {
            table: table.to_string(),
            reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_needs_override() {
        assert!(!can_write("incident", Environment::Prod, false));
        assert!(can_write("incident", Environment::Prod, true));
        assert!(can_write("incident", Environment::Dev, false));
        assert!(can_write("incident", Environment::Test, false));
    }

    #[test]
    fn deny_list_beats_override() {
        assert!(!can_write("oauth_credential", Environment::Dev, true));
        assert!(!can_write("oauth_credential", Environment::Prod, true));
    }

    #[test]
    fn require_write_reports_reason() {
        let err = require_write("incident", Environment::Prod, false).unwrap_err();
        assert_eq!(
            err,
            PolicyError::WriteGatingDenied {
                table: "incident".to_string(),
                reason: WriteDenial::ProductionWithoutOverride,
            }
        );

        let err = require_write("sys_ssh_key", Environment::Dev, false).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::WriteGatingDenied {
                reason: WriteDenial::DeniedTable,
                ..
            }
        ));
    }
}
