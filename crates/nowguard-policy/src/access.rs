//! Table deny-list

use crate::error::PolicyError;

/// Tables that must never be read from or written to
pub const DENIED_TABLES: &[&str] = &[
    "sys_user_has_password",
    "oauth_credential",
    "oauth_entity",
    "sys_certificate",
    "sys_ssh_key",
    "sys_credentials",
    "discovery_credentials",
    "sys_user_token",
];

/// Exact membership test; no prefixes, no wildcards
#[inline]
#[must_use]
pub fn is_denied(table: &str) -> bool {
    DENIED_TABLES.contains(&table)
}

/// Fail with `AccessDenied` if `table` is deny-listed
///
/// # Errors
/// `PolicyError::AccessDenied` for any table in [`DENIED_TABLES`].
pub fn check_table_access(table: &str) -> Result<(), PolicyError> {
    if is_denied(table) {
        return Err(PolicyError::AccessDenied {
            table: table.to_string(),
        });
    }
    Ok(())
}
