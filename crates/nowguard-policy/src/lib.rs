//! nowguard policy - pure access and safety decisions
//!
//! Every table access in the gateway passes through here:
//! - Deny-list checks for reads and writes
//! - Row-limit capping and date-filter requirements for large tables
//! - Sensitive field masking on returned records
//! - Write gating by environment
//!
//! Nothing in this crate performs I/O or keeps mutable state, so it is safe
//! to call from any number of concurrent handlers.
//!
//! # Example
//!
//! ```rust
//! use nowguard_policy::{enforce_query_safety, PolicyConfig};
//!
//! let config = PolicyConfig::new().with_max_row_limit(50);
//! let safe = enforce_query_safety("incident", "active=true", Some(500), &config.query_safety())
//!     .unwrap();
//! assert_eq!(safe.effective_limit, 50);
//! ```

#![warn(unreachable_pub)]

pub mod access;
pub mod config;
pub mod error;
pub mod masking;
pub mod safety;
pub mod write;

pub use access::{check_table_access, is_denied, DENIED_TABLES};
pub use config::{Environment, PolicyConfig, UnknownEnvironment, DEFAULT_LARGE_TABLES};
pub use error::{PolicyError, WriteDenial};
pub use masking::{is_sensitive_field, mask_sensitive_fields, MASK_VALUE};
pub use safety::{enforce_query_safety, QuerySafetyPolicy, SafeQuery, DATE_FIELDS};
pub use write::{can_write, require_write};
