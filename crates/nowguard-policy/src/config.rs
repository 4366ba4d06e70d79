//! Configuration surface consumed by the policy engine
//!
//! Loading (files, environment) happens in the gateway crate; this module
//! only defines the shape and its defaults.

use crate::safety::{QuerySafetyPolicy, DATE_FIELDS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tables treated as high-volume unless configured otherwise
pub const DEFAULT_LARGE_TABLES: &[&str] =
    &["syslog", "sys_audit", "sys_log_transaction", "sys_email_log"];

/// Default global row cap
pub const DEFAULT_MAX_ROW_LIMIT: usize = 100;

/// Deployment environment of the remote instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development instance
    #[default]
    Dev,
    /// Test or staging instance
    Test,
    /// Production instance; writes need an override
    Prod,
}

impl Environment {
    /// Whether writes are gated
    #[inline]
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Prod)
    }

    /// Canonical short name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized environment name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}' (expected dev, test or prod)")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "test" | "staging" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}

/// Policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Global cap on rows returned by any query
    pub max_row_limit: usize,
    /// Tables that require a date-bounded filter
    pub large_table_names: Vec<String>,
    /// Environment of the remote instance
    pub environment: Environment,
    /// Treat every production write as if an override was requested
    pub allow_writes_in_prod: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_row_limit: DEFAULT_MAX_ROW_LIMIT,
            large_table_names: DEFAULT_LARGE_TABLES.iter().map(|t| (*t).to_string()).collect(),
            environment: Environment::Dev,
            allow_writes_in_prod: false,
        }
    }
}

impl PolicyConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With row cap
    #[inline]
    #[must_use]
    pub fn with_max_row_limit(mut self, limit: usize) -> Self {
        self.max_row_limit = limit;
        self
    }

    /// With large tables
    #[must_use]
    pub fn with_large_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.large_table_names = tables.into_iter().map(Into::into).collect();
        self
    }

    /// With environment
    #[inline]
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Allow production writes without per-request override
    #[inline]
    #[must_use]
    pub fn with_writes_in_prod(mut self, allow: bool) -> Self {
        self.allow_writes_in_prod = allow;
        self
    }

    /// Whether the target is production
    #[inline]
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Derive the per-request query safety policy
    #[must_use]
    pub fn query_safety(&self) -> QuerySafetyPolicy {
        QuerySafetyPolicy {
            max_row_limit: self.max_row_limit,
            large_table_names: self.large_table_names.iter().cloned().collect(),
            date_fields: DATE_FIELDS,
        }
    }

    /// Write decision with the configured blanket override folded in
    #[must_use]
    pub fn can_write(&self, table: &str, override_requested: bool) -> bool {
        crate::write::can_write(
            table,
            self.environment,
            override_requested || self.allow_writes_in_prod,
        )
    }
}
