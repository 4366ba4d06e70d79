//! Policy violation types

/// A policy decision that blocks the requested operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Table is on the deny-list
    #[error("access to table '{table}' is denied by policy")]
    AccessDenied {
        /// The denied table
        table: String,
    },

    /// Large table queried without a date-bounded filter
    #[error(
        "table '{table}' is large and requires a date-bounded filter \
         (e.g. sys_created_on>=YYYY-MM-DD); add a date field constraint to the query"
    )]
    QuerySafetyViolation {
        /// The large table
        table: String,
    },

    /// Write blocked by environment or deny-list
    #[error("write to table '{table}' is not allowed: {reason}")]
    WriteGatingDenied {
        /// Target table
        table: String,
        /// Why the write was refused
        reason: WriteDenial,
    },
}

impl PolicyError {
    /// Table the violation concerns
    #[inline]
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::AccessDenied { table }
            | Self::QuerySafetyViolation { table }
            | Self::WriteGatingDenied { table, .. } => table,
        }
    }
}

/// Reason a write was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteDenial {
    /// Table is on the deny-list; no override applies
    DeniedTable,
    /// Production environment and no override requested
    ProductionWithoutOverride,
}

impl std::fmt::Display for WriteDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteDenial::DeniedTable => write!(f, "table is on the deny-list"),
            WriteDenial::ProductionWithoutOverride => {
                write!(f, "write operations are blocked in production environments")
            }
        }
    }
}
