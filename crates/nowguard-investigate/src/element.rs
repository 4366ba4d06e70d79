//! Element identifiers carried by findings

use crate::error::{InvestigationError, Result};
use std::fmt;
use std::str::FromStr;

/// What a finding points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementId {
    /// One record, encoded `"<table>:<id>"`
    Record {
        /// Table holding the record
        table: String,
        /// Record identifier
        id: String,
    },
    /// A whole table, encoded as the bare table name
    Table(String),
}

impl ElementId {
    /// Parse the wire form
    ///
    /// # Errors
    /// `InvalidInput` when either half of a `table:id` pair is blank or
    /// the whole string is blank.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((table, id)) => {
                let (table, id) = (table.trim(), id.trim());
                if table.is_empty() || id.is_empty() {
                    return Err(InvestigationError::InvalidInput(format!(
                        "element id '{raw}' must be '<table>:<id>'"
                    )));
                }
                Ok(Self::Record {
                    table: table.to_string(),
                    id: id.to_string(),
                })
            }
            None if raw.is_empty() => Err(InvestigationError::InvalidInput(
                "element id is empty".to_string(),
            )),
            None => Ok(Self::Table(raw.to_string())),
        }
    }

    /// Parse, requiring the `table:id` form
    ///
    /// # Errors
    /// `InvalidInput` for table-level or malformed identifiers.
    pub fn parse_record(raw: &str) -> Result<(String, String)> {
        match Self::parse(raw)? {
            Self::Record { table, id } => Ok((table, id)),
            Self::Table(_) => Err(InvestigationError::InvalidInput(format!(
                "element id '{raw}' must be '<table>:<id>'"
            ))),
        }
    }

    /// Table the element lives in
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::Record { table, .. } | Self::Table(table) => table,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record { table, id } => write!(f, "{table}:{id}"),
            Self::Table(table) => f.write_str(table),
        }
    }
}

impl FromStr for ElementId {
    type Err = InvestigationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
