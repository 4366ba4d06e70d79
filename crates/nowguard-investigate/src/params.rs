//! Typed access to free-form investigation parameters

use crate::error::{InvestigationError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Parameters passed to an investigation's `run`
///
/// Callers hand over an arbitrary JSON object. Numeric parameters accept
/// either numbers or numeric strings, since both show up in practice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestigationParams(Map<String, Value>);

impl InvestigationParams {
    /// Empty parameter set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing JSON object
    #[inline]
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Accept any JSON value; `null` is treated as no parameters
    ///
    /// # Errors
    /// `InvalidInput` if the value is neither an object nor `null`.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self(map)),
            other => Err(InvestigationError::InvalidInput(format!(
                "params must be a JSON object, got {other}"
            ))),
        }
    }

    /// Set a parameter
    #[inline]
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Non-blank string parameter
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Unsigned integer parameter, or `default` when absent
    ///
    /// # Errors
    /// `InvalidInput` when present but not a non-negative integer.
    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64> {
        let invalid = |raw: &Value| {
            InvestigationError::InvalidInput(format!(
                "parameter '{key}' must be a non-negative integer, got {raw}"
            ))
        };
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(raw @ Value::Number(n)) => n.as_u64().ok_or_else(|| invalid(raw)),
            Some(raw @ Value::String(s)) => s.trim().parse().map_err(|_| invalid(raw)),
            Some(raw) => Err(invalid(raw)),
        }
    }

    /// Same as [`u64_or`](Self::u64_or), sized for row limits
    ///
    /// # Errors
    /// `InvalidInput` when present but not a non-negative integer.
    pub fn usize_or(&self, key: &str, default: usize) -> Result<usize> {
        let value = self.u64_or(key, default as u64)?;
        Ok(usize::try_from(value).unwrap_or(usize::MAX))
    }

    /// Comma separated set; `None` when absent or blank
    #[must_use]
    pub fn csv_set(&self, key: &str) -> Option<BTreeSet<String>> {
        let set: BTreeSet<String> = self
            .str(key)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!set.is_empty()).then_some(set)
    }

    /// Raw JSON object
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for InvestigationParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
