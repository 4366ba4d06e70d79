//! Gateway configuration
//!
//! Loaded from TOML, then optionally overlaid with environment variables.
//! Every field has a default, so an empty document is a valid config.

use crate::error::{GatewayError, Result};
use nowguard_policy::{Environment, PolicyConfig};
use nowguard_state::DEFAULT_PREVIEW_TTL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the target environment
pub const ENV_ENVIRONMENT: &str = "SERVICENOW_ENV";
/// Environment variable overriding the row cap
pub const ENV_MAX_ROW_LIMIT: &str = "MAX_ROW_LIMIT";
/// Environment variable listing large tables, comma separated
pub const ENV_LARGE_TABLES: &str = "LARGE_TABLE_NAMES_CSV";
/// Environment variable enabling production writes
pub const ENV_ALLOW_WRITES_IN_PROD: &str = "ALLOW_WRITES_IN_PROD";
/// Environment variable overriding the preview token TTL, in seconds
pub const ENV_PREVIEW_TTL: &str = "PREVIEW_TOKEN_TTL_SECS";

/// Workflow state settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Preview token lifetime in seconds
    pub preview_ttl_secs: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            preview_ttl_secs: DEFAULT_PREVIEW_TTL.as_secs(),
        }
    }
}

impl StateConfig {
    /// Preview token lifetime
    #[inline]
    #[must_use]
    pub fn preview_ttl(&self) -> Duration {
        Duration::from_secs(self.preview_ttl_secs)
    }
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Policy engine settings
    pub policy: PolicyConfig,
    /// Workflow state settings
    pub state: StateConfig,
}

impl GatewayConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With policy settings
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// With preview token TTL
    #[inline]
    #[must_use]
    pub fn with_preview_ttl(mut self, ttl: Duration) -> Self {
        self.state.preview_ttl_secs = ttl.as_secs();
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `GatewayError::Config` on malformed TOML or wrongly typed fields.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GatewayError::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `GatewayError::Config` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading gateway configuration");
        let text = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Overlay values found through `lookup`
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`; tests pass a map.
    ///
    /// # Errors
    /// `GatewayError::Config` when a variable is set to an unparseable value.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ENVIRONMENT) {
            self.policy.environment = raw.parse::<Environment>()?;
        }
        if let Some(raw) = lookup(ENV_MAX_ROW_LIMIT) {
            self.policy.max_row_limit = parse_number(ENV_MAX_ROW_LIMIT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LARGE_TABLES) {
            self.policy.large_table_names = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = lookup(ENV_ALLOW_WRITES_IN_PROD) {
            self.policy.allow_writes_in_prod = parse_bool(ENV_ALLOW_WRITES_IN_PROD, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PREVIEW_TTL) {
            self.state.preview_ttl_secs = parse_number(ENV_PREVIEW_TTL, &raw)?;
        }
        Ok(self)
    }

    /// [`with_env_overrides`](Self::with_env_overrides) over the process environment
    ///
    /// # Errors
    /// `GatewayError::Config` when a variable is set to an unparseable value.
    pub fn from_env(self) -> Result<Self> {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| GatewayError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(GatewayError::Config(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_document_is_default() {
        let config = GatewayConfig::from_toml_str("").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.policy.max_row_limit, 100);
        assert_eq!(config.state.preview_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn toml_sections() {
        let config = GatewayConfig::from_toml_str(
            r#"
            [policy]
            max_row_limit = 25
            environment = "prod"
            large_table_names = ["syslog"]

            [state]
            preview_ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.policy.max_row_limit, 25);
        assert!(config.policy.is_production());
        assert_eq!(config.policy.large_table_names, vec!["syslog".to_string()]);
        assert_eq!(config.state.preview_ttl_secs, 60);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = GatewayConfig::from_toml_str("[policy]\nmax_row_limit = \"lots\"").unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let config = GatewayConfig::new()
            .with_env_overrides(lookup(&[
                ("SERVICENOW_ENV", "Production"),
                ("MAX_ROW_LIMIT", "10"),
                ("LARGE_TABLE_NAMES_CSV", "syslog, ,sys_audit"),
                ("ALLOW_WRITES_IN_PROD", "TRUE"),
                ("PREVIEW_TOKEN_TTL_SECS", "30"),
            ]))
            .unwrap();
        assert_eq!(config.policy.environment, Environment::Prod);
        assert_eq!(config.policy.max_row_limit, 10);
        assert_eq!(
            config.policy.large_table_names,
            vec!["syslog".to_string(), "sys_audit".to_string()]
        );
        assert!(config.policy.allow_writes_in_prod);
        assert_eq!(config.state.preview_ttl_secs, 30);
    }

    #[test]
    fn bad_env_values_are_config_errors() {
        for pair in [
            ("SERVICENOW_ENV", "moon"),
            ("MAX_ROW_LIMIT", "-5"),
            ("ALLOW_WRITES_IN_PROD", "maybe"),
            ("PREVIEW_TOKEN_TTL_SECS", "soon"),
        ] {
            let err = GatewayConfig::new()
                .with_env_overrides(lookup(&[pair]))
                .unwrap_err();
            assert!(matches!(err, GatewayError::Config(_)), "{pair:?}");
        }
    }
}
