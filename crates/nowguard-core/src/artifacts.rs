//! Toggleable developer artifacts and their backing tables

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Artifact kinds that carry an `active` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    /// Server-side business rule
    BusinessRule,
    /// Reusable server script
    ScriptInclude,
    /// Form UI policy
    UiPolicy,
    /// Form button or link
    UiAction,
    /// Browser-side form script
    ClientScript,
    /// Scheduled script execution
    ScheduledJob,
    /// One-off fix script
    FixScript,
}

impl ArtifactType {
    /// Every artifact type
    pub const ALL: [Self; 7] = [
        Self::BusinessRule,
        Self::ScriptInclude,
        Self::UiPolicy,
        Self::UiAction,
        Self::ClientScript,
        Self::ScheduledJob,
        Self::FixScript,
    ];

    /// Snake-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BusinessRule => "business_rule",
            Self::ScriptInclude => "script_include",
            Self::UiPolicy => "ui_policy",
            Self::UiAction => "ui_action",
            Self::ClientScript => "client_script",
            Self::ScheduledJob => "scheduled_job",
            Self::FixScript => "fix_script",
        }
    }

    /// Remote table holding artifacts of this type
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::BusinessRule => "sys_script",
            Self::ScriptInclude => "sys_script_include",
            Self::UiPolicy => "sys_ui_policy",
            Self::UiAction => "sys_ui_action",
            Self::ClientScript => "sys_script_client",
            Self::ScheduledJob => "sysauto_script",
            Self::FixScript => "sys_script_fix",
        }
    }

    /// Sorted names, for error messages
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<_> = Self::ALL.iter().map(|t| t.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                GatewayError::InvalidInput(format!(
                    "Unknown artifact type '{s}'. Valid types: {}",
                    Self::names().join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_and_map_to_tables() {
        for kind in ArtifactType::ALL {
            assert_eq!(kind.as_str().parse::<ArtifactType>().unwrap(), kind);
        }
        assert_eq!(ArtifactType::BusinessRule.table(), "sys_script");
        assert_eq!(ArtifactType::ScheduledJob.table(), "sysauto_script");
    }

    #[test]
    fn unknown_type_lists_valid_ones() {
        let err = "widget".parse::<ArtifactType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: Unknown artifact type 'widget'. Valid types: business_rule, client_script, fix_script, scheduled_job, script_include, ui_action, ui_policy"
        );
    }
}
