//! Investigation registry
//!
//! Each investigation is a unit struct implementing [`Investigation`],
//! keyed by an [`InvestigationKind`]. Adding a module means adding a
//! variant; the exhaustive match in [`registry`] refuses to compile until it
//! is wired up.

use crate::error::{InvestigationError, Result};
use crate::modules::{
    acl_conflicts::AclConflictDetector, deprecated_apis::DeprecatedApiScan,
    error_analysis::ErrorClustering, performance_bottlenecks::BottleneckScan,
    slow_transactions::SlowTransactionScan, stale_automations::StaleAutomationScan,
    table_health::TableHealthReport,
};
use crate::params::InvestigationParams;
use crate::result::{ExplanationResult, InvestigationResult};
use nowguard_client::RemoteDataClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Registered investigations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationKind {
    /// Stuck flows, disabled scripts, stale jobs
    StaleAutomations,
    /// Deprecated API patterns in script bodies
    DeprecatedApis,
    /// Automation density and errors for one table
    TableHealth,
    /// Same-name ACLs with differing conditions
    AclConflicts,
    /// Error-level syslog entries clustered by source
    ErrorAnalysis,
    /// Rows from the performance pattern tables
    SlowTransactions,
    /// Heavy automation, frequent jobs, long-running flows
    PerformanceBottlenecks,
}

impl InvestigationKind {
    /// Every registered kind
    pub const ALL: [Self; 7] = [
        Self::StaleAutomations,
        Self::DeprecatedApis,
        Self::TableHealth,
        Self::AclConflicts,
        Self::ErrorAnalysis,
        Self::SlowTransactions,
        Self::PerformanceBottlenecks,
    ];

    /// Registry name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StaleAutomations => "stale_automations",
            Self::DeprecatedApis => "deprecated_apis",
            Self::TableHealth => "table_health",
            Self::AclConflicts => "acl_conflicts",
            Self::ErrorAnalysis => "error_analysis",
            Self::SlowTransactions => "slow_transactions",
            Self::PerformanceBottlenecks => "performance_bottlenecks",
        }
    }

    /// Registry names, sorted
    #[must_use]
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<_> = Self::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// The implementation behind this kind
    #[inline]
    #[must_use]
    pub fn investigation(self) -> &'static dyn Investigation {
        registry(self)
    }
}

impl fmt::Display for InvestigationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestigationKind {
    type Err = InvestigationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| InvestigationError::UnknownInvestigation {
                name: s.to_string(),
                available: Self::names(),
            })
    }
}

/// A read-only analytical scan with drill-down
///
/// `run` must tolerate missing remote data: optional sub-queries that fail
/// are skipped. `explain` always re-fetches from the remote.
#[async_trait::async_trait]
pub trait Investigation: Send + Sync {
    /// Registry key
    fn kind(&self) -> InvestigationKind;

    /// Scan and return ranked findings
    async fn run(
        &self,
        client: &dyn RemoteDataClient,
        params: &InvestigationParams,
    ) -> Result<InvestigationResult>;

    /// Context for one finding's element id
    async fn explain(
        &self,
        client: &dyn RemoteDataClient,
        element_id: &str,
    ) -> Result<ExplanationResult>;
}

/// Look up the implementation for `kind`
#[must_use]
pub fn registry(kind: InvestigationKind) -> &'static dyn Investigation {
    match kind {
        InvestigationKind::StaleAutomations => &StaleAutomationScan,
        InvestigationKind::DeprecatedApis => &DeprecatedApiScan,
        InvestigationKind::TableHealth => &TableHealthReport,
        InvestigationKind::AclConflicts => &AclConflictDetector,
        InvestigationKind::ErrorAnalysis => &ErrorClustering,
        InvestigationKind::SlowTransactions => &SlowTransactionScan,
        InvestigationKind::PerformanceBottlenecks => &BottleneckScan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in InvestigationKind::ALL {
            assert_eq!(kind.as_str().parse::<InvestigationKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.to_string())
            );
        }
    }

    #[test]
    fn registry_matches_kind() {
        for kind in InvestigationKind::ALL {
            assert_eq!(registry(kind).kind(), kind);
        }
    }

    #[test]
    fn unknown_name_lists_sorted_names() {
        let err = "bogus".parse::<InvestigationKind>().unwrap_err();
        match err {
            InvestigationError::UnknownInvestigation { name, available } => {
                assert_eq!(name, "bogus");
                assert_eq!(available.first(), Some(&"acl_conflicts"));
                assert_eq!(available.len(), 7);
                assert!(available.windows(2).all(|w| w[0] < w[1]));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
