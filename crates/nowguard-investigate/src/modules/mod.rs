//! Built-in investigations, one per [`InvestigationKind`](crate::InvestigationKind)

pub mod acl_conflicts;
pub mod deprecated_apis;
pub mod error_analysis;
pub mod performance_bottlenecks;
pub mod slow_transactions;
pub mod stale_automations;
pub mod table_health;
