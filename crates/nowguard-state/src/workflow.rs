//! Injectable workflow state service
//!
//! Constructed once at startup and shared behind an `Arc` by every handler
//! that runs a preview/apply or seed/cleanup workflow.

use crate::ledger::SeedLedger;
use crate::preview::{PreviewTokenStore, DEFAULT_PREVIEW_TTL};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// A previewed update waiting to be applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdate {
    /// Target table
    pub table: String,
    /// Target record identifier
    pub id: String,
    /// Field changes to write
    pub changes: Map<String, Value>,
}

/// Both workflow stores behind one owner
#[derive(Debug)]
pub struct WorkflowState {
    previews: PreviewTokenStore<PendingUpdate>,
    seeds: SeedLedger,
}

impl WorkflowState {
    /// State with the given preview TTL
    #[must_use]
    pub fn new(preview_ttl: Duration) -> Self {
        Self {
            previews: PreviewTokenStore::new(preview_ttl),
            seeds: SeedLedger::new(),
        }
    }

    /// Preview token store
    #[inline]
    #[must_use]
    pub fn previews(&self) -> &PreviewTokenStore<PendingUpdate> {
        &self.previews
    }

    /// Seed ledger
    #[inline]
    #[must_use]
    pub fn seeds(&self) -> &SeedLedger {
        &self.seeds
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_TTL)
    }
}
