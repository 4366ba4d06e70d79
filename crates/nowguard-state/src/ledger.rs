//! Ledger of records created by seeding, grouped by tag
//!
//! One tag can span several tables. Removal is whole-tag only.

use crate::error::StateError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Records created in one table under a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntry {
    /// Table the records were created in
    pub table: String,
    /// Identifiers of the created records
    pub ids: Vec<String>,
}

/// Tag -> ordered list of seeded entries
#[derive(Debug, Default)]
pub struct SeedLedger {
    inner: Mutex<HashMap<String, Vec<SeedEntry>>>,
}

impl SeedLedger {
    /// Empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag used when a caller does not supply one: `seed-` plus 8 hex chars
    #[must_use]
    pub fn generate_tag() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("seed-{}", &hex[..8])
    }

    /// Append `(table, ids)` under `tag`
    pub fn track(&self, tag: &str, table: &str, ids: Vec<String>) {
        let mut guard = self.inner.lock();
        guard.entry(tag.to_string()).or_default().push(SeedEntry {
            table: table.to_string(),
            ids,
        });
    }

    /// Snapshot of the entries under `tag`
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Vec<SeedEntry>> {
        self.inner.lock().get(tag).cloned()
    }

    /// [`SeedLedger::get`] as a typed result
    ///
    /// # Errors
    /// `StateError::UnknownSeedTag` if nothing is tracked under `tag`.
    pub fn require(&self, tag: &str) -> Result<Vec<SeedEntry>, StateError> {
        self.get(tag)
            .ok_or_else(|| StateError::UnknownSeedTag(tag.to_string()))
    }

    /// Remove everything under `tag`, returning what was removed
    pub fn remove(&self, tag: &str) -> Option<Vec<SeedEntry>> {
        self.inner.lock().remove(tag)
    }

    /// Known tags, sorted
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.inner.lock().keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Number of tags tracked
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no tags are tracked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_accumulates_across_tables() {
        let ledger = SeedLedger::new();
        ledger.track("x", "incident", vec!["a".to_string()]);
        ledger.track("x", "problem", vec!["b".to_string()]);

        let entries = ledger.get("x").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].table, "incident");
        assert_eq!(entries[1].ids, vec!["b".to_string()]);
    }

    #[test]
    fn remove_is_whole_tag() {
        let ledger = SeedLedger::new();
        ledger.track("x", "incident", vec!["a".to_string()]);
        ledger.track("x", "problem", vec!["b".to_string()]);

        let removed = ledger.remove("x").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(ledger.get("x").is_none());
        assert!(ledger.remove("x").is_none());
    }

    #[test]
    fn unknown_tag() {
        let ledger = SeedLedger::new();
        assert!(ledger.get("nope").is_none());
        assert_eq!(
            ledger.require("nope"),
            Err(StateError::UnknownSeedTag("nope".to_string()))
        );
    }

    #[test]
    fn get_returns_snapshot() {
        let ledger = SeedLedger::new();
        ledger.track("t", "incident", vec!["a".to_string()]);
        let snapshot = ledger.get("t").unwrap();
        ledger.track("t", "incident", vec!["b".to_string()]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(ledger.get("t").unwrap().len(), 2);
    }

    #[test]
    fn generated_tags_have_prefix() {
        let tag = SeedLedger::generate_tag();
        assert!(tag.starts_with("seed-"));
        assert_eq!(tag.len(), "seed-".len() + 8);
        assert_ne!(tag, SeedLedger::generate_tag());
    }

    #[test]
    fn tags_are_sorted() {
        let ledger = SeedLedger::new();
        ledger.track("b", "incident", vec![]);
        ledger.track("a", "incident", vec![]);
        assert_eq!(ledger.tags(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(ledger.len(), 2);
    }
}
