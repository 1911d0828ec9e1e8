//! The alert store: the ordered, id-unique collection of known alerts.
//!
//! The store only ever grows at the head. A fresh snapshot is first reduced to
//! the records the store has not seen ([`AlertStore::diff`]), then that batch
//! is prepended ([`AlertStore::merge`]). Because every merged batch comes out
//! of `diff`, no two records in the store ever share an id.
//!
//! ```
//! use stormwatch_core::{AlertRecord, AlertStore};
//!
//! let mut store = AlertStore::new();
//! store.merge(vec![AlertRecord::new("A1", "Flood Watch")]);
//!
//! let snapshot = vec![
//!     AlertRecord::new("A1", "Flood Watch"),
//!     AlertRecord::new("B2", "Tornado Watch"),
//! ];
//! let new = store.diff(&snapshot);
//! assert_eq!(new.len(), 1);
//!
//! store.merge(new);
//! let ids: Vec<_> = store.iter().map(|a| a.id.as_str()).collect();
//! assert_eq!(ids, ["B2", "A1"]);
//! ```

use std::collections::HashSet;

use crate::types::{AlertId, AlertRecord};

/// Ordered collection of known alerts, newest first.
#[derive(Debug, Clone, Default)]
pub struct AlertStore {
    /// Records in display order (most recently merged first)
    alerts: Vec<AlertRecord>,
    /// Index over `alerts` ids for O(1) membership
    ids: HashSet<AlertId>,
}

impl AlertStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of `incoming` whose id is not yet in the store, in `incoming` order.
    ///
    /// A repeated id inside `incoming` is kept only at its first occurrence.
    pub fn diff(&self, incoming: &[AlertRecord]) -> Vec<AlertRecord> {
        diff_against(&self.ids, incoming)
    }

    /// Prepend `new_records` ahead of every existing record.
    ///
    /// `new_records` must come from [`AlertStore::diff`] against this store;
    /// records whose id is already present are dropped rather than duplicated.
    pub fn merge(&mut self, new_records: Vec<AlertRecord>) {
        if new_records.is_empty() {
            return;
        }

        let mut merged = Vec::with_capacity(new_records.len() + self.alerts.len());
        for record in new_records {
            if self.ids.insert(record.id.clone()) {
                merged.push(record);
            } else {
                tracing::debug!(id = %record.id, "dropping duplicate alert on merge");
            }
        }
        merged.append(&mut self.alerts);
        self.alerts = merged;
    }

    /// Discard everything and start over from `snapshot`, deduplicated by id.
    pub fn replace(&mut self, snapshot: &[AlertRecord]) {
        let fresh = diff_against(&HashSet::new(), snapshot);
        self.ids = fresh.iter().map(|a| a.id.clone()).collect();
        self.alerts = fresh;
    }

    /// Record at position `index`, if any.
    pub fn record_at(&self, index: usize) -> Option<&AlertRecord> {
        self.alerts.get(index)
    }

    /// Whether an alert with this id is known.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of known alerts.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Whether the store holds no alerts.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Iterate records in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, AlertRecord> {
        self.alerts.iter()
    }

    /// All records in display order.
    pub fn as_slice(&self) -> &[AlertRecord] {
        &self.alerts
    }
}

fn diff_against(known: &HashSet<AlertId>, incoming: &[AlertRecord]) -> Vec<AlertRecord> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(incoming.len());
    incoming
        .iter()
        .filter(|record| !known.contains(&record.id) && seen.insert(record.id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(records: &[AlertRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn store_ids(store: &AlertStore) -> Vec<&str> {
        store.iter().map(|r| r.id.as_str()).collect()
    }

    fn batch(ids: &[&str]) -> Vec<AlertRecord> {
        ids.iter().map(|id| AlertRecord::new(*id, "Test Event")).collect()
    }

    #[test]
    fn test_diff_keeps_unknown_records_in_incoming_order() {
        let mut store = AlertStore::new();
        store.merge(batch(&["B", "D"]));

        let incoming = batch(&["E", "D", "A", "B", "C"]);
        assert_eq!(ids(&store.diff(&incoming)), ["E", "A", "C"]);
    }

    #[test]
    fn test_diff_against_empty_store_returns_everything() {
        let store = AlertStore::new();
        let incoming = batch(&["A", "B"]);
        assert_eq!(store.diff(&incoming), incoming);
        assert!(store.diff(&[]).is_empty());
    }

    #[test]
    fn test_diff_drops_repeated_ids_within_batch() {
        let store = AlertStore::new();
        assert_eq!(ids(&store.diff(&batch(&["A", "B", "A"]))), ["A", "B"]);
    }

    #[test]
    fn test_flood_watch_then_tornado_watch() {
        let mut store = AlertStore::new();
        store.merge(vec![AlertRecord::new("A1", "Flood Watch")]);

        let incoming = vec![
            AlertRecord::new("A1", "Flood Watch"),
            AlertRecord::new("B2", "Tornado Watch"),
        ];
        let new = store.diff(&incoming);
        assert_eq!(new, vec![AlertRecord::new("B2", "Tornado Watch")]);

        store.merge(new);
        assert_eq!(store_ids(&store), ["B2", "A1"]);
        assert_eq!(store.record_at(0).map(|r| r.event.as_str()), Some("Tornado Watch"));
    }

    #[test]
    fn test_refetching_same_snapshot_yields_empty_diff() {
        let mut store = AlertStore::new();
        let snapshot = batch(&["A", "B", "C"]);

        let first = store.diff(&snapshot);
        store.merge(first);
        assert!(store.diff(&snapshot).is_empty());
    }

    #[test]
    fn test_repeated_merges_never_duplicate_ids() {
        let mut store = AlertStore::new();
        let snapshots = [
            batch(&["A", "B"]),
            batch(&["B", "C", "A"]),
            batch(&["D", "D", "C"]),
            batch(&[]),
            batch(&["E", "A", "F", "B"]),
        ];

        for snapshot in &snapshots {
            let new = store.diff(snapshot);
            store.merge(new);

            let unique: HashSet<&str> = store.iter().map(|r| r.id.as_str()).collect();
            assert_eq!(unique.len(), store.len());
        }
        assert_eq!(store_ids(&store), ["E", "F", "D", "C", "A", "B"]);
    }

    #[test]
    fn test_merge_ignores_records_already_present() {
        let mut store = AlertStore::new();
        store.merge(batch(&["A"]));
        store.merge(batch(&["A", "B"]));
        assert_eq!(store_ids(&store), ["B", "A"]);
    }

    #[test]
    fn test_replace_discards_prior_state() {
        let mut store = AlertStore::new();
        store.merge(batch(&["A", "B"]));

        store.replace(&batch(&["C", "C", "D"]));
        assert_eq!(store_ids(&store), ["C", "D"]);
        assert!(!store.contains("A"));
        assert!(store.contains("D"));
    }

    #[test]
    fn test_replace_with_empty_snapshot() {
        let mut store = AlertStore::new();
        store.merge(batch(&["A"]));

        store.replace(&[]);
        assert!(store.is_empty());
        assert!(store.record_at(0).is_none());
    }
}
