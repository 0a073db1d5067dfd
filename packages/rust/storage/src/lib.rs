//! Run-scoped evidence store.
//!
//! The harvest stage writes a run's evidence, the synthesize stage reads
//! it back, and the export stage evicts it once the bundle is written.
//! [`EvidenceStore`] is a cheap-to-clone handle; every component that needs
//! evidence receives the handle explicitly.
//!
//! **Lifecycle:**
//! - gather: [`EvidenceStore::put`]
//! - synthesize: [`EvidenceStore::get`]
//! - after export: [`EvidenceStore::evict`] (or [`EvidenceStore::prune_older_than`])

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::debug;

use researchdesk_shared::{EvidenceItem, ResearchDeskError, Result, RunId};

/// Evidence stored for one run.
#[derive(Debug, Clone)]
struct RunEntry {
    evidence: Vec<EvidenceItem>,
    stored_at: DateTime<Utc>,
}

/// Shared, thread-safe map from run id to harvested evidence.
#[derive(Debug, Clone, Default)]
pub struct EvidenceStore {
    runs: Arc<RwLock<HashMap<RunId, RunEntry>>>,
}

impl EvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) the evidence for a run.
    pub fn put(&self, run_id: &RunId, evidence: Vec<EvidenceItem>) -> Result<()> {
        if run_id.as_str().trim().is_empty() {
            return Err(ResearchDeskError::Storage(
                "cannot store evidence under an empty run id".into(),
            ));
        }

        debug!(%run_id, items = evidence.len(), "storing run evidence");
        self.runs.write().insert(
            run_id.clone(),
            RunEntry {
                evidence,
                stored_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Evidence for a run; empty when the run is unknown.
    pub fn get(&self, run_id: &RunId) -> Vec<EvidenceItem> {
        self.runs
            .read()
            .get(run_id)
            .map(|entry| entry.evidence.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, run_id: &RunId) -> bool {
        self.runs.read().contains_key(run_id)
    }

    /// Remove a run's evidence, returning it if present.
    pub fn evict(&self, run_id: &RunId) -> Option<Vec<EvidenceItem>> {
        let removed = self.runs.write().remove(run_id).map(|entry| entry.evidence);
        if removed.is_some() {
            debug!(%run_id, "evicted run evidence");
        }
        removed
    }

    /// Drop every run stored longer than `max_age` ago. Returns how many were removed.
    pub fn prune_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut runs = self.runs.write();
        let before = runs.len();
        runs.retain(|_, entry| entry.stored_at >= cutoff);
        let removed = before - runs.len();
        if removed > 0 {
            debug!(removed, "pruned stale runs");
        }
        removed
    }

    /// Number of runs currently held.
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<EvidenceItem> {
        vec![
            EvidenceItem::new("https://example.com/a", "A", "First quote."),
            EvidenceItem::new("https://example.com/b", "B", "Second quote."),
        ]
    }

    #[test]
    fn put_then_get() {
        let store = EvidenceStore::new();
        let run = RunId::from("run-1");
        store.put(&run, sample()).expect("put");

        assert!(store.contains(&run));
        assert_eq!(store.get(&run), sample());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_run_is_empty() {
        let store = EvidenceStore::new();
        assert!(store.get(&RunId::from("missing")).is_empty());
        assert!(!store.contains(&RunId::from("missing")));
    }

    #[test]
    fn put_replaces_previous_evidence() {
        let store = EvidenceStore::new();
        let run = RunId::from("run-1");
        store.put(&run, sample()).expect("put");
        store.put(&run, vec![]).expect("put again");
        assert!(store.get(&run).is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_run_id_is_rejected() {
        let store = EvidenceStore::new();
        let err = store.put(&RunId::from("  "), sample()).unwrap_err();
        assert!(err.to_string().contains("empty run id"));
        assert!(store.is_empty());
    }

    #[test]
    fn evict_removes_once() {
        let store = EvidenceStore::new();
        let run = RunId::from("run-1");
        store.put(&run, sample()).expect("put");

        assert_eq!(store.evict(&run), Some(sample()));
        assert!(store.evict(&run).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_state() {
        let store = EvidenceStore::new();
        let handle = store.clone();
        let run = RunId::from("shared");
        handle.put(&run, sample()).expect("put");
        assert_eq!(store.get(&run).len(), 2);
    }

    #[test]
    fn prune_keeps_fresh_runs() {
        let store = EvidenceStore::new();
        store.put(&RunId::from("fresh"), sample()).expect("put");
        assert_eq!(store.prune_older_than(Duration::hours(1)), 0);
        assert_eq!(store.len(), 1);
        assert_eq!(store.prune_older_than(Duration::seconds(-1)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_writers() {
        let store = EvidenceStore::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .put(&RunId::from(format!("run-{i}")), sample())
                        .expect("put");
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }
        assert_eq!(store.len(), 8);
    }
}
