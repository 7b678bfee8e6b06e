//! Changelog persistence: the per-instance fence and the transition log.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::analysis::AnalysisCode;
use crate::snapshot::{InstanceKey, StoreError};

/// The most recently recorded code for an instance. Created on first
/// analysis, overwritten on change, never deleted individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastAnalysis {
    pub analysis: AnalysisCode,
    pub timestamp: DateTime<Utc>,
}

/// One recorded transition. Immutable once written; destroyed only by
/// time-based expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub key: InstanceKey,
    pub timestamp: DateTime<Utc>,
    pub analysis: AnalysisCode,
}

/// Storage contract for the fence and the log. The fence upsert must be
/// atomic per key against concurrent writers: last-writer-wins on the
/// code, timestamp preserved when the code is unchanged. Keys never
/// interact, so no cross-key locking is required of implementations.
pub trait ChangelogStore: Send + Sync {
    /// Upsert the fence for a key. Returns true when the recorded code
    /// changed (including first sight of the key); a same-code upsert
    /// leaves the stored timestamp untouched.
    fn upsert_last_analysis(
        &self,
        key: &InstanceKey,
        analysis: AnalysisCode,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    fn last_analysis(&self, key: &InstanceKey) -> Result<Option<LastAnalysis>, StoreError>;

    fn append_entry(
        &self,
        key: &InstanceKey,
        analysis: AnalysisCode,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Delete entries strictly older than the cutoff; returns how many
    /// were removed
    fn expire_entries_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// All entries grouped per instance, each group in insertion order
    /// (sequence number, not wall clock, so ordering is stable under
    /// identical timestamps). Groups sorted by key.
    fn entries_by_instance(&self)
        -> Result<Vec<(InstanceKey, Vec<ChangelogEntry>)>, StoreError>;
}

struct SequencedEntry {
    seq: u64,
    entry: ChangelogEntry,
}

/// In-memory changelog store. Fence upserts go through the map's entry
/// API, which holds the key's shard lock across the read-compare-write,
/// satisfying the atomicity contract.
#[derive(Default)]
pub struct MemoryChangelogStore {
    fences: DashMap<InstanceKey, LastAnalysis>,
    entries: RwLock<Vec<SequencedEntry>>,
    next_seq: AtomicU64,
}

impl MemoryChangelogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangelogStore for MemoryChangelogStore {
    fn upsert_last_analysis(
        &self,
        key: &InstanceKey,
        analysis: AnalysisCode,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut changed = false;
        self.fences
            .entry(key.clone())
            .and_modify(|fence| {
                if fence.analysis != analysis {
                    fence.analysis = analysis;
                    fence.timestamp = now;
                    changed = true;
                }
            })
            .or_insert_with(|| {
                changed = true;
                LastAnalysis {
                    analysis,
                    timestamp: now,
                }
            });
        Ok(changed)
    }

    fn last_analysis(&self, key: &InstanceKey) -> Result<Option<LastAnalysis>, StoreError> {
        Ok(self.fences.get(key).map(|fence| fence.clone()))
    }

    fn append_entry(
        &self,
        key: &InstanceKey,
        analysis: AnalysisCode,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.entries.write().push(SequencedEntry {
            seq,
            entry: ChangelogEntry {
                key: key.clone(),
                timestamp: now,
                analysis,
            },
        });
        Ok(())
    }

    fn expire_entries_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.entry.timestamp >= cutoff);
        Ok((before - entries.len()) as u64)
    }

    fn entries_by_instance(
        &self,
    ) -> Result<Vec<(InstanceKey, Vec<ChangelogEntry>)>, StoreError> {
        let entries = self.entries.read();
        let mut ordered: Vec<&SequencedEntry> = entries.iter().collect();
        ordered.sort_by_key(|e| e.seq);

        let mut grouped: std::collections::BTreeMap<InstanceKey, Vec<ChangelogEntry>> =
            std::collections::BTreeMap::new();
        for sequenced in ordered {
            grouped
                .entry(sequenced.entry.key.clone())
                .or_default()
                .push(sequenced.entry.clone());
        }
        Ok(grouped.into_iter().collect())
    }
}
