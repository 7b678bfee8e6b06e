//! Recorder operations over a changelog store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use crate::analysis::AnalysisCode;
use crate::metrics::metrics;
use crate::snapshot::{InstanceKey, StoreError};

use super::store::ChangelogStore;

/// Per-instance changelog history, rendered as a single textual timeline
/// for display or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisChangelog {
    pub key: InstanceKey,
    /// `timestamp;code` pairs joined by `,`, oldest first
    pub changelog: String,
}

/// Deduplicates consecutive identical classifications per instance and
/// appends only genuine transitions to the log.
pub struct ChangelogRecorder {
    store: Arc<dyn ChangelogStore>,
    retention_hours: u32,
}

impl ChangelogRecorder {
    pub fn new(store: Arc<dyn ChangelogStore>, retention_hours: u32) -> Self {
        Self {
            store,
            retention_hours,
        }
    }

    /// Record an analysis for an instance. The fence upsert always runs;
    /// a log entry is appended only when the recorded code changed.
    /// Idempotent: repeating the same code for the same key touches
    /// nothing but the fence's row.
    pub fn audit(&self, key: &InstanceKey, analysis: AnalysisCode) -> Result<(), StoreError> {
        let now = Utc::now();
        let changed = self.store.upsert_last_analysis(key, analysis, now)?;
        if !changed {
            return Ok(());
        }
        self.store.append_entry(key, analysis, now)?;
        metrics().record_transition();
        info!(key = %key, analysis = %analysis, "Analysis transition recorded");
        Ok(())
    }

    /// Delete entries older than the retention window
    pub fn expire(&self) -> Result<(), StoreError> {
        let cutoff = Utc::now() - Duration::hours(self.retention_hours as i64);
        let removed = self.store.expire_entries_before(cutoff)?;
        metrics().record_expired(removed);
        if removed > 0 {
            debug!(removed, retention_hours = self.retention_hours, "Expired changelog entries");
        }
        Ok(())
    }

    /// Per-instance transition timelines, oldest entry first
    pub fn read(&self) -> Result<Vec<AnalysisChangelog>, StoreError> {
        let rows = self.store.entries_by_instance()?;
        Ok(rows
            .into_iter()
            .map(|(key, entries)| {
                let changelog = entries
                    .iter()
                    .map(|e| {
                        format!("{};{}", e.timestamp.format("%Y-%m-%d %H:%M:%S"), e.analysis)
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                AnalysisChangelog { key, changelog }
            })
            .collect())
    }
}
