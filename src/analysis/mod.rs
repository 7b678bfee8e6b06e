//! Replication analysis pipeline.
//!
//! Wires the aggregator, classifier, suppression filter and changelog
//! recorder into the operations the external scheduler invokes each
//! polling cycle. A pass either completes with a result set or fails
//! outright; the scheduler simply retries on the next cycle.

mod aggregate;
mod classify;
mod filter;

pub use aggregate::{aggregate_snapshot, ReplicationAnalysis};
pub use classify::{classify, AnalysisCode};
pub use filter::SuppressionFilter;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::changelog::{AnalysisChangelog, ChangelogRecorder, ChangelogStore};
use crate::config::Config;
use crate::metrics::metrics;
use crate::snapshot::{InstanceKey, ObservationStore, StoreError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid hostname exclusion pattern: {0}")]
    InvalidFilter(#[from] regex::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Front door of the classifier core.
pub struct Analyzer {
    config: Config,
    filter: SuppressionFilter,
    observations: Arc<dyn ObservationStore>,
    recorder: ChangelogRecorder,
}

impl Analyzer {
    /// Build an analyzer over the given stores. Hostname exclusion
    /// patterns are compiled up front; an invalid pattern fails
    /// construction rather than a later pass.
    pub fn new(
        config: Config,
        observations: Arc<dyn ObservationStore>,
        changelog: Arc<dyn ChangelogStore>,
    ) -> Result<Self, AnalysisError> {
        let filter = SuppressionFilter::new(&config.analysis.recovery_ignore_hostname_filters)?;
        let recorder = ChangelogRecorder::new(changelog, config.changelog.retention_hours);
        Ok(Self {
            config,
            filter,
            observations,
            recorder,
        })
    }

    /// One classification pass: read the snapshot, aggregate, classify,
    /// and return the actionable (non-suppressed, non-`NoProblem`) rows,
    /// masters first. Every classified node with at least one replica is
    /// audited in the changelog whether or not it is returned; the
    /// changelog is a denser trail than the actionable result set.
    pub fn replication_analysis(
        &self,
        include_downtimed: bool,
    ) -> Result<Vec<ReplicationAnalysis>, AnalysisError> {
        let snapshot = self.observations.snapshot().map_err(|e| {
            error!(error = %e, "Failed to read topology snapshot");
            e
        })?;

        let now = Utc::now();
        let mut result = Vec::new();
        for mut row in aggregate_snapshot(&snapshot, &self.config.analysis, now) {
            let code = classify(&row);
            row.analysis = code;
            row.description = code.description();

            if row.count_slaves > 0 {
                // An audit failure degrades the trail, not the pass
                if let Err(e) = self.recorder.audit(&row.analyzed_instance_key, code) {
                    warn!(
                        key = %row.analyzed_instance_key,
                        error = %e,
                        "Failed to audit analysis in changelog"
                    );
                }
            }

            if self.filter.is_reportable(&row, include_downtimed) {
                metrics().record_problem(code.as_str());
                result.push(row);
            }
        }

        metrics().record_pass();
        debug!(problems = result.len(), "Classification pass complete");
        Ok(result)
    }

    /// Record an analysis for one instance: upsert the fence and append a
    /// changelog entry only if the code changed. Callable standalone.
    pub fn audit_analysis(
        &self,
        key: &InstanceKey,
        analysis: AnalysisCode,
    ) -> Result<(), AnalysisError> {
        self.recorder.audit(key, analysis)?;
        Ok(())
    }

    /// Garbage-collect changelog entries older than the retention window
    pub fn expire_analysis_changelog(&self) -> Result<(), AnalysisError> {
        self.recorder.expire()?;
        Ok(())
    }

    /// Transition timelines for all known instances
    pub fn read_analysis_changelog(&self) -> Result<Vec<AnalysisChangelog>, AnalysisError> {
        Ok(self.recorder.read()?)
    }
}
