//! Prometheus metrics for the analysis pipeline.
//!
//! Counters only; exposition is the embedding process's concern (`gather`
//! returns the text format for whatever endpoint it wires up).

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

/// Global metrics registry
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Get the global metrics instance
pub fn metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

pub struct Metrics {
    /// Registry for all metrics
    pub registry: Registry,

    /// Completed classification passes
    pub analysis_passes_total: IntCounter,
    /// Problem rows surfaced to the recovery engine, by analysis code
    pub analysis_problems_total: IntCounterVec,
    /// Transitions appended to the changelog
    pub changelog_transitions_total: IntCounter,
    /// Changelog entries removed by expiry
    pub changelog_expired_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let analysis_passes_total = IntCounter::new(
            "argus_analysis_passes_total",
            "Total number of completed classification passes",
        )
        .unwrap();

        let analysis_problems_total = IntCounterVec::new(
            Opts::new(
                "argus_analysis_problems_total",
                "Total number of reportable problem rows by analysis code",
            ),
            &["code"],
        )
        .unwrap();

        let changelog_transitions_total = IntCounter::new(
            "argus_changelog_transitions_total",
            "Total number of analysis transitions appended to the changelog",
        )
        .unwrap();

        let changelog_expired_total = IntCounter::new(
            "argus_changelog_expired_total",
            "Total number of changelog entries removed by expiry",
        )
        .unwrap();

        registry
            .register(Box::new(analysis_passes_total.clone()))
            .unwrap();
        registry
            .register(Box::new(analysis_problems_total.clone()))
            .unwrap();
        registry
            .register(Box::new(changelog_transitions_total.clone()))
            .unwrap();
        registry
            .register(Box::new(changelog_expired_total.clone()))
            .unwrap();

        Self {
            registry,
            analysis_passes_total,
            analysis_problems_total,
            changelog_transitions_total,
            changelog_expired_total,
        }
    }

    /// Record a completed classification pass
    pub fn record_pass(&self) {
        self.analysis_passes_total.inc();
    }

    /// Record a reportable problem
    pub fn record_problem(&self, code: &str) {
        self.analysis_problems_total.with_label_values(&[code]).inc();
    }

    /// Record a changelog transition
    pub fn record_transition(&self) {
        self.changelog_transitions_total.inc();
    }

    /// Record expired changelog entries
    pub fn record_expired(&self, count: u64) {
        self.changelog_expired_total.inc_by(count);
    }

    /// Get metrics as Prometheus text format
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
