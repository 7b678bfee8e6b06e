//! Argus: replication topology health classifier.
//!
//! Given a point-in-time snapshot of a MySQL fleet (instance rows persisted
//! by an external poller), argus aggregates per-node replication statistics,
//! classifies each replication source into a fixed taxonomy of failure
//! states, and records state *transitions* into an append-only audit
//! changelog. The classified analyses feed an external recovery engine;
//! argus itself never touches replication topology.
//!
//! A pass reads the snapshot, aggregates, classifies, then runs two
//! independent sinks: the suppression filter gates the actionable result
//! set, and the changelog audit (gated only by "node has at least one
//! replica") records transitions.

pub mod analysis;
pub mod changelog;
pub mod config;
pub mod metrics;
pub mod snapshot;

pub use analysis::{AnalysisCode, AnalysisError, Analyzer, ReplicationAnalysis};
pub use changelog::{AnalysisChangelog, ChangelogStore, MemoryChangelogStore};
pub use config::{load_config, Config};
pub use snapshot::{InstanceKey, MemoryObservationStore, ObservationStore, ObservedInstance};
