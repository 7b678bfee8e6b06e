//! Change-only audit trail of analysis transitions.
//!
//! Two pieces of state outlive a classification pass: a per-instance
//! fence holding the most recently recorded code, and an append-only log
//! of transitions. The fence turns a high-frequency polling loop into a
//! low-volume changelog without losing transition ordering or timestamps.

mod recorder;
mod store;

pub use recorder::{AnalysisChangelog, ChangelogRecorder};
pub use store::{ChangelogEntry, ChangelogStore, LastAnalysis, MemoryChangelogStore};
