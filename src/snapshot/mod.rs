//! Point-in-time fleet snapshot model.
//!
//! The external poller probes each instance and persists its latest
//! observed state; this module defines that state and the bulk-read
//! interface the analyzer consumes. Nothing here mutates the fleet.

mod instance;
mod store;

pub use instance::{ClusterDetails, DowntimeRecord, InstanceKey, ObservedInstance};
pub use store::{MemoryObservationStore, ObservationStore, StoreError, TopologySnapshot};
