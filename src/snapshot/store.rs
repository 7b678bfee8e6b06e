//! Bulk-read access to the persisted fleet state.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use thiserror::Error;

use super::instance::{DowntimeRecord, InstanceKey, ObservedInstance};

/// Storage access failure. Malformed rows are the store's problem: the
/// read path guarantees well-typed rows, and a decode failure surfaces
/// here as an access error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage access failed: {0}")]
    Access(String),
}

/// Everything the analyzer needs for one classification pass, obtained
/// in a single bulk read.
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    pub instances: Vec<ObservedInstance>,
    /// Keys currently under active maintenance; excluded from analysis
    pub maintenance: HashSet<InstanceKey>,
    /// Operator-set downtime windows by key
    pub downtime: HashMap<InstanceKey, DowntimeRecord>,
    /// Cluster name to display alias
    pub cluster_aliases: HashMap<String, String>,
}

impl TopologySnapshot {
    /// Alias for a cluster, falling back to the cluster name itself
    pub fn cluster_alias(&self, cluster_name: &str) -> String {
        self.cluster_aliases
            .get(cluster_name)
            .cloned()
            .unwrap_or_else(|| cluster_name.to_string())
    }
}

/// Read side of the observation store owned by the external poller.
pub trait ObservationStore: Send + Sync {
    /// One bulk read of the current fleet state
    fn snapshot(&self) -> Result<TopologySnapshot, StoreError>;
}

/// In-memory observation store. The poller overwrites instance rows as it
/// probes the fleet; the analyzer only ever reads a full copy, so a pass
/// never observes a half-written row.
#[derive(Default)]
pub struct MemoryObservationStore {
    inner: RwLock<TopologySnapshot>,
}

impl MemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row for an instance
    pub fn upsert_instance(&self, instance: ObservedInstance) {
        let mut snapshot = self.inner.write();
        match snapshot
            .instances
            .iter_mut()
            .find(|existing| existing.key == instance.key)
        {
            Some(slot) => *slot = instance,
            None => snapshot.instances.push(instance),
        }
    }

    pub fn remove_instance(&self, key: &InstanceKey) {
        self.inner.write().instances.retain(|i| i.key != *key);
    }

    /// Mark a key as under active maintenance; it will be excluded from
    /// classification and audit entirely
    pub fn begin_maintenance(&self, key: InstanceKey) {
        self.inner.write().maintenance.insert(key);
    }

    pub fn end_maintenance(&self, key: &InstanceKey) {
        self.inner.write().maintenance.remove(key);
    }

    pub fn set_downtime(&self, key: InstanceKey, record: DowntimeRecord) {
        self.inner.write().downtime.insert(key, record);
    }

    pub fn clear_downtime(&self, key: &InstanceKey) {
        self.inner.write().downtime.remove(key);
    }

    pub fn set_cluster_alias(&self, cluster_name: impl Into<String>, alias: impl Into<String>) {
        self.inner
            .write()
            .cluster_aliases
            .insert(cluster_name.into(), alias.into());
    }
}

impl ObservationStore for MemoryObservationStore {
    fn snapshot(&self) -> Result<TopologySnapshot, StoreError> {
        Ok(self.inner.read().clone())
    }
}
