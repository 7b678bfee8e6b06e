//! Integration test entry point
//!
//! End-to-end tests of the classification pipeline over the in-memory
//! stores: a simulated poller deposits a topology, a pass aggregates,
//! classifies, suppresses and audits, and the changelog is read back
//! through the public API. No external services required.

mod analysis;

use std::sync::Arc;

use chrono::{Duration, Utc};

use argus::changelog::MemoryChangelogStore;
use argus::config::Config;
use argus::snapshot::{InstanceKey, MemoryObservationStore, ObservedInstance};
use argus::Analyzer;

/// Instance key on the conventional MySQL port
pub fn key(hostname: &str) -> InstanceKey {
    InstanceKey::new(hostname, 3306)
}

/// A freshly observed, healthy instance
pub fn observed(hostname: &str, upstream: Option<InstanceKey>) -> ObservedInstance {
    let now = Utc::now();
    let depth = u32::from(upstream.is_some());
    ObservedInstance {
        key: key(hostname),
        upstream,
        cluster_name: "db-master:3306".to_string(),
        last_seen: now,
        last_checked: now,
        last_attempted_check: now,
        slave_io_running: true,
        slave_sql_running: true,
        last_io_error: String::new(),
        is_co_master: false,
        binlog_server: false,
        supports_oracle_gtid: false,
        oracle_gtid: false,
        mariadb_gtid: false,
        pseudo_gtid: false,
        replication_depth: depth,
    }
}

/// Make the instance's monitoring stale: its last check attempt completed
/// without seeing the instance
pub fn mark_stale(instance: &mut ObservedInstance) {
    instance.last_seen = Utc::now() - Duration::minutes(10);
}

/// Stop both replication threads
pub fn stop_replication(instance: &mut ObservedInstance) {
    instance.slave_io_running = false;
    instance.slave_sql_running = false;
}

pub struct Fixture {
    pub analyzer: Analyzer,
    pub observations: Arc<MemoryObservationStore>,
    pub changelog: Arc<MemoryChangelogStore>,
}

/// Analyzer over empty in-memory stores with the given config
pub fn fixture_with_config(config: Config) -> Fixture {
    let observations = Arc::new(MemoryObservationStore::new());
    let changelog = Arc::new(MemoryChangelogStore::new());
    let analyzer = Analyzer::new(config, observations.clone(), changelog.clone())
        .expect("analyzer construction failed");
    Fixture {
        analyzer,
        observations,
        changelog,
    }
}

pub fn fixture() -> Fixture {
    fixture_with_config(Config::default())
}

/// Deposit a master with `replica_count` healthy replicas; returns the
/// replica hostnames
pub fn deposit_master_with_replicas(
    observations: &MemoryObservationStore,
    replica_count: usize,
) -> Vec<String> {
    observations.upsert_instance(observed("db-master", None));
    (1..=replica_count)
        .map(|i| {
            let hostname = format!("db-replica-{}", i);
            observations.upsert_instance(observed(&hostname, Some(key("db-master"))));
            hostname
        })
        .collect()
}
