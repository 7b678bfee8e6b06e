//! Snapshot aggregation: one statistics row per analyzed node.
//!
//! A read-and-shape step over externally owned data. For every instance
//! not under active maintenance, derives counts over its direct-replica
//! set plus topology-wide capability flags. Rows are transient; they are
//! rebuilt on every pass and never mutated after classification.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::config::AnalysisConfig;
use crate::snapshot::{ClusterDetails, InstanceKey, ObservedInstance, TopologySnapshot};

use super::classify::AnalysisCode;

/// Aggregated replication statistics and classification result for one
/// analyzed node.
#[derive(Debug, Clone)]
pub struct ReplicationAnalysis {
    pub analyzed_instance_key: InstanceKey,
    /// The analyzed node's own upstream, if any
    pub analyzed_instance_master_key: Option<InstanceKey>,
    pub cluster_details: ClusterDetails,
    pub is_master: bool,
    pub is_co_master: bool,
    /// The node's identity names its cluster
    pub is_cluster_master: bool,
    pub is_binlog_server: bool,
    pub replication_depth: u32,
    pub last_check_valid: bool,
    pub is_failing_to_connect_to_master: bool,
    pub count_slaves: u32,
    pub count_valid_slaves: u32,
    pub count_valid_replicating_slaves: u32,
    pub count_slaves_failing_to_connect_to_master: u32,
    /// Direct replicas, as structured keys
    pub slave_hosts: HashSet<InstanceKey>,
    pub oracle_gtid_immediate_topology: bool,
    pub pseudo_gtid_immediate_topology: bool,
    pub mariadb_gtid_immediate_topology: bool,
    pub binlog_server_immediate_topology: bool,
    pub is_downtimed: bool,
    pub downtime_end_timestamp: Option<DateTime<Utc>>,
    pub downtime_remaining_seconds: i64,
    pub analysis: AnalysisCode,
    pub description: &'static str,
}

/// Build one aggregated row per non-maintained instance. Output is ordered
/// masters first, then cluster-defining nodes, then by descending replica
/// count (stable tie-break).
pub fn aggregate_snapshot(
    snapshot: &TopologySnapshot,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> Vec<ReplicationAnalysis> {
    // Index direct replicas by their upstream's key
    let mut replicas_of: HashMap<&InstanceKey, Vec<&ObservedInstance>> = HashMap::new();
    for instance in &snapshot.instances {
        if let Some(upstream) = &instance.upstream {
            replicas_of.entry(upstream).or_default().push(instance);
        }
    }

    let mut rows: Vec<ReplicationAnalysis> = snapshot
        .instances
        .iter()
        .filter(|instance| !snapshot.maintenance.contains(&instance.key))
        .map(|instance| {
            let replicas = replicas_of
                .get(&instance.key)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            aggregate_instance(instance, replicas, snapshot, config, now)
        })
        .collect();

    if config.reduce_analysis_count {
        rows.retain(is_interesting);
    }

    rows.sort_by(|a, b| {
        b.is_master
            .cmp(&a.is_master)
            .then_with(|| b.is_cluster_master.cmp(&a.is_cluster_master))
            .then_with(|| b.count_slaves.cmp(&a.count_slaves))
    });
    rows
}

fn aggregate_instance(
    instance: &ObservedInstance,
    replicas: &[&ObservedInstance],
    snapshot: &TopologySnapshot,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> ReplicationAnalysis {
    let count_slaves = replicas.len() as u32;
    let valid: Vec<&&ObservedInstance> = replicas.iter().filter(|r| r.is_valid()).collect();
    let count_valid_slaves = valid.len() as u32;
    let count_valid_replicating_slaves =
        valid.iter().filter(|r| r.is_replicating()).count() as u32;
    let count_slaves_failing_to_connect_to_master = valid
        .iter()
        .filter(|r| r.is_failing_to_connect_to_master())
        .count() as u32;

    // A capability is topology-uniform only when every valid replica has it
    let uniform = |count: u32| count_valid_slaves > 0 && count == count_valid_slaves;
    let count_oracle_gtid = valid.iter().filter(|r| r.oracle_gtid).count() as u32;
    let count_pseudo_gtid = valid.iter().filter(|r| r.pseudo_gtid).count() as u32;
    let count_mariadb_gtid = valid.iter().filter(|r| r.mariadb_gtid).count() as u32;
    let count_binlog_servers = valid.iter().filter(|r| r.binlog_server).count() as u32;

    let downtime = snapshot.downtime.get(&instance.key);
    let is_downtimed = downtime.map(|d| d.is_in_effect(now)).unwrap_or(false);
    let downtime_end_timestamp = downtime.map(|d| d.end_timestamp);
    let downtime_remaining_seconds = downtime
        .map(|d| (d.end_timestamp - now).num_seconds())
        .unwrap_or(0);

    ReplicationAnalysis {
        analyzed_instance_key: instance.key.clone(),
        analyzed_instance_master_key: instance.upstream.clone(),
        cluster_details: ClusterDetails {
            cluster_name: instance.cluster_name.clone(),
            cluster_alias: snapshot.cluster_alias(&instance.cluster_name),
        },
        is_master: instance.is_master(),
        is_co_master: instance.is_co_master,
        is_cluster_master: instance.is_cluster_master(),
        is_binlog_server: instance.binlog_server,
        replication_depth: instance.replication_depth,
        last_check_valid: instance.is_last_check_valid(config.instance_poll_seconds),
        is_failing_to_connect_to_master: instance.is_failing_to_connect_to_master(),
        count_slaves,
        count_valid_slaves,
        count_valid_replicating_slaves,
        count_slaves_failing_to_connect_to_master,
        slave_hosts: replicas.iter().map(|r| r.key.clone()).collect(),
        oracle_gtid_immediate_topology: instance.supports_oracle_gtid
            && uniform(count_oracle_gtid),
        pseudo_gtid_immediate_topology: uniform(count_pseudo_gtid),
        mariadb_gtid_immediate_topology: uniform(count_mariadb_gtid),
        binlog_server_immediate_topology: uniform(count_binlog_servers),
        is_downtimed,
        downtime_end_timestamp,
        downtime_remaining_seconds,
        analysis: AnalysisCode::NoProblem,
        description: AnalysisCode::NoProblem.description(),
    }
}

/// Volume-reduction filter: keep rows that are stale, partially valid,
/// failing to connect, or have any replica at all. The last condition
/// subsumes most of the others; it keeps "no problem but worth trending"
/// nodes flowing into the changelog.
fn is_interesting(a: &ReplicationAnalysis) -> bool {
    !a.last_check_valid
        || a.count_slaves_failing_to_connect_to_master > 0
        || a.count_valid_slaves < a.count_slaves
        || a.count_valid_replicating_slaves < a.count_slaves
        || a.is_failing_to_connect_to_master
        || a.count_slaves > 0
}
