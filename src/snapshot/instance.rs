//! Observed instance rows and their health predicates.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// IO thread error text MySQL emits while a replica retries its master.
    /// Distinguishes "replica is fine but cannot reach its master" from
    /// generic replica breakage.
    static ref CONNECT_ERROR_PATTERN: Regex =
        Regex::new(r"(?i)error (connecting|reconnecting) to master").unwrap();
}

/// Identity of a database instance. Equality is exact hostname + port
/// match; resolution to canonical hostnames happens upstream in the
/// poller, before rows are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceKey {
    pub hostname: String,
    pub port: u16,
}

impl InstanceKey {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// Latest observed state of a single instance, as persisted by the poller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedInstance {
    pub key: InstanceKey,
    /// The node this instance replicates from; `None` for a topology master
    pub upstream: Option<InstanceKey>,
    pub cluster_name: String,
    /// Last successful observation
    pub last_seen: DateTime<Utc>,
    /// Last completed health check
    pub last_checked: DateTime<Utc>,
    /// Last health check attempt, completed or not
    pub last_attempted_check: DateTime<Utc>,
    pub slave_io_running: bool,
    pub slave_sql_running: bool,
    pub last_io_error: String,
    /// Two nodes mutually configured as each other's replication source
    pub is_co_master: bool,
    /// Forwards log events without applying them
    pub binlog_server: bool,
    pub supports_oracle_gtid: bool,
    pub oracle_gtid: bool,
    pub mariadb_gtid: bool,
    pub pseudo_gtid: bool,
    /// Hops from the topology root (0 = master, 1 = first tier)
    pub replication_depth: u32,
}

impl ObservedInstance {
    /// A node with no upstream is a topology master.
    pub fn is_master(&self) -> bool {
        self.upstream.is_none()
    }

    /// Monitoring of this node is current: the last check attempt completed
    /// successfully, and no attempt has been outstanding for more than two
    /// poll intervals. When either fails the node is possibly-stale and
    /// downstream rules treat it as unreachable, not as confirmed dead.
    pub fn is_last_check_valid(&self, poll_interval_seconds: u64) -> bool {
        let window = Duration::seconds(2 * poll_interval_seconds as i64);
        self.last_checked <= self.last_seen && self.last_attempted_check <= self.last_seen + window
    }

    /// The node itself is being seen fresh, independent of its replication
    /// thread health.
    pub fn is_valid(&self) -> bool {
        self.last_checked <= self.last_seen
    }

    /// Both replication threads are running.
    pub fn is_replicating(&self) -> bool {
        self.slave_io_running && self.slave_sql_running
    }

    /// SQL thread is applying but the IO thread is stuck (re)connecting
    /// to its master.
    pub fn is_failing_to_connect_to_master(&self) -> bool {
        self.slave_sql_running
            && !self.slave_io_running
            && CONNECT_ERROR_PATTERN.is_match(&self.last_io_error)
    }

    /// Whether this node's own identity names its cluster.
    pub fn is_cluster_master(&self) -> bool {
        self.key.to_string() == self.cluster_name
    }
}

/// Downtime window set by an operator; suppresses reporting while active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimeRecord {
    pub active: bool,
    pub end_timestamp: DateTime<Utc>,
}

impl DowntimeRecord {
    /// Active and not yet expired
    pub fn is_in_effect(&self, now: DateTime<Utc>) -> bool {
        self.active && self.end_timestamp >= now
    }
}

/// Cluster identity attached to an analysis row. Recovery metadata is
/// populated externally and out of scope here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDetails {
    pub cluster_name: String,
    pub cluster_alias: String,
}
