//! Failure classification: aggregated row to analysis code.
//!
//! A single ordered chain of guard conditions, first match wins. Guards
//! are not disjoint; the order encodes priority and must not be
//! rearranged. Any aggregate that matches no guard is `NoProblem`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::aggregate::ReplicationAnalysis;

/// The fixed taxonomy of replication failure states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnalysisCode {
    #[default]
    NoProblem,
    DeadMasterWithoutSlaves,
    DeadMaster,
    DeadMasterAndSlaves,
    DeadMasterAndSomeSlaves,
    UnreachableMaster,
    MasterSingleSlaveNotReplicating,
    MasterSingleSlaveDead,
    AllMasterSlavesNotReplicating,
    AllMasterSlavesNotReplicatingOrDead,
    DeadCoMaster,
    DeadCoMasterAndSomeSlaves,
    UnreachableCoMaster,
    AllCoMasterSlavesNotReplicating,
    DeadIntermediateMasterWithSingleSlaveFailingToConnect,
    DeadIntermediateMasterWithSingleSlave,
    DeadIntermediateMaster,
    DeadIntermediateMasterAndSomeSlaves,
    UnreachableIntermediateMaster,
    AllIntermediateMasterSlavesFailingToConnectOrDead,
    AllIntermediateMasterSlavesNotReplicating,
    BinlogServerFailingToConnectToMaster,
    FirstTierSlaveFailingToConnectToMaster,
}

impl AnalysisCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoProblem => "NoProblem",
            Self::DeadMasterWithoutSlaves => "DeadMasterWithoutSlaves",
            Self::DeadMaster => "DeadMaster",
            Self::DeadMasterAndSlaves => "DeadMasterAndSlaves",
            Self::DeadMasterAndSomeSlaves => "DeadMasterAndSomeSlaves",
            Self::UnreachableMaster => "UnreachableMaster",
            Self::MasterSingleSlaveNotReplicating => "MasterSingleSlaveNotReplicating",
            Self::MasterSingleSlaveDead => "MasterSingleSlaveDead",
            Self::AllMasterSlavesNotReplicating => "AllMasterSlavesNotReplicating",
            Self::AllMasterSlavesNotReplicatingOrDead => "AllMasterSlavesNotReplicatingOrDead",
            Self::DeadCoMaster => "DeadCoMaster",
            Self::DeadCoMasterAndSomeSlaves => "DeadCoMasterAndSomeSlaves",
            Self::UnreachableCoMaster => "UnreachableCoMaster",
            Self::AllCoMasterSlavesNotReplicating => "AllCoMasterSlavesNotReplicating",
            Self::DeadIntermediateMasterWithSingleSlaveFailingToConnect => {
                "DeadIntermediateMasterWithSingleSlaveFailingToConnect"
            }
            Self::DeadIntermediateMasterWithSingleSlave => "DeadIntermediateMasterWithSingleSlave",
            Self::DeadIntermediateMaster => "DeadIntermediateMaster",
            Self::DeadIntermediateMasterAndSomeSlaves => "DeadIntermediateMasterAndSomeSlaves",
            Self::UnreachableIntermediateMaster => "UnreachableIntermediateMaster",
            Self::AllIntermediateMasterSlavesFailingToConnectOrDead => {
                "AllIntermediateMasterSlavesFailingToConnectOrDead"
            }
            Self::AllIntermediateMasterSlavesNotReplicating => {
                "AllIntermediateMasterSlavesNotReplicating"
            }
            Self::BinlogServerFailingToConnectToMaster => "BinlogServerFailingToConnectToMaster",
            Self::FirstTierSlaveFailingToConnectToMaster => {
                "FirstTierSlaveFailingToConnectToMaster"
            }
        }
    }

    /// Operator-facing description, fixed per code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoProblem => "",
            Self::DeadMasterWithoutSlaves => "Master cannot be reached by argus and has no slave",
            Self::DeadMaster => {
                "Master cannot be reached by argus and none of its slaves is replicating"
            }
            Self::DeadMasterAndSlaves => {
                "Master cannot be reached by argus and none of its slaves is replicating"
            }
            Self::DeadMasterAndSomeSlaves => {
                "Master cannot be reached by argus; some of its slaves are unreachable and none of its reachable slaves is replicating"
            }
            Self::UnreachableMaster => {
                "Master cannot be reached by argus but it has replicating slaves; possibly a network/host issue"
            }
            Self::MasterSingleSlaveNotReplicating => {
                "Master is reachable but its single slave is not replicating"
            }
            Self::MasterSingleSlaveDead => "Master is reachable but its single slave is dead",
            Self::AllMasterSlavesNotReplicating => {
                "Master is reachable but none of its slaves is replicating"
            }
            Self::AllMasterSlavesNotReplicatingOrDead => {
                "Master is reachable but none of its slaves is replicating"
            }
            Self::DeadCoMaster => {
                "Co-master cannot be reached by argus and none of its slaves is replicating"
            }
            Self::DeadCoMasterAndSomeSlaves => {
                "Co-master cannot be reached by argus; some of its slaves are unreachable and none of its reachable slaves is replicating"
            }
            Self::UnreachableCoMaster => {
                "Co-master cannot be reached by argus but it has replicating slaves; possibly a network/host issue"
            }
            Self::AllCoMasterSlavesNotReplicating => {
                "Co-master is reachable but none of its slaves is replicating"
            }
            Self::DeadIntermediateMasterWithSingleSlaveFailingToConnect => {
                "Intermediate master cannot be reached by argus and its (single) slave is failing to connect"
            }
            Self::DeadIntermediateMasterWithSingleSlave => {
                "Intermediate master cannot be reached by argus and its (single) slave is not replicating"
            }
            Self::DeadIntermediateMaster => {
                "Intermediate master cannot be reached by argus and none of its slaves is replicating"
            }
            Self::DeadIntermediateMasterAndSomeSlaves => {
                "Intermediate master cannot be reached by argus; some of its slaves are unreachable and none of its reachable slaves is replicating"
            }
            Self::UnreachableIntermediateMaster => {
                "Intermediate master cannot be reached by argus but it has replicating slaves; possibly a network/host issue"
            }
            Self::AllIntermediateMasterSlavesFailingToConnectOrDead => {
                "Intermediate master is reachable but all of its slaves are failing to connect"
            }
            Self::AllIntermediateMasterSlavesNotReplicating => {
                "Intermediate master is reachable but none of its slaves is replicating"
            }
            Self::BinlogServerFailingToConnectToMaster => {
                "Binlog server is unable to connect to its master"
            }
            Self::FirstTierSlaveFailingToConnectToMaster => {
                "1st tier slave (directly replicating from topology master) is unable to connect to the master"
            }
        }
    }
}

impl fmt::Display for AnalysisCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an aggregated row. Total and deterministic: identical input
/// always yields the identical code, and anything unmatched falls through
/// to `NoProblem`.
#[rustfmt::skip]
pub fn classify(a: &ReplicationAnalysis) -> AnalysisCode {
    let cs = a.count_slaves;
    let cvs = a.count_valid_slaves;
    let cvr = a.count_valid_replicating_slaves;
    let cfc = a.count_slaves_failing_to_connect_to_master;

    if a.is_master && !a.last_check_valid && cs == 0 {
        AnalysisCode::DeadMasterWithoutSlaves
    } else if a.is_master && !a.last_check_valid && cvs == cs && cvr == 0 {
        AnalysisCode::DeadMaster
    } else if a.is_master && !a.last_check_valid && cs > 0 && cvs == 0 && cvr == 0 {
        AnalysisCode::DeadMasterAndSlaves
    } else if a.is_master && !a.last_check_valid && cvs < cs && cvs > 0 && cvr == 0 {
        AnalysisCode::DeadMasterAndSomeSlaves
    } else if a.is_master && !a.last_check_valid && cvs > 0 && cvr > 0 {
        AnalysisCode::UnreachableMaster
    } else if a.is_master && a.last_check_valid && cs == 1 && cvs == cs && cvr == 0 {
        AnalysisCode::MasterSingleSlaveNotReplicating
    } else if a.is_master && a.last_check_valid && cs == 1 && cvs == 0 {
        AnalysisCode::MasterSingleSlaveDead
    } else if a.is_master && a.last_check_valid && cs > 1 && cvs == cs && cvr == 0 {
        AnalysisCode::AllMasterSlavesNotReplicating
    } else if a.is_master && a.last_check_valid && cs > 1 && cvs < cs && cvs > 0 && cvr == 0 {
        AnalysisCode::AllMasterSlavesNotReplicatingOrDead
    } else if a.is_co_master && !a.last_check_valid && cs > 0 && cvs == cs && cvr == 0 {
        AnalysisCode::DeadCoMaster
    } else if a.is_co_master && !a.last_check_valid && cs > 0 && cvs < cs && cvs > 0 && cvr == 0 {
        AnalysisCode::DeadCoMasterAndSomeSlaves
    } else if a.is_co_master && !a.last_check_valid && cvs > 0 && cvr > 0 {
        AnalysisCode::UnreachableCoMaster
    } else if a.is_co_master && a.last_check_valid && cs > 0 && cvr == 0 {
        AnalysisCode::AllCoMasterSlavesNotReplicating
    } else if !a.is_master && !a.last_check_valid && cs == 1 && cvs == cs && cfc == cs && cvr == 0 {
        AnalysisCode::DeadIntermediateMasterWithSingleSlaveFailingToConnect
    } else if !a.is_master && !a.last_check_valid && cs == 1 && cvs == cs && cvr == 0 {
        AnalysisCode::DeadIntermediateMasterWithSingleSlave
    } else if !a.is_master && !a.last_check_valid && cs > 1 && cvs == cs && cvr == 0 {
        AnalysisCode::DeadIntermediateMaster
    } else if !a.is_master && !a.last_check_valid && cvs < cs && cvs > 0 && cvr == 0 {
        AnalysisCode::DeadIntermediateMasterAndSomeSlaves
    } else if !a.is_master && !a.last_check_valid && cvs > 0 && cvr > 0 {
        AnalysisCode::UnreachableIntermediateMaster
    } else if !a.is_master && a.last_check_valid && cs > 1 && cvr == 0 && cfc > 0 && cfc == cvs {
        // Every valid slave is failing to connect (at least one exists);
        // the rest are dead. Stale slaves are deliberately ignored in this
        // equality. The intermediate master itself is still reachable, so
        // the conclusion rests on its slaves alone.
        AnalysisCode::AllIntermediateMasterSlavesFailingToConnectOrDead
    } else if !a.is_master && a.last_check_valid && cs > 0 && cvr == 0 {
        AnalysisCode::AllIntermediateMasterSlavesNotReplicating
    } else if a.is_binlog_server && a.is_failing_to_connect_to_master {
        AnalysisCode::BinlogServerFailingToConnectToMaster
    } else if a.replication_depth == 1 && a.is_failing_to_connect_to_master {
        AnalysisCode::FirstTierSlaveFailingToConnectToMaster
    } else {
        AnalysisCode::NoProblem
    }
}
