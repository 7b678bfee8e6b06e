//! Classification pass integration tests

use chrono::{Duration, Utc};

use argus::config::Config;
use argus::snapshot::DowntimeRecord;
use argus::AnalysisCode;

use crate::{
    deposit_master_with_replicas, fixture, fixture_with_config, key, mark_stale, observed,
    stop_replication,
};

#[test]
fn test_healthy_topology_reports_nothing() {
    let f = fixture();
    deposit_master_with_replicas(&f.observations, 3);

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_dead_master_end_to_end() {
    let f = fixture();
    f.observations.upsert_instance({
        let mut master = observed("db-master", None);
        mark_stale(&mut master);
        master
    });
    for i in 1..=3 {
        let mut replica = observed(&format!("db-replica-{}", i), Some(key("db-master")));
        stop_replication(&mut replica);
        f.observations.upsert_instance(replica);
    }

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert_eq!(result.len(), 1);
    let analysis = &result[0];
    assert_eq!(analysis.analyzed_instance_key, key("db-master"));
    assert_eq!(analysis.analysis, AnalysisCode::DeadMaster);
    assert_eq!(analysis.count_slaves, 3);
    assert_eq!(analysis.count_valid_slaves, 3);
    assert_eq!(analysis.count_valid_replicating_slaves, 0);
    assert!(!analysis.description.is_empty());

    // The transition landed in the changelog
    let timelines = f.analyzer.read_analysis_changelog().unwrap();
    let master_timeline = timelines
        .iter()
        .find(|t| t.key == key("db-master"))
        .expect("master timeline missing");
    assert!(master_timeline.changelog.ends_with(";DeadMaster"));
}

#[test]
fn test_no_problem_rows_audited_but_not_reported() {
    let f = fixture();
    deposit_master_with_replicas(&f.observations, 2);

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert!(result.is_empty());

    // The master has replicas, so its NoProblem state is still trended
    let timelines = f.analyzer.read_analysis_changelog().unwrap();
    assert_eq!(timelines.len(), 1);
    assert_eq!(timelines[0].key, key("db-master"));
    assert!(timelines[0].changelog.ends_with(";NoProblem"));
}

#[test]
fn test_hostname_filter_suppresses_but_still_audits() {
    let mut config = Config::default();
    config.analysis.recovery_ignore_hostname_filters = vec!["^db-master$".to_string()];
    let f = fixture_with_config(config);

    f.observations.upsert_instance({
        let mut master = observed("db-master", None);
        mark_stale(&mut master);
        master
    });
    let mut replica = observed("db-replica-1", Some(key("db-master")));
    stop_replication(&mut replica);
    f.observations.upsert_instance(replica);

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert!(result.is_empty());

    let timelines = f.analyzer.read_analysis_changelog().unwrap();
    let master_timeline = timelines
        .iter()
        .find(|t| t.key == key("db-master"))
        .expect("suppressed node must still be audited");
    assert!(master_timeline.changelog.contains(";DeadMaster"));
}

#[test]
fn test_downtime_affects_reportability_not_classification() {
    let f = fixture();
    f.observations.upsert_instance({
        let mut master = observed("db-master", None);
        mark_stale(&mut master);
        master
    });
    let mut replica = observed("db-replica-1", Some(key("db-master")));
    stop_replication(&mut replica);
    f.observations.upsert_instance(replica);
    f.observations.set_downtime(
        key("db-master"),
        DowntimeRecord {
            active: true,
            end_timestamp: Utc::now() + Duration::hours(2),
        },
    );

    let hidden = f.analyzer.replication_analysis(false).unwrap();
    assert!(hidden.is_empty());

    let shown = f.analyzer.replication_analysis(true).unwrap();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].analysis, AnalysisCode::DeadMaster);
    assert!(shown[0].is_downtimed);
    assert!(shown[0].downtime_remaining_seconds > 0);
}

#[test]
fn test_maintenance_excludes_from_result_and_changelog() {
    let f = fixture();
    f.observations.upsert_instance({
        let mut master = observed("db-master", None);
        mark_stale(&mut master);
        master
    });
    let mut replica = observed("db-replica-1", Some(key("db-master")));
    stop_replication(&mut replica);
    f.observations.upsert_instance(replica);
    f.observations.begin_maintenance(key("db-master"));

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert!(result.is_empty());

    let timelines = f.analyzer.read_analysis_changelog().unwrap();
    assert!(timelines.iter().all(|t| t.key != key("db-master")));
}

#[test]
fn test_intermediate_master_chain() {
    let f = fixture();
    // master <- relay <- leaf; the relay stops seeing its replica
    f.observations.upsert_instance(observed("db-master", None));
    f.observations.upsert_instance({
        let mut relay = observed("db-relay", Some(key("db-master")));
        relay.replication_depth = 1;
        relay
    });
    f.observations.upsert_instance({
        let mut leaf = observed("db-leaf", Some(key("db-relay")));
        leaf.replication_depth = 2;
        stop_replication(&mut leaf);
        leaf
    });

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].analyzed_instance_key, key("db-relay"));
    assert_eq!(
        result[0].analysis,
        AnalysisCode::AllIntermediateMasterSlavesNotReplicating
    );
    assert!(!result[0].is_master);
}

#[test]
fn test_first_tier_slave_failing_to_connect() {
    let f = fixture();
    f.observations.upsert_instance(observed("db-master", None));
    f.observations.upsert_instance({
        let mut replica = observed("db-replica-1", Some(key("db-master")));
        replica.slave_io_running = false;
        replica.last_io_error = "error reconnecting to master 'repl@db-master:3306'".to_string();
        replica
    });

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert!(result
        .iter()
        .any(|a| a.analyzed_instance_key == key("db-replica-1")
            && a.analysis == AnalysisCode::FirstTierSlaveFailingToConnectToMaster));
}

#[test]
fn test_result_ordering_masters_first() {
    let f = fixture();
    // Two broken subtrees: a stale master and a relay with stopped leaves
    f.observations.upsert_instance({
        let mut master = observed("db-master", None);
        mark_stale(&mut master);
        master
    });
    let mut replica = observed("db-replica-1", Some(key("db-master")));
    stop_replication(&mut replica);
    f.observations.upsert_instance(replica);

    f.observations.upsert_instance({
        let mut relay = observed("db-relay", Some(key("db-master")));
        relay.replication_depth = 1;
        relay
    });
    for i in 1..=2 {
        let mut leaf = observed(&format!("db-leaf-{}", i), Some(key("db-relay")));
        leaf.replication_depth = 2;
        stop_replication(&mut leaf);
        f.observations.upsert_instance(leaf);
    }

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert_eq!(result.len(), 2);
    assert!(result[0].is_master);
    assert_eq!(result[1].analyzed_instance_key, key("db-relay"));
}

#[test]
fn test_repeated_passes_do_not_accumulate_changelog_entries() {
    let f = fixture();
    f.observations.upsert_instance({
        let mut master = observed("db-master", None);
        mark_stale(&mut master);
        master
    });
    let mut replica = observed("db-replica-1", Some(key("db-master")));
    stop_replication(&mut replica);
    f.observations.upsert_instance(replica);

    for _ in 0..5 {
        f.analyzer.replication_analysis(false).unwrap();
    }

    let timelines = f.analyzer.read_analysis_changelog().unwrap();
    let master_timeline = timelines
        .iter()
        .find(|t| t.key == key("db-master"))
        .unwrap();
    // One transition, not five
    assert_eq!(master_timeline.changelog.matches(';').count(), 1);
}

#[test]
fn test_reduction_flag_preserves_problem_classification() {
    let mut config = Config::default();
    config.analysis.reduce_analysis_count = true;
    let f = fixture_with_config(config);

    f.observations.upsert_instance({
        let mut master = observed("db-master", None);
        mark_stale(&mut master);
        master
    });
    let mut replica = observed("db-replica-1", Some(key("db-master")));
    stop_replication(&mut replica);
    f.observations.upsert_instance(replica);

    let result = f.analyzer.replication_analysis(false).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].analysis, AnalysisCode::DeadMaster);
}
