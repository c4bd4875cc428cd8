//! End-to-end properties of a full generation run: determinism,
//! referential integrity, exact volumes, fault-ratio convergence and the
//! fixed acceptance scenarios.

use std::collections::HashSet;

use chrono::NaiveDate;
use netsim::config::{DateRange, EnvironmentProfile, GenerationRequest, TableNames};
use netsim::run::{SinkSet, run};
use netsim::sink::MemorySink;
use netsim::tables::TableKind;
use netsim::tables::ddm::DdmRecord;
use netsim::tables::grpc::GrpcRecord;
use netsim::tables::lifecycle::LifecycleRecord;
use netsim::tables::snmp::SnmpRecord;
use netsim::tables::syslog::SyslogRecord;
use netsim::topology::Topology;

struct Captured {
    grpc: MemorySink<GrpcRecord>,
    snmp: MemorySink<SnmpRecord>,
    syslog: MemorySink<SyslogRecord>,
    ddm: MemorySink<DdmRecord>,
    lifecycle: MemorySink<LifecycleRecord>,
}

fn captured_sinks() -> (Captured, SinkSet) {
    let captured = Captured {
        grpc: MemorySink::new(),
        snmp: MemorySink::new(),
        syslog: MemorySink::new(),
        ddm: MemorySink::new(),
        lifecycle: MemorySink::new(),
    };
    let set = SinkSet {
        grpc: Box::new(captured.grpc.clone()),
        snmp: Box::new(captured.snmp.clone()),
        syslog: Box::new(captured.syslog.clone()),
        ddm: Box::new(captured.ddm.clone()),
        lifecycle: Box::new(captured.lifecycle.clone()),
    };
    (captured, set)
}

fn request(rows: u64, devices: usize, fault_ratio: f64, seed: u64) -> GenerationRequest {
    GenerationRequest {
        range: DateRange::days(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
        ),
        rows_per_table: rows,
        environment: EnvironmentProfile::Datacenter,
        device_count: Some(devices),
        fault_ratio,
        seed: Some(seed),
        outputs: TableNames::default(),
    }
}

/// Serializes every captured table to one JSON blob for comparison.
fn fingerprint(captured: &Captured) -> String {
    let mut out = String::new();
    for row in captured.grpc.rows() {
        out.push_str(&serde_json::to_string(&row).unwrap());
        out.push('\n');
    }
    for row in captured.snmp.rows() {
        out.push_str(&serde_json::to_string(&row).unwrap());
        out.push('\n');
    }
    for row in captured.syslog.rows() {
        out.push_str(&serde_json::to_string(&row).unwrap());
        out.push('\n');
    }
    for row in captured.ddm.rows() {
        out.push_str(&serde_json::to_string(&row).unwrap());
        out.push('\n');
    }
    for row in captured.lifecycle.rows() {
        out.push_str(&serde_json::to_string(&row).unwrap());
        out.push('\n');
    }
    out
}

#[test]
fn same_seed_regenerates_byte_identical_rows() {
    let req = request(2_000, 6, 0.05, 77);

    let (first, set) = captured_sinks();
    run(&req, set).unwrap();
    let (second, set) = captured_sinks();
    run(&req, set).unwrap();

    assert_eq!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn different_seeds_diverge() {
    let (first, set) = captured_sinks();
    run(&request(1_000, 6, 0.05, 1), set).unwrap();
    let (second, set) = captured_sinks();
    run(&request(1_000, 6, 0.05, 2), set).unwrap();

    assert_ne!(fingerprint(&first), fingerprint(&second));
}

#[test]
fn every_module_id_resolves_to_the_topology() {
    let req = request(3_000, 8, 0.1, 55);
    let (captured, set) = captured_sinks();
    let summary = run(&req, set).unwrap();

    let topology = Topology::build(&req, summary.seed).unwrap();
    let known: HashSet<String> = topology
        .keys()
        .iter()
        .map(|k| k.module_id.clone())
        .collect();

    for row in captured.grpc.rows() {
        assert!(known.contains(&row.common.module_id), "orphan grpc key");
    }
    for row in captured.snmp.rows() {
        assert!(known.contains(&row.common.module_id), "orphan snmp key");
    }
    for row in captured.syslog.rows() {
        assert!(known.contains(&row.common.module_id), "orphan syslog key");
    }
    for row in captured.ddm.rows() {
        assert!(known.contains(&row.common.module_id), "orphan ddm key");
    }
    for row in captured.lifecycle.rows() {
        assert!(known.contains(&row.common.module_id), "orphan lifecycle key");
    }
}

#[test]
fn exact_volume_per_table() {
    let (captured, set) = captured_sinks();
    let summary = run(&request(1_337, 5, 0.02, 9), set).unwrap();

    for report in &summary.reports {
        assert_eq!(report.rows, 1_337, "{}", report.table);
        assert!(report.error.is_none());
    }
    assert_eq!(captured.grpc.len(), 1_337);
    assert_eq!(captured.lifecycle.len(), 1_337);
}

#[test]
fn fault_fraction_converges_within_tolerance() {
    let (_, set) = captured_sinks();
    let summary = run(&request(20_000, 10, 0.1, 3), set).unwrap();

    for report in &summary.reports {
        let fraction = report.flagged as f64 / report.rows as f64;
        assert!(
            (fraction - 0.1).abs() < 0.02,
            "{} fraction {} outside ±2% of 0.1",
            report.table,
            fraction
        );
    }
}

#[test]
fn acceptance_scenario_one_day_five_devices() {
    // One day, 1000 rows, ratio 0.1, 5 devices: exactly 1000 SNMP rows,
    // roughly 100 flagged, every key from the 5 devices' interfaces.
    let req = GenerationRequest {
        range: DateRange::days(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
        ),
        rows_per_table: 1_000,
        environment: EnvironmentProfile::Datacenter,
        device_count: Some(5),
        fault_ratio: 0.1,
        seed: Some(2025),
        outputs: TableNames::default(),
    };
    let (captured, set) = captured_sinks();
    let summary = run(&req, set).unwrap();

    let snmp = summary.report(TableKind::Snmp);
    assert_eq!(snmp.rows, 1_000);
    assert!(
        (50..=160).contains(&snmp.flagged),
        "flagged {} far from ~100",
        snmp.flagged
    );

    let hostnames: HashSet<String> = captured
        .snmp
        .rows()
        .iter()
        .map(|r| r.common.device_hostname.clone())
        .collect();
    assert_eq!(hostnames.len(), 5);
}

#[test]
fn zero_fault_ratio_means_everything_healthy() {
    let (captured, set) = captured_sinks();
    let summary = run(&request(2_000, 5, 0.0, 11), set).unwrap();

    for report in &summary.reports {
        assert_eq!(report.flagged, 0, "{}", report.table);
    }
    for row in captured.grpc.rows() {
        assert_eq!(row.oper_status, "up");
    }
    for row in captured.snmp.rows() {
        assert_eq!(row.if_oper_status, "up");
        assert_eq!(row.if_admin_status, "up");
    }
    for row in captured.syslog.rows() {
        assert!(row.severity_code >= 5, "non-informational syslog at ratio 0");
    }
}

#[test]
fn zero_volume_emits_nothing_but_finishes() {
    let (captured, set) = captured_sinks();
    let summary = run(&request(0, 5, 0.1, 4), set).unwrap();

    assert_eq!(summary.total_rows(), 0);
    for report in &summary.reports {
        assert!(report.error.is_none());
    }
    assert_eq!(captured.ddm.len(), 0);
    assert_eq!(captured.ddm.finished().as_deref(), Some("ddm"));
    assert_eq!(captured.syslog.finished().as_deref(), Some("syslog"));
}

#[test]
fn cross_table_fault_decisions_agree() {
    // SNMP and DDM share the 300s cadence, so identical (key, timestamp)
    // pairs appear in both tables and must carry the same verdict. A DDM
    // receive power below -20 dBm only ever comes from a link flap, and
    // a link flap must read oper-down on the SNMP side of the join.
    let (captured, set) = captured_sinks();
    run(&request(5_000, 5, 0.2, 21), set).unwrap();

    let flapped: HashSet<(String, String)> = captured
        .ddm
        .rows()
        .iter()
        .filter(|r| r.rx_power < -20.0)
        .map(|r| {
            (
                r.common.module_id.clone(),
                r.common.timestamp.to_rfc3339(),
            )
        })
        .collect();
    assert!(!flapped.is_empty(), "no link flaps at ratio 0.2");

    let mut shared = 0;
    for row in captured.snmp.rows() {
        let key = (
            row.common.module_id.clone(),
            row.common.timestamp.to_rfc3339(),
        );
        if flapped.contains(&key) {
            shared += 1;
            assert_eq!(
                row.if_oper_status, "down",
                "snmp healthy while ddm saw a flap on {}",
                key.0
            );
        }
    }
    assert!(shared > 0, "no shared (key, timestamp) pairs to compare");
}

#[test]
fn lifecycle_predictions_reflect_ddm_history() {
    // With a high fault ratio accumulated DDM severity is substantial,
    // so predictions must skew toward failure relative to a clean run.
    let (faulty, set) = captured_sinks();
    run(&request(4_000, 4, 0.5, 31), set).unwrap();
    let (clean, set) = captured_sinks();
    run(&request(4_000, 4, 0.0, 31), set).unwrap();

    let avg = |rows: &[LifecycleRecord]| {
        rows.iter().map(|r| r.failure_probability).sum::<f64>() / rows.len() as f64
    };
    let faulty_avg = avg(&faulty.lifecycle.rows());
    let clean_avg = avg(&clean.lifecycle.rows());
    assert!(
        faulty_avg > clean_avg + 0.1,
        "faulty {} vs clean {}",
        faulty_avg,
        clean_avg
    );
}
