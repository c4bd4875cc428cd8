//! Syslog event synthesizer.
//!
//! Structured events with facility/severity codes plus a raw line in the
//! device vendor's syslog framing. Message templates come from a fixed
//! catalog keyed by fault kind: normal traffic emits informational
//! protocol and link chatter, faults emit warning/error templates with
//! measured values attached.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::fault::{FaultKind, FaultState};
use crate::identity::CommonFields;
use crate::tables::{TableKind, check_domain};
use crate::topology::ModuleKey;

const FACILITIES: &[&str] = &[
    "kern", "daemon", "local0", "local1", "local2", "local3", "local4", "local5", "local6",
    "local7",
];

const PROTOCOLS: &[&str] = &["BGP", "OSPF", "VXLAN", "MPLS", "LLDP", "STP", "LACP", "ISIS"];

const NORMAL_EVENTS: &[&str] = &[
    "Link up",
    "Interface enabled",
    "Neighbor added",
    "Peer up",
    "Adjacency established",
    "Topology change",
    "Bundle up",
    "Module inserted",
    "Session established",
];

const LINK_FLAP_EVENTS: &[&str] = &["Link down", "Port flapping detected", "Carrier loss"];

const HIGH_TEMPERATURE_EVENTS: &[&str] = &["Temperature high", "DDM threshold crossed"];

const HIGH_ERROR_RATE_EVENTS: &[&str] = &[
    "CRC errors detected",
    "FCS errors detected",
    "Input errors accumulating",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyslogRecord {
    #[serde(flatten)]
    pub common: CommonFields,
    pub facility: String,
    pub severity: String,
    pub severity_code: u8,
    pub event: String,
    pub message: String,
    pub raw_log: String,
}

pub fn synthesize(
    rng: &mut impl Rng,
    key: &ModuleKey,
    common: CommonFields,
    fault: &FaultState,
) -> Result<SyslogRecord, SimError> {
    let facility = FACILITIES[rng.random_range(0..FACILITIES.len())];

    let (event, message, severity, severity_code) = match fault {
        FaultState::Normal => normal_line(rng, key),
        FaultState::Anomaly { kind, severity } => fault_line(rng, key, *kind, *severity),
    };

    check_domain(
        TableKind::Syslog,
        "severity_code",
        severity_code as f64,
        0.0,
        7.0,
    )?;

    let raw_log = frame(
        rng,
        key,
        &common,
        facility,
        severity,
        severity_code,
        &message,
    );

    Ok(SyslogRecord {
        common,
        facility: facility.to_string(),
        severity: severity.to_string(),
        severity_code,
        event,
        message,
        raw_log,
    })
}

fn normal_line(rng: &mut impl Rng, key: &ModuleKey) -> (String, String, &'static str, u8) {
    let event = NORMAL_EVENTS[rng.random_range(0..NORMAL_EVENTS.len())];
    let message = match event {
        "Peer up" | "Session established" => {
            let protocol = PROTOCOLS[rng.random_range(0..PROTOCOLS.len())];
            format!(
                "{}: {}: {}: peer 10.{}.{}.{} (AS {})",
                key.hostname,
                protocol,
                event,
                rng.random_range(1..254),
                rng.random_range(1..254),
                rng.random_range(1..254),
                rng.random_range(1000..65000)
            )
        }
        "Neighbor added" | "Adjacency established" | "Topology change" => {
            let protocol = PROTOCOLS[rng.random_range(0..PROTOCOLS.len())];
            format!("{}: {}: {}", key.hostname, protocol, event)
        }
        _ => format!("{}: {}: {}", key.hostname, key.interface, event),
    };
    let (severity, code) = if rng.random_bool(0.8) {
        ("info", 6)
    } else {
        ("notice", 5)
    };
    (event.to_string(), message, severity, code)
}

fn fault_line(
    rng: &mut impl Rng,
    key: &ModuleKey,
    kind: FaultKind,
    severity: f64,
) -> (String, String, &'static str, u8) {
    let (event, detail) = match kind {
        FaultKind::LinkFlap => {
            let event = LINK_FLAP_EVENTS[rng.random_range(0..LINK_FLAP_EVENTS.len())];
            (
                event,
                format!(
                    ", flaps: {}, duration: {}s",
                    1 + (severity * 20.0) as u32,
                    rng.random_range(1..60)
                ),
            )
        }
        FaultKind::HighTemperature => {
            let event =
                HIGH_TEMPERATURE_EVENTS[rng.random_range(0..HIGH_TEMPERATURE_EVENTS.len())];
            (
                event,
                format!(
                    ", value: {:.1}C, threshold: {:.1}C",
                    78.0 + severity * 8.0,
                    75.0
                ),
            )
        }
        FaultKind::HighErrorRate => {
            let event =
                HIGH_ERROR_RATE_EVENTS[rng.random_range(0..HIGH_ERROR_RATE_EVENTS.len())];
            (event, format!(", count: {}", (severity * 10_000.0) as u64))
        }
    };

    let message = format!(
        "{}: {}: {} transceiver: {}{}",
        key.hostname, key.interface, key.speed, event, detail
    );
    let (label, code) = if severity >= 0.7 {
        ("err", 3)
    } else {
        ("warning", 4)
    };
    (event.to_string(), message, label, code)
}

/// Renders the raw line in the device vendor's framing.
fn frame(
    rng: &mut impl Rng,
    key: &ModuleKey,
    common: &CommonFields,
    facility: &str,
    severity: &str,
    severity_code: u8,
    message: &str,
) -> String {
    let stamp = common.timestamp.format("%b %d %H:%M:%S");
    match key.device_vendor {
        "Cisco" => format!("{} {} {}: {}: {}", stamp, key.ip, severity, facility, message),
        "Juniper" => format!(
            "{} {} {} {}[{}]: {}: {}",
            stamp,
            key.ip,
            key.hostname,
            facility,
            rng.random_range(1000..9999),
            severity,
            message
        ),
        "Huawei" => format!("{} {} %%{}/{}/{}", stamp, key.ip, severity, facility, message),
        "Arista" => format!(
            "{} {} {}: {}: %{}-{}-{}: {}",
            stamp,
            key.ip,
            key.hostname,
            facility,
            severity.to_uppercase(),
            severity_code,
            facility.to_uppercase(),
            message
        ),
        _ => format!(
            "{} {} {} {}[{}]: {}: {}",
            stamp,
            key.ip,
            key.hostname,
            facility,
            rng.random_range(100..999),
            severity,
            message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::common_fields_for;
    use crate::topology::OpticalBaseline;
    use chrono::{NaiveDate, Utc};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn key(vendor: &'static str) -> ModuleKey {
        ModuleKey {
            module_id: "Accelink-DC1-Pod04-Rack03-edge-2-8-Ethernet5/3-200G".to_string(),
            datacenter: "DC1",
            room: "Pod04",
            rack: "Rack03",
            hostname: "edge-2-8".to_string(),
            ip: "100.64.0.12".to_string(),
            device_vendor: vendor,
            interface: "Ethernet5/3".to_string(),
            speed: "200G",
            if_index: 3,
            mtu: 9000,
            baseline: OpticalBaseline {
                temperature_c: 40.0,
                voltage_v: 3.3,
                bias_ma: 30.0,
                tx_power_dbm: 0.0,
                rx_power_dbm: -2.0,
            },
        }
    }

    fn synth(vendor: &'static str, fault: FaultState) -> SyslogRecord {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let k = key(vendor);
        let ts = NaiveDate::from_ymd_opt(2025, 3, 27)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        let common = common_fields_for(&k, ts);
        synthesize(&mut rng, &k, common, &fault).unwrap()
    }

    #[test]
    fn normal_events_are_informational() {
        let record = synth("Cisco", FaultState::Normal);
        assert!(record.severity_code >= 5, "code {}", record.severity_code);
        assert!(record.message.contains("edge-2-8"));
    }

    #[test]
    fn faults_emit_warning_or_error_templates() {
        let record = synth(
            "Cisco",
            FaultState::Anomaly {
                kind: FaultKind::HighTemperature,
                severity: 0.9,
            },
        );
        assert_eq!(record.severity, "err");
        assert!(record.message.contains("threshold"));
    }

    #[test]
    fn mild_faults_stay_at_warning() {
        let record = synth(
            "Cisco",
            FaultState::Anomaly {
                kind: FaultKind::HighErrorRate,
                severity: 0.3,
            },
        );
        assert_eq!(record.severity, "warning");
        assert_eq!(record.severity_code, 4);
    }

    #[test]
    fn link_flap_names_the_interface() {
        let record = synth(
            "Arista",
            FaultState::Anomaly {
                kind: FaultKind::LinkFlap,
                severity: 0.8,
            },
        );
        assert!(record.message.contains("Ethernet5/3"));
        assert!(record.message.contains("flaps:"));
    }

    #[test]
    fn raw_framing_follows_the_vendor() {
        let huawei = synth(
            "Huawei",
            FaultState::Anomaly {
                kind: FaultKind::LinkFlap,
                severity: 0.5,
            },
        );
        assert!(huawei.raw_log.contains("%%"));

        let juniper = synth("Juniper", FaultState::Normal);
        assert!(juniper.raw_log.contains("edge-2-8"));
        assert!(juniper.raw_log.contains('['));

        let cisco = synth("Cisco", FaultState::Normal);
        assert!(cisco.raw_log.starts_with("Mar 27"));
    }
}
