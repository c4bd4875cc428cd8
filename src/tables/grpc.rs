//! gRPC/gNMI streamed-counters synthesizer.
//!
//! Per-minute interface counters and gauges as decoded from a gNMI
//! subscription, tagged with the vendor's subscription path, plus the
//! optical readings vendors embed in the same stream. Faults widen the
//! error and discard counters, and a link flap takes the operational
//! status down with the traffic draining to a residual trickle.

use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SimError;
use crate::fault::{FaultKind, FaultState};
use crate::identity::CommonFields;
use crate::tables::ddm::{POWER_DOMAIN, TEMPERATURE_DOMAIN, jitter};
use crate::tables::{TableKind, check_domain, round2};
use crate::topology::{ModuleKey, speed_bps};

/// Interface-counters subscription path per device vendor.
static VENDOR_PATHS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (
            "Cisco",
            "Cisco-IOS-XR-infra-statsd-oper:infra-statistics/interfaces/interface/latest/generic-counters",
        ),
        ("Juniper", "/interfaces/interface/state/counters"),
        ("Arista", "eos_native:/show/interfaces/counters"),
        ("Huawei", "huawei-ifm:ifm/interfaces/interface/statistics"),
        ("Dell", "dell-if:interfaces/interface/statistics"),
        (
            "Broadcom Sonic",
            "openconfig-interfaces:interfaces/interface/state/counters",
        ),
        (
            "Community Sonic",
            "openconfig-interfaces:interfaces/interface/state/counters",
        ),
    ])
});

const OPENCONFIG_FALLBACK: &str = "openconfig-interfaces:interfaces/interface/state/counters";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrpcRecord {
    #[serde(flatten)]
    pub common: CommonFields,
    pub subscription_path: String,
    pub oper_status: String,
    pub in_octets: u64,
    pub out_octets: u64,
    pub in_errors: u64,
    pub out_errors: u64,
    pub in_discards: u64,
    pub out_discards: u64,
    /// Link utilization over the sampling interval, in [0, 1].
    pub utilization: f64,
    pub temperature: f64,
    pub tx_power: f64,
    pub rx_power: f64,
    /// Counter payload as the vendor's collector would frame it,
    /// serialized under the subscription path.
    pub raw_data: String,
}

pub fn synthesize(
    rng: &mut impl Rng,
    key: &ModuleKey,
    common: CommonFields,
    fault: &FaultState,
) -> Result<GrpcRecord, SimError> {
    let interval_secs = TableKind::Grpc.cadence_secs() as f64;
    let capacity_bps = speed_bps(key.speed) as f64;

    let mut utilization = rng.random_range(0.05..0.70);
    let mut oper_status = "up";
    let mut in_errors = rng.random_range(0..10u64);
    let mut out_errors = rng.random_range(0..10u64);
    let mut in_discards = rng.random_range(0..25u64);
    let mut out_discards = rng.random_range(0..25u64);

    let base = key.baseline;
    let mut temperature = jitter(rng, base.temperature_c, 2.0);
    let tx_power = jitter(rng, base.tx_power_dbm, 0.25);
    let mut rx_power = jitter(rng, base.rx_power_dbm, 0.4);

    if let FaultState::Anomaly { kind, severity } = fault {
        match kind {
            FaultKind::LinkFlap => {
                oper_status = "down";
                utilization = 0.0;
                in_errors += (severity * 200.0) as u64;
                rx_power = -28.0 - severity * 6.0;
            }
            FaultKind::HighErrorRate => {
                in_errors += (severity * 5_000.0) as u64;
                out_errors += (severity * 2_000.0) as u64;
                in_discards += (severity * 10_000.0) as u64;
                out_discards += (severity * 4_000.0) as u64;
            }
            FaultKind::HighTemperature => {
                temperature = 78.0 + severity * 8.0;
                rx_power -= severity * 1.5;
            }
        }
    }

    // Octet counters follow utilization over the sampling interval.
    let in_octets = (capacity_bps / 8.0 * interval_secs * utilization) as u64;
    let out_octets = (capacity_bps / 8.0
        * interval_secs
        * utilization
        * rng.random_range(0.6..1.0)) as u64;

    let subscription_path = VENDOR_PATHS
        .get(key.device_vendor)
        .copied()
        .unwrap_or(OPENCONFIG_FALLBACK);
    let raw_data = raw_payload(
        key,
        subscription_path,
        in_octets,
        out_octets,
        in_errors,
        out_errors,
        oper_status,
    );

    let table = TableKind::Grpc;
    Ok(GrpcRecord {
        common,
        subscription_path: subscription_path.to_string(),
        oper_status: oper_status.to_string(),
        in_octets,
        out_octets,
        in_errors,
        out_errors,
        in_discards,
        out_discards,
        utilization: round2(check_domain(table, "utilization", utilization, 0.0, 1.0)?),
        temperature: round2(check_domain(
            table,
            "temperature",
            temperature,
            TEMPERATURE_DOMAIN.0,
            TEMPERATURE_DOMAIN.1,
        )?),
        tx_power: round2(check_domain(
            table,
            "tx_power",
            tx_power,
            POWER_DOMAIN.0,
            POWER_DOMAIN.1,
        )?),
        rx_power: round2(check_domain(
            table,
            "rx_power",
            rx_power,
            POWER_DOMAIN.0,
            POWER_DOMAIN.1,
        )?),
        raw_data,
    })
}

/// Frames the counters the way the vendor's collector would decode
/// them, keyed by the subscription path.
fn raw_payload(
    key: &ModuleKey,
    path: &str,
    in_octets: u64,
    out_octets: u64,
    in_errors: u64,
    out_errors: u64,
    oper_status: &str,
) -> String {
    let inner = match key.device_vendor {
        "Cisco" => serde_json::json!({
            "interface-name": key.interface,
            "generic-counters": {
                "bytes-received": in_octets,
                "bytes-sent": out_octets,
                "input-errors": in_errors,
                "output-errors": out_errors,
            },
            "state": oper_status,
        }),
        "Arista" => serde_json::json!({
            "interfaces": {
                "name": key.interface,
                "inOctets": in_octets,
                "outOctets": out_octets,
                "inErrors": in_errors,
                "outErrors": out_errors,
                "lineProtocolStatus": oper_status,
            }
        }),
        "Huawei" => serde_json::json!({
            "ifName": key.interface,
            "ifStatistics": {
                "receiveByte": in_octets,
                "sendByte": out_octets,
                "rcvErrorPacket": in_errors,
                "sendErrorPacket": out_errors,
            },
            "ifOperStatus": oper_status,
        }),
        _ => serde_json::json!({
            "name": key.interface,
            "state": {
                "counters": {
                    "in-octets": in_octets,
                    "out-octets": out_octets,
                    "in-errors": in_errors,
                    "out-errors": out_errors,
                },
                "oper-status": oper_status,
            }
        }),
    };

    let mut framed = serde_json::Map::new();
    framed.insert(path.to_string(), inner);
    serde_json::Value::Object(framed).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::common_fields_for;
    use crate::topology::OpticalBaseline;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn key(vendor: &'static str) -> ModuleKey {
        ModuleKey {
            module_id: "Innolight-DC1-Pod01-Rack01-leaf-1-1-Ethernet1/1-100G".to_string(),
            datacenter: "DC1",
            room: "Pod01",
            rack: "Rack01",
            hostname: "leaf-1-1".to_string(),
            ip: "10.0.0.1".to_string(),
            device_vendor: vendor,
            interface: "Ethernet1/1".to_string(),
            speed: "100G",
            if_index: 1,
            mtu: 9216,
            baseline: OpticalBaseline {
                temperature_c: 42.0,
                voltage_v: 3.3,
                bias_ma: 35.0,
                tx_power_dbm: 0.2,
                rx_power_dbm: -2.5,
            },
        }
    }

    fn synth(vendor: &'static str, fault: FaultState) -> GrpcRecord {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let k = key(vendor);
        let common = common_fields_for(&k, Utc::now());
        synthesize(&mut rng, &k, common, &fault).unwrap()
    }

    #[test]
    fn normal_rows_are_up_with_sane_counters() {
        let record = synth("Arista", FaultState::Normal);
        assert_eq!(record.oper_status, "up");
        assert!(record.utilization > 0.0 && record.utilization <= 1.0);
        assert!(record.in_octets > 0);
        assert!(record.in_errors < 10);
        assert!(record.subscription_path.starts_with("eos_native:"));
    }

    #[test]
    fn octets_track_capacity() {
        let record = synth("Cisco", FaultState::Normal);
        let interval_capacity = 100_000_000_000u64 / 8 * 60;
        assert!(record.in_octets <= interval_capacity);
        assert!(record.out_octets <= record.in_octets);
    }

    #[test]
    fn link_flap_takes_status_down() {
        let record = synth(
            "Juniper",
            FaultState::Anomaly {
                kind: FaultKind::LinkFlap,
                severity: 0.8,
            },
        );
        assert_eq!(record.oper_status, "down");
        assert_eq!(record.utilization, 0.0);
        assert_eq!(record.in_octets, 0);
        assert!(record.rx_power < -25.0);
    }

    #[test]
    fn high_error_rate_widens_counters() {
        let record = synth(
            "Huawei",
            FaultState::Anomaly {
                kind: FaultKind::HighErrorRate,
                severity: 1.0,
            },
        );
        assert!(record.in_errors >= 5_000);
        assert!(record.in_discards >= 10_000);
        assert_eq!(record.oper_status, "up");
    }

    #[test]
    fn unknown_vendor_falls_back_to_openconfig() {
        let record = synth("SomethingElse", FaultState::Normal);
        assert!(record.subscription_path.starts_with("openconfig-interfaces:"));
    }

    #[test]
    fn raw_payload_is_valid_json_under_the_path() {
        let record = synth("Cisco", FaultState::Normal);
        let value: serde_json::Value = serde_json::from_str(&record.raw_data).unwrap();
        let inner = &value[record.subscription_path.as_str()];
        assert_eq!(inner["interface-name"], "Ethernet1/1");
        assert_eq!(
            inner["generic-counters"]["bytes-received"].as_u64(),
            Some(record.in_octets)
        );
    }
}
