//! SNMP poll synthesizer.
//!
//! Standard IF-MIB style fields, serialized under their MIB object
//! names. Faults either take the operational status down (link flap) or
//! spike the broadcast/storm and error counters; with a zero fault
//! ratio every row reads admin up / oper up.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::fault::{FaultKind, FaultState};
use crate::identity::CommonFields;
use crate::tables::{TableKind, check_domain};
use crate::topology::{ModuleKey, speed_bps};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnmpRecord {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(rename = "ifIndex")]
    pub if_index: u32,
    #[serde(rename = "ifDescr")]
    pub if_descr: String,
    #[serde(rename = "ifMtu")]
    pub if_mtu: u32,
    #[serde(rename = "ifSpeed")]
    pub if_speed: u64,
    #[serde(rename = "ifAdminStatus")]
    pub if_admin_status: String,
    #[serde(rename = "ifOperStatus")]
    pub if_oper_status: String,
    #[serde(rename = "ifHCInOctets")]
    pub if_hc_in_octets: u64,
    #[serde(rename = "ifHCOutOctets")]
    pub if_hc_out_octets: u64,
    #[serde(rename = "ifInErrors")]
    pub if_in_errors: u64,
    #[serde(rename = "ifOutErrors")]
    pub if_out_errors: u64,
    #[serde(rename = "ifInDiscards")]
    pub if_in_discards: u64,
    #[serde(rename = "ifOutDiscards")]
    pub if_out_discards: u64,
    #[serde(rename = "ifInBroadcastPkts")]
    pub if_in_broadcast_pkts: u64,
    #[serde(rename = "ifOutBroadcastPkts")]
    pub if_out_broadcast_pkts: u64,
    #[serde(rename = "macTableSize")]
    pub mac_table_size: u64,
}

pub fn synthesize(
    rng: &mut impl Rng,
    key: &ModuleKey,
    common: CommonFields,
    fault: &FaultState,
) -> Result<SnmpRecord, SimError> {
    let mut oper_status = "up";
    let mut in_octets = rng.random_range(1_000_000..10_000_000_000u64);
    let mut out_octets = rng.random_range(1_000_000..10_000_000_000u64);
    let mut in_errors = rng.random_range(0..100u64);
    let mut out_errors = rng.random_range(0..100u64);
    let mut in_discards = rng.random_range(0..1_000u64);
    let mut out_discards = rng.random_range(0..1_000u64);
    let mut in_broadcast = rng.random_range(100..10_000u64);
    let mut out_broadcast = rng.random_range(100..10_000u64);

    if let FaultState::Anomaly { kind, severity } = fault {
        match kind {
            FaultKind::LinkFlap => {
                oper_status = "down";
                // Residual counters from before the link dropped.
                in_octets = rng.random_range(1_000..100_000);
                out_octets = rng.random_range(1_000..100_000);
                in_errors += (severity * 500.0) as u64;
            }
            FaultKind::HighErrorRate => {
                // Broadcast storm: flooded segments swamp the counters.
                in_broadcast += (severity * 5_000_000.0) as u64;
                out_broadcast += (severity * 2_000_000.0) as u64;
                in_errors += (severity * 10_000.0) as u64;
                in_discards += (severity * 50_000.0) as u64;
            }
            FaultKind::HighTemperature => {
                // Thermal alarms live in the DDM table; the poll still
                // shows light discard pressure.
                in_discards += (severity * 200.0) as u64;
            }
        }
    }

    check_domain(
        TableKind::Snmp,
        "ifInErrors",
        in_errors as f64,
        0.0,
        u32::MAX as f64,
    )?;

    Ok(SnmpRecord {
        if_index: key.if_index,
        if_descr: key.interface.clone(),
        if_mtu: key.mtu,
        if_speed: speed_bps(key.speed),
        if_admin_status: "up".to_string(),
        if_oper_status: oper_status.to_string(),
        if_hc_in_octets: in_octets,
        if_hc_out_octets: out_octets,
        if_in_errors: in_errors,
        if_out_errors: out_errors,
        if_in_discards: in_discards,
        if_out_discards: out_discards,
        if_in_broadcast_pkts: in_broadcast,
        if_out_broadcast_pkts: out_broadcast,
        mac_table_size: rng.random_range(5_000..50_000),
        common,
    })
}
