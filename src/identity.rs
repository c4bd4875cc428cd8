//! Common field block shared by every output table.
//!
//! `common_fields_for` is a pure function of a topology key and a
//! timestamp; it never consults fault or schema state. Because the key's
//! identity block is precomputed at topology build, the same `module_id`
//! surfaces byte-identically in all five tables, which is what keeps
//! cross-table joins valid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::topology::ModuleKey;

/// Timestamp wire format shared by all tables: `YYYY-MM-DD HH:MM:SS`.
/// Tables are joined on (`module_id`, timestamp proximity), so every
/// schema serializes time the same way.
pub mod ts_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// The identifying fields present in every output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonFields {
    #[serde(with = "ts_format")]
    pub timestamp: DateTime<Utc>,
    pub module_id: String,
    pub datacenter: String,
    pub room: String,
    pub rack: String,
    pub device_hostname: String,
    pub device_ip: String,
    pub device_vendor: String,
    pub interface: String,
    pub speed: String,
}

/// Resolves the common field block for one key at one instant.
pub fn common_fields_for(key: &ModuleKey, timestamp: DateTime<Utc>) -> CommonFields {
    CommonFields {
        timestamp,
        module_id: key.module_id.clone(),
        datacenter: key.datacenter.to_string(),
        room: key.room.to_string(),
        rack: key.rack.to_string(),
        device_hostname: key.hostname.clone(),
        device_ip: key.ip.clone(),
        device_vendor: key.device_vendor.to_string(),
        interface: key.interface.clone(),
        speed: key.speed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::OpticalBaseline;

    fn key() -> ModuleKey {
        ModuleKey {
            module_id: "Innolight-DC1-Pod01-Rack02-leaf-7-3-Ethernet4/12-100G".to_string(),
            datacenter: "DC1",
            room: "Pod01",
            rack: "Rack02",
            hostname: "leaf-7-3".to_string(),
            ip: "10.0.0.9".to_string(),
            device_vendor: "Arista",
            interface: "Ethernet4/12".to_string(),
            speed: "100G",
            if_index: 12,
            mtu: 9216,
            baseline: OpticalBaseline {
                temperature_c: 45.0,
                voltage_v: 3.3,
                bias_ma: 40.0,
                tx_power_dbm: 0.0,
                rx_power_dbm: -2.0,
            },
        }
    }

    #[test]
    fn fields_mirror_the_key() {
        let ts = chrono::NaiveDate::from_ymd_opt(2025, 3, 27)
            .unwrap()
            .and_hms_opt(10, 5, 0)
            .unwrap()
            .and_utc();
        let common = common_fields_for(&key(), ts);
        assert_eq!(common.module_id, key().module_id);
        assert_eq!(common.device_hostname, "leaf-7-3");
        assert_eq!(common.speed, "100G");
        assert_eq!(common.timestamp, ts);
    }

    #[test]
    fn timestamp_round_trips_in_join_format() {
        let ts = chrono::NaiveDate::from_ymd_opt(2025, 3, 27)
            .unwrap()
            .and_hms_opt(10, 5, 30)
            .unwrap()
            .and_utc();
        let common = common_fields_for(&key(), ts);
        let json = serde_json::to_string(&common).unwrap();
        assert!(json.contains("\"2025-03-27 10:05:30\""));
        let back: CommonFields = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp, ts);
    }

    #[test]
    fn identical_inputs_yield_identical_blocks() {
        let ts = chrono::Utc::now();
        let a = common_fields_for(&key(), ts);
        let b = common_fields_for(&key(), ts);
        assert_eq!(a, b);
    }
}
