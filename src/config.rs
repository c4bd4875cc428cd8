//! Generation request and environment profiles.
//!
//! The request is the whole external configuration surface: date range,
//! row volume per table, environment profile (topology shape class),
//! optional device-count override, fault ratio, per-table output names
//! and an optional seed. All fields are validated eagerly; nothing
//! downstream re-checks user input.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::tables::TableKind;

/// Upper bound on simulated devices, enforced before topology build.
pub const MAX_DEVICES: usize = 10_000;

/// Network environment shape class. Each profile fixes device-name
/// prefixes, the address block, vendor weighting and port density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentProfile {
    Datacenter,
    Enterprise,
    Isp,
    Campus,
    /// Superset profile: every prefix and vendor in rotation.
    Complete,
}

pub(crate) struct ProfileShape {
    pub prefixes: &'static [&'static str],
    /// Network address of the management block, as a host-order u32.
    pub network: u32,
    pub primary_vendors: &'static [&'static str],
    pub port_density: (usize, usize),
    pub default_devices: usize,
}

const DATACENTER: ProfileShape = ProfileShape {
    prefixes: &["spine", "leaf", "border", "core"],
    network: 0x0A00_0000, // 10.0.0.0/8
    primary_vendors: &["Cisco", "Arista", "Juniper"],
    port_density: (24, 64),
    default_devices: 100,
};

const ENTERPRISE: ProfileShape = ProfileShape {
    prefixes: &["core", "dist", "access", "edge"],
    network: 0xC0A8_0000, // 192.168.0.0/16
    primary_vendors: &["Cisco", "Huawei", "Juniper"],
    port_density: (8, 48),
    default_devices: 50,
};

const ISP: ProfileShape = ProfileShape {
    prefixes: &["edge", "agg", "core", "pe", "p"],
    network: 0x6440_0000, // 100.64.0.0/10
    primary_vendors: &["Cisco", "Juniper", "Huawei"],
    port_density: (4, 32),
    default_devices: 30,
};

const CAMPUS: ProfileShape = ProfileShape {
    prefixes: &["bb", "dist", "access", "wifi"],
    network: 0xAC10_0000, // 172.16.0.0/12
    primary_vendors: &["Cisco", "Huawei", "Arista"],
    port_density: (24, 48),
    default_devices: 40,
};

const COMPLETE: ProfileShape = ProfileShape {
    prefixes: &["spine", "leaf", "border", "core", "edge", "pe", "p", "agg"],
    network: 0x0A00_0000,
    primary_vendors: &[
        "Cisco",
        "Huawei",
        "Juniper",
        "Arista",
        "Dell",
        "Broadcom Sonic",
        "Community Sonic",
    ],
    port_density: (24, 64),
    default_devices: 100,
};

impl EnvironmentProfile {
    pub fn all() -> [EnvironmentProfile; 5] {
        [
            Self::Datacenter,
            Self::Enterprise,
            Self::Isp,
            Self::Campus,
            Self::Complete,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Datacenter => "datacenter",
            Self::Enterprise => "enterprise",
            Self::Isp => "isp",
            Self::Campus => "campus",
            Self::Complete => "complete",
        }
    }

    pub fn default_devices(&self) -> usize {
        self.shape().default_devices
    }

    pub(crate) fn shape(&self) -> &'static ProfileShape {
        match self {
            Self::Datacenter => &DATACENTER,
            Self::Enterprise => &ENTERPRISE,
            Self::Isp => &ISP,
            Self::Campus => &CAMPUS,
            Self::Complete => &COMPLETE,
        }
    }
}

impl std::str::FromStr for EnvironmentProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|p| p.name() == s.to_lowercase())
            .ok_or_else(|| format!("unknown environment profile '{}'", s))
    }
}

impl std::fmt::Display for EnvironmentProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Half-open time window `[start, end)` bounding every scheduled sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole-day range from midnight of `start` to midnight of `end`.
    pub fn days(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
            end: end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        }
    }

    pub fn span_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Output name per table. Forwarded to the sink verbatim; the core never
/// interprets these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNames {
    pub grpc: String,
    pub snmp: String,
    pub syslog: String,
    pub ddm: String,
    pub lifecycle: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            grpc: "grpc_data".to_string(),
            snmp: "snmp_data".to_string(),
            syslog: "syslog_data".to_string(),
            ddm: "ddm_data".to_string(),
            lifecycle: "predict_data".to_string(),
        }
    }
}

impl TableNames {
    pub fn get(&self, table: TableKind) -> &str {
        match table {
            TableKind::Grpc => &self.grpc,
            TableKind::Snmp => &self.snmp,
            TableKind::Syslog => &self.syslog,
            TableKind::Ddm => &self.ddm,
            TableKind::Lifecycle => &self.lifecycle,
        }
    }
}

/// External configuration of one generation run. Read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub range: DateRange,
    pub rows_per_table: u64,
    pub environment: EnvironmentProfile,
    /// Overrides the profile's default device cardinality when set.
    pub device_count: Option<usize>,
    /// Fraction of (key, time-bucket) pairs marked anomalous, in [0, 1].
    pub fault_ratio: f64,
    /// Fixed seed for reproducible output. When omitted a fresh seed is
    /// drawn and reported back in the run summary.
    pub seed: Option<u64>,
    pub outputs: TableNames,
}

impl GenerationRequest {
    /// Validates every field eagerly. Called once, before any topology
    /// or row work starts; generation never begins on a bad request.
    pub fn validate(&self) -> Result<(), SimError> {
        let devices = self.devices();
        if devices == 0 {
            return Err(SimError::configuration(
                "device_count",
                "must be positive",
            ));
        }
        if devices > MAX_DEVICES {
            return Err(SimError::configuration(
                "device_count",
                format!("{} exceeds the maximum of {}", devices, MAX_DEVICES),
            ));
        }
        if !(0.0..=1.0).contains(&self.fault_ratio) {
            return Err(SimError::configuration(
                "fault_ratio",
                format!("{} must lie in [0, 1]", self.fault_ratio),
            ));
        }
        if self.range.span_secs() <= 0 {
            return Err(SimError::configuration(
                "date_range",
                "end must be after start",
            ));
        }
        Ok(())
    }

    pub fn devices(&self) -> usize {
        self.device_count
            .unwrap_or_else(|| self.environment.default_devices())
    }

    /// The seed actually used by the run. A drawn seed is reported back
    /// so any run can be reproduced exactly.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }
}
