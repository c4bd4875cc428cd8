//! Schema synthesizers, one per output table.
//!
//! Each synthesizer maps a (common-fields, fault-state, timestamp)
//! triple to one fully-populated typed row. All value sampling draws
//! from the caller's per-table seeded stream; synthesizers hold no state
//! of their own (Lifecycle Prediction additionally reads an explicit DDM
//! severity history view, which is passed in rather than coupled).

pub mod ddm;
pub mod grpc;
pub mod lifecycle;
pub mod snmp;
pub mod syslog;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::SimError;

/// The five output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Grpc,
    Snmp,
    Syslog,
    Ddm,
    Lifecycle,
}

impl TableKind {
    pub fn all() -> [TableKind; 5] {
        [
            Self::Grpc,
            Self::Snmp,
            Self::Syslog,
            Self::Ddm,
            Self::Lifecycle,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Grpc => "grpc",
            Self::Snmp => "snmp",
            Self::Syslog => "syslog",
            Self::Ddm => "ddm",
            Self::Lifecycle => "lifecycle",
        }
    }

    /// Native sampling cadence of the table's source, in seconds:
    /// streamed counters every minute, SNMP and DDM polls every five
    /// minutes, syslog at second resolution, lifecycle predictions
    /// hourly.
    pub fn cadence_secs(&self) -> i64 {
        match self {
            Self::Grpc => 60,
            Self::Snmp => 300,
            Self::Syslog => 1,
            Self::Ddm => 300,
            Self::Lifecycle => 3600,
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Domain guard used by every synthesizer: an out-of-range value is an
/// anchor/injector bug, so it is logged and surfaced, never clamped.
pub(crate) fn check_domain(
    table: TableKind,
    field: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
) -> Result<f64, SimError> {
    if !value.is_finite() || value < lo || value > hi {
        error!(
            table = table.name(),
            field,
            value,
            lo,
            hi,
            "synthesized value left its documented domain"
        );
        return Err(SimError::SchemaViolation {
            table,
            field,
            detail: format!("{} outside [{}, {}]", value, lo, hi),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadences_divide_a_day() {
        for table in TableKind::all() {
            assert_eq!(86_400 % table.cadence_secs(), 0, "{}", table);
        }
    }

    #[test]
    fn check_domain_accepts_bounds() {
        assert!(check_domain(TableKind::Ddm, "temperature", 120.0, -50.0, 120.0).is_ok());
        assert!(check_domain(TableKind::Ddm, "temperature", -50.0, -50.0, 120.0).is_ok());
    }

    #[test]
    fn check_domain_rejects_escapes() {
        assert!(check_domain(TableKind::Ddm, "tx_power", 11.0, -40.0, 10.0).is_err());
        assert!(check_domain(TableKind::Ddm, "tx_power", f64::NAN, -40.0, 10.0).is_err());
    }
}
