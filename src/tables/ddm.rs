//! DDM (digital diagnostic monitoring) synthesizer.
//!
//! Optical transceiver health readings sampled around each module's
//! baseline operating point. Faults perturb the channels their kind
//! implicates: high-temperature pushes the module into the 78–86 °C
//! alarm band with sagging supply voltage, a link flap collapses
//! receive power toward loss-of-signal, and a high error rate shows up
//! as degraded receive power with elevated bias current.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::fault::{FaultKind, FaultState};
use crate::identity::CommonFields;
use crate::tables::{TableKind, check_domain, round2};
use crate::topology::ModuleKey;

/// Documented value domains; escaping them is a schema violation.
pub const TEMPERATURE_DOMAIN: (f64, f64) = (-50.0, 120.0);
pub const VOLTAGE_DOMAIN: (f64, f64) = (0.0, 6.0);
pub const BIAS_DOMAIN: (f64, f64) = (0.0, 150.0);
pub const POWER_DOMAIN: (f64, f64) = (-40.0, 10.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdmRecord {
    #[serde(flatten)]
    pub common: CommonFields,
    pub temperature: f64,
    pub voltage: f64,
    pub bias_current: f64,
    pub tx_power: f64,
    pub rx_power: f64,
}

pub fn synthesize(
    rng: &mut impl Rng,
    key: &ModuleKey,
    common: CommonFields,
    fault: &FaultState,
) -> Result<DdmRecord, SimError> {
    let base = key.baseline;
    let mut temperature = jitter(rng, base.temperature_c, 2.5);
    let mut voltage = jitter(rng, base.voltage_v, 0.03);
    let mut bias_current = jitter(rng, base.bias_ma, 2.0);
    let tx_power = jitter(rng, base.tx_power_dbm, 0.25);
    let mut rx_power = jitter(rng, base.rx_power_dbm, 0.4);

    if let FaultState::Anomaly { kind, severity } = fault {
        match kind {
            FaultKind::HighTemperature => {
                temperature = 78.0 + severity * 8.0 + jitter(rng, 0.0, 0.5);
                voltage = 3.0 + (1.0 - severity) * 0.15;
            }
            FaultKind::LinkFlap => {
                rx_power = -28.0 - severity * 8.0 + jitter(rng, 0.0, 0.5);
            }
            FaultKind::HighErrorRate => {
                rx_power = -8.0 - severity * 4.0 + jitter(rng, 0.0, 0.3);
                bias_current = base.bias_ma + severity * 30.0;
            }
        }
    }

    let table = TableKind::Ddm;
    Ok(DdmRecord {
        common,
        temperature: round2(check_domain(
            table,
            "temperature",
            temperature,
            TEMPERATURE_DOMAIN.0,
            TEMPERATURE_DOMAIN.1,
        )?),
        voltage: round2(check_domain(
            table,
            "voltage",
            voltage,
            VOLTAGE_DOMAIN.0,
            VOLTAGE_DOMAIN.1,
        )?),
        bias_current: round2(check_domain(
            table,
            "bias_current",
            bias_current,
            BIAS_DOMAIN.0,
            BIAS_DOMAIN.1,
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
    })
}

pub(crate) fn jitter(rng: &mut impl Rng, mid: f64, spread: f64) -> f64 {
    Normal::new(mid, spread)
        .map(|d| d.sample(rng))
        .unwrap_or(mid)
}
