//! Optical module lifecycle prediction.
//!
//! The only derived table: predictions are computed from the DDM
//! severity history already synthesized for the same key, never sampled
//! independently. The history is an explicit, bounded view passed in by
//! the runner — the synthesizer itself stays pure, so it can be tested
//! against any supplied history. Failure probability rises monotonically
//! with accumulated severity; remaining life falls with it.

use std::collections::VecDeque;

use chrono::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::fault::FaultState;
use crate::identity::CommonFields;
use crate::tables::{TableKind, check_domain, round2};
use crate::topology::{KeyId, ModuleKey};

/// Rule label stamped on every prediction row.
pub const MODEL_NAME: &str = "ddm-severity-accumulator-v1";

/// Baseline failure probability of a healthy module.
const BASE_PROBABILITY: f64 = 0.02;
/// Decay constant mapping accumulated severity to probability.
const LAMBDA: f64 = 0.35;
/// Remaining-life band in days for a healthy module.
const MAX_REMAINING_DAYS: f64 = 1000.0;
const MIN_REMAINING_DAYS: f64 = 30.0;

/// Bounded per-key view of recent DDM fault severities. The runner
/// records one entry per synthesized DDM row; only the most recent
/// entries per key are retained, which keeps memory proportional to the
/// key count, not the row volume.
pub struct DdmHistory {
    per_key: Vec<VecDeque<f64>>,
    capacity: usize,
}

impl DdmHistory {
    pub fn new(key_count: usize) -> Self {
        Self::with_capacity(key_count, 32)
    }

    pub fn with_capacity(key_count: usize, capacity: usize) -> Self {
        Self {
            per_key: vec![VecDeque::new(); key_count],
            capacity,
        }
    }

    pub fn record(&mut self, key: KeyId, severity: f64) {
        let window = &mut self.per_key[key];
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(severity);
    }

    /// Total fault severity retained for a key.
    pub fn accumulated(&self, key: KeyId) -> f64 {
        self.per_key[key].iter().sum()
    }

    pub fn samples(&self, key: KeyId) -> usize {
        self.per_key[key].len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    #[serde(flatten)]
    pub common: CommonFields,
    pub failure_probability: f64,
    pub predicted_remaining_days: u32,
    pub predicted_date: String,
    pub model: String,
}

pub fn synthesize(
    rng: &mut impl Rng,
    key_id: KeyId,
    _key: &ModuleKey,
    common: CommonFields,
    fault: &FaultState,
    history: &DdmHistory,
) -> Result<LifecycleRecord, SimError> {
    // The prediction instant's own fault state counts toward the
    // accumulated evidence, so a module degrading right now predicts
    // worse than its history alone would say.
    let accumulated = history.accumulated(key_id) + fault.severity();

    let probability = 1.0 - (1.0 - BASE_PROBABILITY) * (-LAMBDA * accumulated).exp();
    let probability = check_domain(
        TableKind::Lifecycle,
        "failure_probability",
        probability,
        0.0,
        1.0,
    )?;

    let span = MAX_REMAINING_DAYS - MIN_REMAINING_DAYS;
    let noise = rng.random_range(-15.0..15.0);
    let remaining = (MIN_REMAINING_DAYS + span * (1.0 - probability) + noise)
        .clamp(1.0, MAX_REMAINING_DAYS);
    let remaining_days = remaining as u32;

    let predicted_date = (common.timestamp + Duration::days(remaining_days as i64))
        .format("%Y-%m-%d")
        .to_string();

    Ok(LifecycleRecord {
        common,
        failure_probability: round2(probability * 100.0) / 100.0,
        predicted_remaining_days: remaining_days,
        predicted_date,
        model: MODEL_NAME.to_string(),
    })
}
