//! Fault injection.
//!
//! One decision per (key, 300-second bucket), shared by every schema
//! that touches the key inside the bucket: when the gRPC table sees a
//! key as degraded, the SNMP, syslog and DDM rows for the same key and
//! nearby timestamps agree. The decision is a pure function of
//! (run seed, module_id, bucket) through a stable 64-bit hash, so
//! per-table workers reach identical verdicts without sharing any
//! mutable state; a small per-injector memo keeps re-queries cheap.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::SimError;
use crate::topology::KeyId;

/// Width of the shared decision window. All schemas sampling a key
/// within one bucket observe the same fault state, which also gives
/// anomalies a short temporal run instead of single-row blips.
pub const FAULT_BUCKET_SECS: i64 = 300;

/// The fixed set of anomaly kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    LinkFlap,
    HighTemperature,
    HighErrorRate,
}

impl FaultKind {
    pub fn all() -> [FaultKind; 3] {
        [Self::LinkFlap, Self::HighTemperature, Self::HighErrorRate]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LinkFlap => "link_flap",
            Self::HighTemperature => "high_temperature",
            Self::HighErrorRate => "high_error_rate",
        }
    }

    /// Severity distribution anchor for this kind.
    fn severity_anchor(&self) -> (f64, f64) {
        match self {
            Self::LinkFlap => (0.60, 0.20),
            Self::HighTemperature => (0.55, 0.18),
            Self::HighErrorRate => (0.50, 0.20),
        }
    }
}

/// Fault verdict for one (key, bucket) pair. Ephemeral: it only
/// parametrizes synthesized values and is never persisted itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaultState {
    Normal,
    Anomaly { kind: FaultKind, severity: f64 },
}

impl FaultState {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, Self::Anomaly { .. })
    }

    pub fn severity(&self) -> f64 {
        match self {
            Self::Normal => 0.0,
            Self::Anomaly { severity, .. } => *severity,
        }
    }

    pub fn kind(&self) -> Option<FaultKind> {
        match self {
            Self::Normal => None,
            Self::Anomaly { kind, .. } => Some(*kind),
        }
    }
}

/// Seeded Bernoulli fault process with per-bucket memoization.
pub struct FaultInjector {
    seed: u64,
    fault_ratio: f64,
    cache: HashMap<(KeyId, i64), FaultState>,
}

impl FaultInjector {
    pub fn new(seed: u64, fault_ratio: f64) -> Result<Self, SimError> {
        if !(0.0..=1.0).contains(&fault_ratio) {
            return Err(SimError::configuration(
                "fault_ratio",
                format!("{} must lie in [0, 1]", fault_ratio),
            ));
        }
        Ok(Self {
            seed,
            fault_ratio,
            cache: HashMap::new(),
        })
    }

    /// Decides the fault state for a key at a timestamp. Stable for the
    /// whole run: re-querying the same (key, timestamp) — from any
    /// table worker — returns the same verdict.
    pub fn decide(&mut self, key: KeyId, module_id: &str, ts: DateTime<Utc>) -> FaultState {
        let bucket = ts.timestamp().div_euclid(FAULT_BUCKET_SECS);
        if let Some(state) = self.cache.get(&(key, bucket)) {
            return *state;
        }
        let state = decide_uncached(self.seed, module_id, bucket, self.fault_ratio);
        self.cache.insert((key, bucket), state);
        state
    }
}

fn decide_uncached(seed: u64, module_id: &str, bucket: i64, ratio: f64) -> FaultState {
    let hash = xxh3_64(format!("{}:{}:{}", seed, module_id, bucket).as_bytes());
    // Top 53 bits give a uniform roll in [0, 1).
    let roll = (hash >> 11) as f64 / (1u64 << 53) as f64;
    if roll >= ratio {
        return FaultState::Normal;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(hash);
    let kinds = FaultKind::all();
    let kind = kinds[rng.random_range(0..kinds.len())];
    let (mean, std) = kind.severity_anchor();
    let severity = Normal::new(mean, std)
        .map(|d| d.sample(&mut rng))
        .unwrap_or(mean)
        .clamp(0.05, 1.0);

    FaultState::Anomaly { kind, severity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn ratio_domain_enforced() {
        assert!(FaultInjector::new(1, -0.2).is_err());
        assert!(FaultInjector::new(1, 1.2).is_err());
        assert!(FaultInjector::new(1, 0.0).is_ok());
        assert!(FaultInjector::new(1, 1.0).is_ok());
    }

    #[test]
    fn zero_ratio_never_fires() {
        let mut injector = FaultInjector::new(3, 0.0).unwrap();
        for i in 0..1000 {
            let state = injector.decide(0, "Innolight-DC1-x", ts(i * 60));
            assert_eq!(state, FaultState::Normal);
        }
    }

    #[test]
    fn full_ratio_always_fires() {
        let mut injector = FaultInjector::new(3, 1.0).unwrap();
        for i in 0..100 {
            assert!(injector.decide(0, "Innolight-DC1-x", ts(i * 600)).is_anomalous());
        }
    }

    #[test]
    fn requery_is_stable() {
        let mut injector = FaultInjector::new(11, 0.5).unwrap();
        let first = injector.decide(4, "key-a", ts(12_345));
        for _ in 0..10 {
            assert_eq!(injector.decide(4, "key-a", ts(12_345)), first);
        }
    }

    #[test]
    fn independent_injectors_agree() {
        // Two table workers with separate injector instances must reach
        // the same verdicts for the same run seed.
        let mut a = FaultInjector::new(21, 0.4).unwrap();
        let mut b = FaultInjector::new(21, 0.4).unwrap();
        for i in 0..200 {
            let t = ts(i * 137);
            assert_eq!(a.decide(2, "key-b", t), b.decide(2, "key-b", t));
        }
    }

    #[test]
    fn timestamps_in_one_bucket_share_a_verdict() {
        let mut injector = FaultInjector::new(5, 0.5).unwrap();
        let base = injector.decide(1, "key-c", ts(9_000));
        assert_eq!(injector.decide(1, "key-c", ts(9_000 + FAULT_BUCKET_SECS - 1)), base);
    }

    #[test]
    fn empirical_ratio_converges() {
        let mut injector = FaultInjector::new(7, 0.1).unwrap();
        let mut flagged = 0u32;
        let total = 20_000;
        for i in 0..total {
            let state = injector.decide(
                (i % 64) as KeyId,
                &format!("key-{}", i % 64),
                ts(i as i64 * FAULT_BUCKET_SECS),
            );
            if state.is_anomalous() {
                flagged += 1;
            }
        }
        let fraction = f64::from(flagged) / f64::from(total);
        assert!((fraction - 0.1).abs() < 0.02, "fraction was {}", fraction);
    }

    #[test]
    fn severity_stays_in_unit_band() {
        let mut injector = FaultInjector::new(13, 1.0).unwrap();
        for i in 0..500 {
            let state = injector.decide(0, "key-d", ts(i * FAULT_BUCKET_SECS));
            let severity = state.severity();
            assert!((0.05..=1.0).contains(&severity));
        }
    }
}
