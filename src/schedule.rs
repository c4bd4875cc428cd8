//! Time-series scheduling.
//!
//! A `SamplePlan` distributes a requested row volume across the
//! topology's keys and the requested date range at a table's native
//! cadence. Plans are cheap value objects; `iter()` hands out a fresh
//! deterministic iterator every time, so a plan can be re-walked (or a
//! walk abandoned early) without touching any shared state.
//!
//! Distribution policy: every key receives `rows / keys` samples and the
//! first `rows % keys` keys in iteration order receive one extra.
//! Per-key timestamps are spaced evenly across the range, quantized down
//! to the cadence; iteration is round-robin across keys so output
//! interleaves devices instead of draining one device at a time, while
//! each key's own sub-sequence stays in ascending time order.

use chrono::{DateTime, Duration, Utc};

use crate::config::DateRange;
use crate::error::SimError;
use crate::topology::KeyId;

/// Finite, restartable plan of (key, timestamp) pairs.
#[derive(Debug, Clone)]
pub struct SamplePlan {
    start: DateTime<Utc>,
    span_secs: i64,
    cadence_secs: i64,
    key_count: usize,
    base_rows: u64,
    extra_keys: u64,
}

impl SamplePlan {
    /// Lays out `target_rows` samples. Fails when the range is empty or
    /// inverted, or when it is shorter than one cadence step (the
    /// granularity could not produce a single aligned sample per key).
    pub fn plan(
        range: &DateRange,
        target_rows: u64,
        key_count: usize,
        cadence_secs: i64,
    ) -> Result<SamplePlan, SimError> {
        let span_secs = range.span_secs();
        if span_secs <= 0 {
            return Err(SimError::configuration(
                "date_range",
                "end must be after start",
            ));
        }
        if span_secs < cadence_secs {
            return Err(SimError::configuration(
                "date_range",
                format!(
                    "range of {}s is shorter than the {}s sampling cadence",
                    span_secs, cadence_secs
                ),
            ));
        }
        if key_count == 0 {
            return Err(SimError::configuration(
                "device_count",
                "topology produced no keyed interfaces",
            ));
        }

        Ok(SamplePlan {
            start: range.start,
            span_secs,
            cadence_secs,
            key_count,
            base_rows: target_rows / key_count as u64,
            extra_keys: target_rows % key_count as u64,
        })
    }

    pub fn total_rows(&self) -> u64 {
        self.base_rows * self.key_count as u64 + self.extra_keys
    }

    pub fn rows_for_key(&self, key: KeyId) -> u64 {
        if (key as u64) < self.extra_keys {
            self.base_rows + 1
        } else {
            self.base_rows
        }
    }

    /// Fresh deterministic walk over the plan. Two iterators from the
    /// same plan yield identical sequences.
    pub fn iter(&self) -> PlanIter<'_> {
        PlanIter {
            plan: self,
            round: 0,
            key: 0,
        }
    }

    fn timestamp_for(&self, key: KeyId, round: u64) -> DateTime<Utc> {
        let rows = self.rows_for_key(key).max(1);
        let offset = (round as i128 * self.span_secs as i128 / rows as i128) as i64;
        let quantized = offset - offset.rem_euclid(self.cadence_secs);
        self.start + Duration::seconds(quantized)
    }

    fn max_rows_per_key(&self) -> u64 {
        if self.extra_keys > 0 {
            self.base_rows + 1
        } else {
            self.base_rows
        }
    }
}

/// Lazy walk over a `SamplePlan`. Dropping it mid-walk is the supported
/// cancellation path; nothing is cleaned up because nothing is held.
pub struct PlanIter<'a> {
    plan: &'a SamplePlan,
    round: u64,
    key: usize,
}

impl Iterator for PlanIter<'_> {
    type Item = (KeyId, DateTime<Utc>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.round >= self.plan.max_rows_per_key() {
                return None;
            }
            if self.key >= self.plan.key_count {
                self.key = 0;
                self.round += 1;
                continue;
            }
            let key = self.key;
            self.key += 1;
            if self.round < self.plan.rows_for_key(key) {
                return Some((key, self.plan.timestamp_for(key, self.round)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn one_day() -> DateRange {
        DateRange::days(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
        )
    }

    #[test]
    fn emits_exactly_the_requested_volume() {
        let plan = SamplePlan::plan(&one_day(), 1000, 7, 60).unwrap();
        assert_eq!(plan.total_rows(), 1000);
        assert_eq!(plan.iter().count(), 1000);
    }

    #[test]
    fn remainder_goes_to_earliest_keys() {
        let plan = SamplePlan::plan(&one_day(), 10, 4, 60).unwrap();
        assert_eq!(plan.rows_for_key(0), 3);
        assert_eq!(plan.rows_for_key(1), 3);
        assert_eq!(plan.rows_for_key(2), 2);
        assert_eq!(plan.rows_for_key(3), 2);
    }

    #[test]
    fn zero_volume_yields_empty_walk() {
        let plan = SamplePlan::plan(&one_day(), 0, 5, 60).unwrap();
        assert_eq!(plan.iter().count(), 0);
    }

    #[test]
    fn walks_are_idempotent() {
        let plan = SamplePlan::plan(&one_day(), 500, 9, 300).unwrap();
        let first: Vec<_> = plan.iter().collect();
        let second: Vec<_> = plan.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn per_key_subsequences_ascend() {
        let plan = SamplePlan::plan(&one_day(), 300, 6, 60).unwrap();
        let mut last = vec![None; 6];
        for (key, ts) in plan.iter() {
            if let Some(prev) = last[key] {
                assert!(ts >= prev, "key {} went backwards", key);
            }
            last[key] = Some(ts);
        }
    }

    #[test]
    fn output_interleaves_keys() {
        let plan = SamplePlan::plan(&one_day(), 30, 3, 60).unwrap();
        let keys: Vec<KeyId> = plan.iter().map(|(k, _)| k).collect();
        // Round-robin: the first three items cover all three keys.
        assert_eq!(&keys[..3], &[0, 1, 2]);
        assert_eq!(&keys[3..6], &[0, 1, 2]);
    }

    #[test]
    fn timestamps_stay_inside_the_range() {
        let range = one_day();
        let plan = SamplePlan::plan(&range, 2000, 11, 300).unwrap();
        for (_, ts) in plan.iter() {
            assert!(ts >= range.start && ts < range.end);
        }
    }

    #[test]
    fn timestamps_align_to_cadence() {
        let range = one_day();
        let plan = SamplePlan::plan(&range, 400, 5, 300).unwrap();
        for (_, ts) in plan.iter() {
            let offset = (ts - range.start).num_seconds();
            assert_eq!(offset % 300, 0);
        }
    }

    #[test]
    fn inverted_range_rejected() {
        let range = DateRange::days(
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
        assert!(SamplePlan::plan(&range, 10, 2, 60).is_err());
    }

    #[test]
    fn range_shorter_than_cadence_rejected() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let range = DateRange::new(start, start + Duration::seconds(120));
        assert!(SamplePlan::plan(&range, 10, 2, 3600).is_err());
        assert!(SamplePlan::plan(&range, 10, 2, 60).is_ok());
    }

    #[test]
    fn volume_beyond_slot_count_still_lands_on_cadence() {
        // More rows per key than cadence slots: timestamps collapse onto
        // shared slots rather than drifting off-grid.
        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let range = DateRange::new(start, start + Duration::seconds(600));
        let plan = SamplePlan::plan(&range, 40, 2, 300).unwrap();
        assert_eq!(plan.iter().count(), 40);
        for (_, ts) in plan.iter() {
            assert_eq!((ts - start).num_seconds() % 300, 0);
        }
    }
}
