//! Minimum-raw-id reconciliation.
//!
//! One canonical constraint can be reached through several raw constraint
//! records at the same time. Joining naively multiplies rows per timestamp,
//! so every grouping (identity mapping, hourly, daily, monthly) keeps only the
//! records carrying the smallest raw id of their group. Each caller supplies
//! its own group key; the rule is re-applied per granularity and never shared
//! between tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::RawConstraintId;

/// Record subject to the minimum-raw-id rule.
pub trait DedupRecord {
    /// Records competing for the same slot share this key.
    type GroupKey: Ord + Clone;
    /// Total order used for the output, so selection never depends on the
    /// order records arrived in.
    type OrderKey: Ord;

    fn group_key(&self) -> Self::GroupKey;
    fn raw_id(&self) -> RawConstraintId;
    fn order_key(&self) -> Self::OrderKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DedupStats {
    pub input: usize,
    pub groups: usize,
    pub kept: usize,
}

/// Keeps every record whose raw id is the minimum of its group.
///
/// Records sharing both group and minimum raw id are all kept (a daily outage
/// group holds one row per equipment). Output is sorted by `order_key`.
#[must_use]
pub fn select_min_raw_id<R: DedupRecord>(records: Vec<R>) -> (Vec<R>, DedupStats) {
    let input = records.len();
    let mut minimum: BTreeMap<R::GroupKey, RawConstraintId> = BTreeMap::new();
    for record in &records {
        let raw_id = record.raw_id();
        minimum
            .entry(record.group_key())
            .and_modify(|current| {
                if raw_id < *current {
                    *current = raw_id;
                }
            })
            .or_insert(raw_id);
    }

    let mut kept: Vec<R> = records
        .into_iter()
        .filter(|record| minimum.get(&record.group_key()) == Some(&record.raw_id()))
        .collect();
    kept.sort_by_key(|record| record.order_key());

    let stats = DedupStats {
        input,
        groups: minimum.len(),
        kept: kept.len(),
    };
    (kept, stats)
}

#[cfg(test)]
mod tests {
    use super::{DedupRecord, select_min_raw_id};
    use crate::core::RawConstraintId;

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        hour: u32,
        raw: i64,
        tag: &'static str,
    }

    impl DedupRecord for Sample {
        type GroupKey = u32;
        type OrderKey = (u32, i64, &'static str);

        fn group_key(&self) -> u32 {
            self.hour
        }

        fn raw_id(&self) -> RawConstraintId {
            RawConstraintId::new(self.raw)
        }

        fn order_key(&self) -> Self::OrderKey {
            (self.hour, self.raw, self.tag)
        }
    }

    fn sample(hour: u32, raw: i64, tag: &'static str) -> Sample {
        Sample { hour, raw, tag }
    }

    #[test]
    fn keeps_only_minimum_raw_id_per_group() {
        let (kept, stats) = select_min_raw_id(vec![
            sample(1, 30, "a"),
            sample(1, 20, "b"),
            sample(2, 50, "c"),
            sample(1, 20, "d"),
        ]);
        assert_eq!(
            kept,
            vec![sample(1, 20, "b"), sample(1, 20, "d"), sample(2, 50, "c")]
        );
        assert_eq!(stats.input, 4);
        assert_eq!(stats.groups, 2);
        assert_eq!(stats.kept, 3);
    }

    #[test]
    fn empty_input_is_a_valid_empty_selection() {
        let (kept, stats) = select_min_raw_id(Vec::<Sample>::new());
        assert!(kept.is_empty());
        assert_eq!(stats.groups, 0);
    }
}
