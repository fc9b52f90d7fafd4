use std::cmp::Reverse;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CanonicalConstraintId, RawConstraintId, format_currency};

/// Day-ahead market shadow price of one constraint against the simulated
/// shadow price of each scenario, both summed over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMortemRow {
    pub canonical: CanonicalConstraintId,
    /// Raw id of the market mapping; unmapped market constraints have none.
    pub raw: Option<RawConstraintId>,
    pub constraint_name: String,
    pub contingency: Option<String>,
    pub sp_day_ahead: i64,
    /// Absolute simulated shadow price per scenario name. `None` when the
    /// scenario never bound the constraint.
    pub simulated: IndexMap<String, Option<i64>>,
}

impl PostMortemRow {
    #[must_use]
    pub fn simulated(&self, scenario: &str) -> Option<i64> {
        self.simulated.get(scenario).copied().flatten()
    }

    #[must_use]
    pub fn sp_day_ahead_display(&self) -> String {
        format_currency(Decimal::from(self.sp_day_ahead))
    }
}

/// Pool-wide post-mortem: every constraint the day-ahead market bound,
/// ordered by decreasing `|SP_DA|`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMortemTable {
    /// Scenario columns in first-seen order.
    pub scenarios: Vec<String>,
    pub rows: Vec<PostMortemRow>,
}

impl PostMortemTable {
    /// Ties on `|SP_DA|` are broken by canonical then raw id.
    #[must_use]
    pub fn from_rows(mut rows: Vec<PostMortemRow>) -> Self {
        rows.sort_by_key(|row| (Reverse(row.sp_day_ahead.unsigned_abs()), row.canonical, row.raw));
        let mut scenarios: Vec<String> = Vec::new();
        for row in &rows {
            for scenario in row.simulated.keys() {
                if !scenarios.contains(scenario) {
                    scenarios.push(scenario.clone());
                }
            }
        }
        Self { scenarios, rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row of `canonical`, the one with the largest `|SP_DA|`.
    #[must_use]
    pub fn get(&self, canonical: CanonicalConstraintId) -> Option<&PostMortemRow> {
        self.rows.iter().find(|row| row.canonical == canonical)
    }

    /// Constraints the market bound but no listed scenario did.
    pub fn missed_by_simulation(&self) -> impl Iterator<Item = &PostMortemRow> {
        self.rows
            .iter()
            .filter(|row| row.simulated.values().all(|value| value.unwrap_or(0) == 0))
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::{PostMortemRow, PostMortemTable};
    use crate::core::{CanonicalConstraintId, RawConstraintId};

    fn row(canonical: i64, sp_day_ahead: i64, simulated: &[(&str, Option<i64>)]) -> PostMortemRow {
        PostMortemRow {
            canonical: CanonicalConstraintId::new(canonical),
            raw: Some(RawConstraintId::new(canonical + 1)),
            constraint_name: format!("C{canonical}"),
            contingency: None,
            sp_day_ahead,
            simulated: simulated
                .iter()
                .map(|(name, value)| ((*name).to_owned(), *value))
                .collect::<IndexMap<_, _>>(),
        }
    }

    #[test]
    fn rows_order_by_absolute_day_ahead_price() {
        let table = PostMortemTable::from_rows(vec![
            row(3, 1_200, &[("ERCOT_1DA_Default", Some(900))]),
            row(1, -45_000, &[("ERCOT_1MA_Default", None)]),
            row(2, 1_200, &[]),
            row(4, 30_000, &[("ERCOT_1DA_Default", Some(12_000))]),
        ]);
        let order: Vec<i64> = table.rows.iter().map(|row| row.canonical.raw()).collect();
        assert_eq!(order, vec![1, 4, 2, 3]);
        assert_eq!(table.scenarios, vec!["ERCOT_1MA_Default", "ERCOT_1DA_Default"]);
        assert_eq!(table.rows[0].sp_day_ahead_display(), "-$45,000");
    }

    #[test]
    fn constraints_without_simulated_binding_are_missed() {
        let table = PostMortemTable::from_rows(vec![
            row(1, 500, &[("ERCOT_1DA_Default", Some(0)), ("ERCOT_1MA_Default", None)]),
            row(2, 400, &[("ERCOT_1DA_Default", Some(75))]),
            row(3, 300, &[]),
        ]);
        let missed: Vec<i64> = table
            .missed_by_simulation()
            .map(|row| row.canonical.raw())
            .collect();
        assert_eq!(missed, vec![1, 3]);
        let found = table.get(CanonicalConstraintId::new(2)).expect("row");
        assert_eq!(found.simulated("ERCOT_1DA_Default"), Some(75));
        assert_eq!(found.simulated("ERCOT_1YA_S1"), None);
    }
}
