use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::dedup::{DedupRecord, DedupStats, select_min_raw_id};
use super::{
    CanonicalConstraintId, Category, PackageVersionId, RawConstraintId, ScenarioId, ScenarioName,
};

pub const DEFAULT_FLOW_LIMIT_SENTINEL: f64 = 8000.0;
pub const DEFAULT_RAW_LIMIT_SENTINEL: f64 = 9999.0;

/// Load zone summing every non-industrial zone of a scenario.
pub const TOTAL_LOAD_ZONE: &str = "TOTAL";

/// Magnitudes above which limit values are source sentinels, not limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitSentinels {
    /// Applied to raw simulation limits before market prices are joined.
    pub raw_limit: f64,
    /// Applied to the final flow limits.
    pub flow_limit: f64,
}

impl Default for LimitSentinels {
    fn default() -> Self {
        Self {
            raw_limit: DEFAULT_RAW_LIMIT_SENTINEL,
            flow_limit: DEFAULT_FLOW_LIMIT_SENTINEL,
        }
    }
}

/// Maps sentinel or non-finite limits to missing. Values are never clamped.
#[must_use]
pub fn sanitize_limit(value: Option<f64>, threshold: f64) -> Option<f64> {
    value.filter(|limit| limit.is_finite() && limit.abs() <= threshold)
}

/// Row shape of a time-indexed table. Every row carries its join key.
pub trait SeriesRow {
    /// Scenario half of the join key; pivoted tables carry none.
    fn scenario(&self) -> Option<&ScenarioName>;
    fn timestamp(&self) -> NaiveDateTime;
}

/// Deduplicated rows of one retrieval, ordered deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesTable<R> {
    rows: Vec<R>,
    dedup: DedupStats,
}

impl<R> Default for TimeSeriesTable<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            dedup: DedupStats::default(),
        }
    }
}

impl<R: SeriesRow> TimeSeriesTable<R> {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rows not keyed by a constraint, ordered by scenario then time. The
    /// sort is stable, so rows sharing both keep their fetched order.
    #[must_use]
    pub fn from_rows(mut rows: Vec<R>) -> Self {
        rows.sort_by(|a, b| {
            a.scenario()
                .cmp(&b.scenario())
                .then_with(|| a.timestamp().cmp(&b.timestamp()))
        });
        let count = rows.len();
        Self {
            rows,
            dedup: DedupStats {
                input: count,
                groups: count,
                kept: count,
            },
        }
    }

    /// Applies the minimum-raw-id rule at the row type's own granularity.
    #[must_use]
    pub fn from_records(records: Vec<R>) -> Self
    where
        R: DedupRecord,
    {
        let (rows, dedup) = select_min_raw_id(records);
        Self { rows, dedup }
    }

    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    #[must_use]
    pub fn dedup_stats(&self) -> DedupStats {
        self.dedup
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct scenarios present, sorted.
    #[must_use]
    pub fn scenarios(&self) -> Vec<ScenarioName> {
        let mut scenarios: Vec<ScenarioName> = self
            .rows
            .iter()
            .filter_map(|row| row.scenario().cloned())
            .collect();
        scenarios.sort();
        scenarios.dedup();
        scenarios
    }

    /// Rows of one scenario in table order. Yielded rows borrow the table
    /// only, so the name may be a temporary.
    pub fn for_scenario<'a, 's>(
        &'a self,
        scenario: &'s ScenarioName,
    ) -> impl Iterator<Item = &'a R> + use<'a, 's, R> {
        self.rows
            .iter()
            .filter(move |row| row.scenario() == Some(scenario))
    }
}

/// Hourly simulated flow with its shadow prices and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRow {
    pub scenario: ScenarioName,
    pub hour_ending: NaiveDateTime,
    pub canonical: CanonicalConstraintId,
    pub raw: RawConstraintId,
    pub package_version: PackageVersionId,
    pub flow: Option<f64>,
    /// Simulated shadow price, absolute.
    pub sp_simulated: Option<f64>,
    /// Day-ahead market shadow price, absolute, missing read as 0.
    pub sp_day_ahead: f64,
    /// Real-time market shadow price, absolute, missing read as 0.
    pub sp_real_time: f64,
    pub min_limit: Option<f64>,
    pub max_limit: Option<f64>,
    pub simulation_date: Option<NaiveDate>,
    pub from_bus: Option<String>,
    pub to_bus: Option<String>,
}

impl SeriesRow for FlowRow {
    fn scenario(&self) -> Option<&ScenarioName> {
        Some(&self.scenario)
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.hour_ending
    }
}

impl DedupRecord for FlowRow {
    type GroupKey = (ScenarioName, NaiveDateTime, CanonicalConstraintId);
    type OrderKey = (ScenarioName, NaiveDateTime, CanonicalConstraintId, RawConstraintId);

    fn group_key(&self) -> Self::GroupKey {
        (self.scenario.clone(), self.hour_ending, self.canonical)
    }

    fn raw_id(&self) -> RawConstraintId {
        self.raw
    }

    fn order_key(&self) -> Self::OrderKey {
        (self.scenario.clone(), self.hour_ending, self.canonical, self.raw)
    }
}

/// Hourly decomposition of the flow into generation categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub scenario: ScenarioName,
    pub scenario_id: ScenarioId,
    pub hour_ending: NaiveDateTime,
    pub canonical: CanonicalConstraintId,
    pub raw: RawConstraintId,
    pub package_version: PackageVersionId,
    /// Indexed by `Category::index`.
    pub impacts: [Option<f64>; 8],
    pub from_bus: Option<String>,
    pub to_bus: Option<String>,
}

impl CategoryRow {
    #[must_use]
    pub fn impact(&self, category: Category) -> Option<f64> {
        self.impacts[category.index()]
    }
}

impl SeriesRow for CategoryRow {
    fn scenario(&self) -> Option<&ScenarioName> {
        Some(&self.scenario)
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.hour_ending
    }
}

impl DedupRecord for CategoryRow {
    type GroupKey = (ScenarioId, NaiveDateTime, CanonicalConstraintId);
    type OrderKey = (ScenarioName, NaiveDateTime, CanonicalConstraintId, RawConstraintId);

    fn group_key(&self) -> Self::GroupKey {
        (self.scenario_id, self.hour_ending, self.canonical)
    }

    fn raw_id(&self) -> RawConstraintId {
        self.raw
    }

    fn order_key(&self) -> Self::OrderKey {
        (self.scenario.clone(), self.hour_ending, self.canonical, self.raw)
    }
}

/// Daily average flow redirected onto the constraint by one outage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutageRow {
    pub scenario: ScenarioName,
    pub date: NaiveDate,
    pub canonical: CanonicalConstraintId,
    pub raw: RawConstraintId,
    pub equipment: String,
    pub outage_id: Option<i64>,
    pub ilodf: Option<f64>,
    pub avg_redirected_flow: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
}

impl SeriesRow for OutageRow {
    fn scenario(&self) -> Option<&ScenarioName> {
        Some(&self.scenario)
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }
}

impl DedupRecord for OutageRow {
    type GroupKey = (ScenarioName, NaiveDate, CanonicalConstraintId);
    type OrderKey = (
        ScenarioName,
        NaiveDate,
        CanonicalConstraintId,
        RawConstraintId,
        String,
        Option<i64>,
    );

    fn group_key(&self) -> Self::GroupKey {
        (self.scenario.clone(), self.date, self.canonical)
    }

    fn raw_id(&self) -> RawConstraintId {
        self.raw
    }

    fn order_key(&self) -> Self::OrderKey {
        (
            self.scenario.clone(),
            self.date,
            self.canonical,
            self.raw,
            self.equipment.clone(),
            self.outage_id,
        )
    }
}

/// Monthly shadow price of one constraint on the monitored line, pivoted by
/// source column (market prices, shadow costs, simulated scenarios).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowPriceHistoryRow {
    pub month: NaiveDate,
    pub canonical: CanonicalConstraintId,
    pub raw: RawConstraintId,
    pub name: String,
    pub contingency: Option<String>,
    pub peak_id: i64,
    pub values: IndexMap<String, Option<f64>>,
}

impl ShadowPriceHistoryRow {
    /// Value of `column` as charted: missing reads as 0, sign dropped.
    #[must_use]
    pub fn value(&self, column: &str) -> f64 {
        self.values
            .get(column)
            .copied()
            .flatten()
            .filter(|value| value.is_finite())
            .map_or(0.0, f64::abs)
    }
}

impl SeriesRow for ShadowPriceHistoryRow {
    fn scenario(&self) -> Option<&ScenarioName> {
        None
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.month.and_time(NaiveTime::MIN)
    }
}

impl DedupRecord for ShadowPriceHistoryRow {
    type GroupKey = (NaiveDate, CanonicalConstraintId, i64);
    type OrderKey = (NaiveDate, CanonicalConstraintId, i64, RawConstraintId, String);

    fn group_key(&self) -> Self::GroupKey {
        (self.month, self.canonical, self.peak_id)
    }

    fn raw_id(&self) -> RawConstraintId {
        self.raw
    }

    fn order_key(&self) -> Self::OrderKey {
        (
            self.month,
            self.canonical,
            self.peak_id,
            self.raw,
            self.name.clone(),
        )
    }
}

impl TimeSeriesTable<ShadowPriceHistoryRow> {
    /// Value columns in first-seen order across rows.
    #[must_use]
    pub fn value_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.rows {
            for column in row.values.keys() {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        columns
    }
}

/// Hourly demand of one load zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRow {
    pub scenario: ScenarioName,
    pub zone: String,
    pub hour_ending: NaiveDateTime,
    pub demand_mw: Option<f64>,
}

impl SeriesRow for LoadRow {
    fn scenario(&self) -> Option<&ScenarioName> {
        Some(&self.scenario)
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.hour_ending
    }
}

impl TimeSeriesTable<LoadRow> {
    /// Distinct zones present, sorted.
    #[must_use]
    pub fn zones(&self) -> Vec<String> {
        let mut zones: Vec<String> = self.rows.iter().map(|row| row.zone.clone()).collect();
        zones.sort();
        zones.dedup();
        zones
    }
}

/// Hourly wind generation summed over every wind unit of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindRow {
    pub scenario: ScenarioName,
    pub hour_ending: NaiveDateTime,
    pub generation_mw: Option<f64>,
}

impl SeriesRow for WindRow {
    fn scenario(&self) -> Option<&ScenarioName> {
        Some(&self.scenario)
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.hour_ending
    }
}

/// Binding hours and shadow price totals of one source over an FTR window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSummaryRow {
    pub source: String,
    pub total_shadow_price: Decimal,
    pub binding_hours: i64,
    pub shadow_price_per_hour: Decimal,
    pub min_limit: Option<f64>,
    pub max_limit: Option<f64>,
}

impl BindingSummaryRow {
    #[must_use]
    pub fn total_display(&self) -> String {
        format_currency(self.total_shadow_price)
    }

    #[must_use]
    pub fn per_hour_display(&self) -> String {
        format_currency(self.shadow_price_per_hour)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingSummary {
    pub rows: Vec<BindingSummaryRow>,
}

impl BindingSummary {
    #[must_use]
    pub fn get(&self, source: &str) -> Option<&BindingSummaryRow> {
        self.rows.iter().find(|row| row.source == source)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Whole-dollar amount with thousands separators, e.g. `$12,345`.
#[must_use]
pub fn format_currency(amount: Decimal) -> String {
    let whole = amount.round().abs().to_string();
    let digits = whole.split('.').next().unwrap_or("0");
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount.round().is_sign_negative() && !amount.round().is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}")
}
