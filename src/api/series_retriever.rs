use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{
    BindingSummary, CategoryRow, DateWindow, DedupRecord, FlowRow, LimitSentinels, LoadRow,
    OutageRow, PostMortemTable, ResolvedIdentity, ResolvedScenarios, ScenarioName, SeriesRow,
    ShadowPriceHistoryRow, TimeSeriesTable, WindRow,
};
use crate::error::PostMortemResult;
use crate::query::{
    self, binding_summary_script, categories_script, decode_binding_summary_row,
    decode_category_row, decode_flow_row, decode_history_row, decode_load_row,
    decode_outage_row, decode_post_mortem_row, decode_wind_row, flows_script, history_script,
    load_script, outages_script, post_mortem_script, wind_script,
};
use crate::warehouse::{QuerySession, Warehouse};

/// Every table a dashboard is drawn from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesBundle {
    pub flows: TimeSeriesTable<FlowRow>,
    pub categories: TimeSeriesTable<CategoryRow>,
    pub outages: TimeSeriesTable<OutageRow>,
    pub history: TimeSeriesTable<ShadowPriceHistoryRow>,
    /// Grid context, empty unless requested.
    #[serde(default)]
    pub load: TimeSeriesTable<LoadRow>,
    #[serde(default)]
    pub wind: TimeSeriesTable<WindRow>,
}

/// Fetches the time series of one resolved constraint.
///
/// Each operation re-applies the minimum-raw-id rule at its own granularity:
/// hourly for flows and categories, daily for outages, monthly for the
/// shadow-price history.
#[derive(Debug, Clone, Copy)]
pub struct SeriesRetriever<'a> {
    identity: &'a ResolvedIdentity,
    sentinels: LimitSentinels,
}

impl<'a> SeriesRetriever<'a> {
    #[must_use]
    pub fn new(identity: &'a ResolvedIdentity, sentinels: LimitSentinels) -> Self {
        Self {
            identity,
            sentinels,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &ResolvedIdentity {
        self.identity
    }

    pub fn flows<W: Warehouse + ?Sized>(
        &self,
        session: &mut QuerySession<'_, W>,
        scenarios: &ResolvedScenarios,
        window: DateWindow,
    ) -> PostMortemResult<TimeSeriesTable<FlowRow>> {
        if self.skips(query::FLOWS, scenarios) {
            return Ok(TimeSeriesTable::empty());
        }
        let sentinels = self.sentinels;
        let rows = session.fetch(
            flows_script(self.identity, &scenarios.ids(), window, sentinels),
            |row| decode_flow_row(row, sentinels),
        )?;
        Ok(finish(query::FLOWS, rows))
    }

    pub fn categories<W: Warehouse + ?Sized>(
        &self,
        session: &mut QuerySession<'_, W>,
        scenarios: &ResolvedScenarios,
        window: DateWindow,
    ) -> PostMortemResult<TimeSeriesTable<CategoryRow>> {
        if self.skips(query::CATEGORIES, scenarios) {
            return Ok(TimeSeriesTable::empty());
        }
        let rows = session.fetch(
            categories_script(self.identity, &scenarios.ids(), window),
            decode_category_row,
        )?;
        Ok(finish(query::CATEGORIES, rows))
    }

    pub fn outages<W: Warehouse + ?Sized>(
        &self,
        session: &mut QuerySession<'_, W>,
        scenarios: &ResolvedScenarios,
        window: DateWindow,
    ) -> PostMortemResult<TimeSeriesTable<OutageRow>> {
        if self.skips(query::OUTAGES, scenarios) {
            return Ok(TimeSeriesTable::empty());
        }
        let rows = session.fetch(
            outages_script(self.identity, &scenarios.ids(), window),
            decode_outage_row,
        )?;
        Ok(finish(query::OUTAGES, rows))
    }

    /// Monthly shadow price of every constraint on the monitored line.
    ///
    /// Market prices and shadow costs do not depend on scenarios, so this
    /// runs even when no simulated scenario resolved. `None` covers the full
    /// history.
    pub fn shadow_price_history<W: Warehouse + ?Sized>(
        &self,
        session: &mut QuerySession<'_, W>,
        scenarios: &ResolvedScenarios,
        window: Option<DateWindow>,
    ) -> PostMortemResult<TimeSeriesTable<ShadowPriceHistoryRow>> {
        let rows = session.fetch(
            history_script(
                self.identity.pool,
                self.identity.constraint,
                &scenarios.ids(),
                window,
            ),
            decode_history_row,
        )?;
        Ok(finish(query::SHADOW_PRICE_HISTORY, rows))
    }

    /// Binding hours and shadow price totals over one FTR window.
    pub fn binding_summary<W: Warehouse + ?Sized>(
        &self,
        session: &mut QuerySession<'_, W>,
        window: DateWindow,
    ) -> PostMortemResult<BindingSummary> {
        let rows = session.fetch(
            binding_summary_script(self.identity.pool, self.identity.constraint, window),
            decode_binding_summary_row,
        )?;
        info!(sources = rows.len(), "binding summary retrieved");
        Ok(BindingSummary { rows })
    }

    /// Pool-wide day-ahead against simulated shadow prices. Independent of
    /// the resolved constraint; without scenarios only market prices come
    /// back.
    pub fn post_mortem_table<W: Warehouse + ?Sized>(
        &self,
        session: &mut QuerySession<'_, W>,
        scenarios: &[ScenarioName],
        window: DateWindow,
    ) -> PostMortemResult<PostMortemTable> {
        let rows = session.fetch(
            post_mortem_script(self.identity.pool, scenarios, window),
            decode_post_mortem_row,
        )?;
        let table = PostMortemTable::from_rows(rows);
        info!(
            constraints = table.len(),
            scenarios = table.scenarios.len(),
            missed = table.missed_by_simulation().count(),
            "post-mortem table retrieved"
        );
        Ok(table)
    }

    /// Hourly demand per load zone of the resolved scenarios.
    pub fn load<W: Warehouse + ?Sized>(
        &self,
        session: &mut QuerySession<'_, W>,
        scenarios: &ResolvedScenarios,
        window: DateWindow,
    ) -> PostMortemResult<TimeSeriesTable<LoadRow>> {
        if skips_grid(query::LOAD, scenarios) {
            return Ok(TimeSeriesTable::empty());
        }
        let rows = session.fetch(load_script(&scenarios.names(), window), decode_load_row)?;
        Ok(finish_unkeyed(query::LOAD, rows))
    }

    /// Hourly wind generation of the resolved scenarios.
    pub fn wind<W: Warehouse + ?Sized>(
        &self,
        session: &mut QuerySession<'_, W>,
        scenarios: &ResolvedScenarios,
        window: DateWindow,
    ) -> PostMortemResult<TimeSeriesTable<WindRow>> {
        if skips_grid(query::WIND, scenarios) {
            return Ok(TimeSeriesTable::empty());
        }
        let rows = session.fetch(wind_script(&scenarios.names(), window), decode_wind_row)?;
        Ok(finish_unkeyed(query::WIND, rows))
    }

    fn skips(&self, table: &str, scenarios: &ResolvedScenarios) -> bool {
        let skip = self.identity.is_empty() || scenarios.is_empty();
        if skip {
            debug!(
                table,
                identity_empty = self.identity.is_empty(),
                scenarios_empty = scenarios.is_empty(),
                "nothing to retrieve"
            );
        }
        skip
    }
}

fn finish<R: SeriesRow + DedupRecord>(table: &str, rows: Vec<R>) -> TimeSeriesTable<R> {
    let table_rows = TimeSeriesTable::from_records(rows);
    let stats = table_rows.dedup_stats();
    info!(
        table,
        fetched = stats.input,
        groups = stats.groups,
        kept = stats.kept,
        "series retrieved"
    );
    table_rows
}

/// Grid series do not depend on the constraint, only on scenarios.
fn skips_grid(table: &str, scenarios: &ResolvedScenarios) -> bool {
    let skip = scenarios.is_empty();
    if skip {
        debug!(table, "no resolved scenario, nothing to retrieve");
    }
    skip
}

fn finish_unkeyed<R: SeriesRow>(table: &str, rows: Vec<R>) -> TimeSeriesTable<R> {
    let table_rows = TimeSeriesTable::from_rows(rows);
    info!(
        table,
        fetched = table_rows.len(),
        scenarios = table_rows.scenarios().len(),
        "series retrieved"
    );
    table_rows
}
