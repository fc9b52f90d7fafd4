#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use postmortem_rs::api::{LayerBuilder, SeriesBundle};
use postmortem_rs::core::{
    CanonicalConstraintId, CategoryRow, FlowRow, LayerList, LoadRow, OutageRow, PackageVersionId,
    RawConstraintId, ScenarioId, ScenarioName, ShadowPriceHistoryRow, TOTAL_LOAD_ZONE,
    TimeSeriesTable, WindRow,
};
use postmortem_rs::query::columns;
use postmortem_rs::warehouse::{Cell, ResultSet};

pub const POOL: i64 = 5;
pub const MAIN_CONSTRAINT: i64 = 50011660;
pub const OTHER_CONSTRAINT: i64 = 777;
pub const FIRST_PRIORITY: &str = "ERCOT_1DA_Default";
pub const SECOND_SCENARIO: &str = "ERCOT_1MA_Default";

pub fn scenario(name: &str) -> ScenarioName {
    ScenarioName::parse(name)
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).expect("valid day")
}

pub fn hour_ending(d: u32, hour: u32) -> NaiveDateTime {
    day(d).and_hms_opt(hour, 0, 0).expect("valid hour")
}

pub fn main_constraint() -> CanonicalConstraintId {
    CanonicalConstraintId::new(MAIN_CONSTRAINT)
}

pub fn flow_row(name: &str, at: NaiveDateTime, raw: i64, flow: f64) -> FlowRow {
    FlowRow {
        scenario: scenario(name),
        hour_ending: at,
        canonical: main_constraint(),
        raw: RawConstraintId::new(raw),
        package_version: PackageVersionId::new(40),
        flow: Some(flow),
        sp_simulated: Some(12.5),
        sp_day_ahead: 8.0,
        sp_real_time: 3.0,
        min_limit: Some(-450.0),
        max_limit: Some(450.0),
        simulation_date: Some(day(1)),
        from_bus: Some("BUS_A".to_owned()),
        to_bus: Some("BUS_B".to_owned()),
    }
}

pub fn category_row(name: &str, id: i64, at: NaiveDateTime, impacts: [f64; 8]) -> CategoryRow {
    CategoryRow {
        scenario: scenario(name),
        scenario_id: ScenarioId::new(id),
        hour_ending: at,
        canonical: main_constraint(),
        raw: RawConstraintId::new(799),
        package_version: PackageVersionId::new(40),
        impacts: impacts.map(Some),
        from_bus: None,
        to_bus: None,
    }
}

pub fn outage_row(name: &str, d: u32, equipment: &str, flow: f64) -> OutageRow {
    OutageRow {
        scenario: scenario(name),
        date: day(d),
        canonical: main_constraint(),
        raw: RawConstraintId::new(799),
        equipment: equipment.to_owned(),
        outage_id: Some(9001),
        ilodf: Some(0.3),
        avg_redirected_flow: flow,
        start_date: Some(day(1)),
        end_date: Some(day(20)),
        status: Some("Approved".to_owned()),
    }
}

pub fn history_row(canonical: i64, peak: i64, values: &[(&str, f64)]) -> ShadowPriceHistoryRow {
    ShadowPriceHistoryRow {
        month: day(1),
        canonical: CanonicalConstraintId::new(canonical),
        raw: RawConstraintId::new(canonical + 1),
        name: format!("LINE {canonical}"),
        contingency: Some("BASE".to_owned()),
        peak_id: peak,
        values: values
            .iter()
            .map(|(column, value)| ((*column).to_owned(), Some(*value)))
            .collect::<IndexMap<_, _>>(),
    }
}

/// Two flow scenarios, two breakdown scenarios with outages, and a history
/// table spanning the main constraint and one sibling constraint.
pub fn sample_series() -> SeriesBundle {
    let impacts = [10.0, -20.0, 30.0, -5.0, 0.0, 7.0, -1.0, 2.0];
    SeriesBundle {
        flows: TimeSeriesTable::from_records(vec![
            flow_row(FIRST_PRIORITY, hour_ending(1, 1), 799, 310.4),
            flow_row(FIRST_PRIORITY, hour_ending(1, 2), 799, 298.6),
            flow_row(SECOND_SCENARIO, hour_ending(1, 1), 799, 120.0),
            flow_row(SECOND_SCENARIO, hour_ending(1, 2), 799, 140.0),
        ]),
        categories: TimeSeriesTable::from_records(vec![
            category_row(FIRST_PRIORITY, 12, hour_ending(1, 1), impacts),
            category_row(SECOND_SCENARIO, 11, hour_ending(1, 1), impacts),
        ]),
        outages: TimeSeriesTable::from_records(vec![
            outage_row(FIRST_PRIORITY, 1, "LINE_A", 120.4),
            outage_row(FIRST_PRIORITY, 2, "LINE_A", 30.0),
            outage_row(FIRST_PRIORITY, 1, "LINE_B", -45.6),
            outage_row(FIRST_PRIORITY, 1, "LINE_C", 0.5),
            outage_row(SECOND_SCENARIO, 1, "LINE_A", 10.0),
        ]),
        history: TimeSeriesTable::from_records(vec![
            history_row(OTHER_CONSTRAINT, 1, &[("SP_DA", -4.0)]),
            history_row(
                MAIN_CONSTRAINT,
                1,
                &[("SP_DA", -250.0), ("SP_RT", 80.0), ("SC_1MA", 12.0)],
            ),
        ]),
        ..SeriesBundle::default()
    }
}

pub fn load_row(name: &str, zone: &str, at: NaiveDateTime, demand: f64) -> LoadRow {
    LoadRow {
        scenario: scenario(name),
        zone: zone.to_owned(),
        hour_ending: at,
        demand_mw: Some(demand),
    }
}

pub fn wind_row(name: &str, at: NaiveDateTime, generation: f64) -> WindRow {
    WindRow {
        scenario: scenario(name),
        hour_ending: at,
        generation_mw: Some(generation),
    }
}

/// `sample_series()` plus demand in the `TOTAL` and `WEST` zones of both
/// flow scenarios (`WEST` only for the second) and wind of both.
pub fn grid_series() -> SeriesBundle {
    SeriesBundle {
        load: TimeSeriesTable::from_rows(vec![
            load_row(SECOND_SCENARIO, TOTAL_LOAD_ZONE, hour_ending(1, 1), 40_100.0),
            load_row(SECOND_SCENARIO, "WEST", hour_ending(1, 1), 9_700.0),
            load_row(FIRST_PRIORITY, TOTAL_LOAD_ZONE, hour_ending(1, 2), 41_900.0),
            load_row(FIRST_PRIORITY, TOTAL_LOAD_ZONE, hour_ending(1, 1), 41_300.0),
        ]),
        wind: TimeSeriesTable::from_rows(vec![
            wind_row(FIRST_PRIORITY, hour_ending(1, 1), 8_450.4),
            wind_row(SECOND_SCENARIO, hour_ending(1, 1), 7_980.0),
        ]),
        ..sample_series()
    }
}

pub fn sample_builder() -> LayerBuilder {
    LayerBuilder::new(scenario(FIRST_PRIORITY), main_constraint())
}

/// Layer list of `sample_series()`: 10 flow, 34 category, 5 outage and 6
/// history layers.
pub fn sample_layers() -> LayerList {
    sample_builder().build(
        &sample_series(),
        &[scenario(FIRST_PRIORITY), scenario(SECOND_SCENARIO)],
    )
}

pub fn identity_result(records: &[(i64, i64, i64)]) -> ResultSet {
    records.iter().fold(
        ResultSet::new([columns::CANONICAL_ID, columns::RAW_ID, columns::PACKAGE_VERSION_ID]),
        |result, (canonical, raw, package)| {
            result.with_row(vec![
                Cell::Int(*canonical),
                Cell::Int(*raw),
                Cell::Int(*package),
            ])
        },
    )
}

pub fn scenario_ids_result(refs: &[(&str, i64)]) -> ResultSet {
    refs.iter().fold(
        ResultSet::new([columns::SCENARIO_NAME, columns::SCENARIO_ID]),
        |result, (name, id)| result.with_row(vec![Cell::from(*name), Cell::Int(*id)]),
    )
}

/// Flow rows `(scenario, hour ending, raw id, flow, max limit)`.
pub fn flows_result(rows: &[(&str, NaiveDateTime, i64, f64, f64)]) -> ResultSet {
    rows.iter().fold(
        ResultSet::new([
            columns::SCENARIO_NAME,
            columns::HOUR_ENDING,
            columns::CANONICAL_ID,
            columns::RAW_ID,
            columns::PACKAGE_VERSION_ID,
            columns::FLOWS,
            columns::SP_SIMULATED,
            columns::SP_DAY_AHEAD,
            columns::SP_REAL_TIME,
            columns::MIN_LIMIT,
            columns::MAX_LIMIT,
            columns::SIMULATION_DATE,
            columns::FROM_BUS,
            columns::TO_BUS,
        ]),
        |result, (name, at, raw, flow, max_limit)| {
            result.with_row(vec![
                Cell::from(*name),
                Cell::Timestamp(*at),
                Cell::Int(MAIN_CONSTRAINT),
                Cell::Int(*raw),
                Cell::Int(40),
                Cell::Float(*flow),
                Cell::Float(-15.0),
                Cell::Null,
                Cell::Float(-2.5),
                Cell::Float(-450.0),
                Cell::Float(*max_limit),
                Cell::Date(day(1)),
                Cell::from("BUS_A"),
                Cell::from("BUS_B"),
            ])
        },
    )
}

/// Category rows `(scenario, scenario id, hour ending, hydro impact)`.
pub fn categories_result(rows: &[(&str, i64, NaiveDateTime, f64)]) -> ResultSet {
    let mut header = vec![
        columns::SCENARIO_NAME,
        columns::SCENARIO_ID,
        columns::HOUR_ENDING,
        columns::CANONICAL_ID,
        columns::RAW_ID,
        columns::PACKAGE_VERSION_ID,
    ];
    header.extend(
        postmortem_rs::core::Category::ORDERED.map(postmortem_rs::core::Category::label),
    );
    header.extend([columns::FROM_BUS, columns::TO_BUS]);
    rows.iter().fold(ResultSet::new(header), |result, (name, id, at, hydro)| {
        let mut cells = vec![
            Cell::from(*name),
            Cell::Int(*id),
            Cell::Timestamp(*at),
            Cell::Int(MAIN_CONSTRAINT),
            Cell::Int(799),
            Cell::Int(40),
            Cell::Float(*hydro),
        ];
        cells.extend(std::iter::repeat_n(Cell::Float(1.0), 7));
        cells.extend([Cell::Null, Cell::Null]);
        result.with_row(cells)
    })
}

/// Outage rows `(scenario, day, raw id, equipment, redirected flow)`.
pub fn outages_result(rows: &[(&str, u32, i64, &str, f64)]) -> ResultSet {
    rows.iter().fold(
        ResultSet::new([
            columns::SCENARIO_NAME,
            columns::DATE,
            columns::CANONICAL_ID,
            columns::RAW_ID,
            columns::EQUIPMENT_KEY,
            columns::OUTAGE_ID,
            columns::ILODF,
            columns::AVG_REDIRECTED_FLOW,
            columns::START_DATE,
            columns::END_DATE,
            columns::STATUS,
        ]),
        |result, (name, d, raw, equipment, flow)| {
            result.with_row(vec![
                Cell::from(*name),
                Cell::Date(day(*d)),
                Cell::Int(MAIN_CONSTRAINT),
                Cell::Int(*raw),
                Cell::from(*equipment),
                Cell::Int(9001),
                Cell::Float(0.3),
                Cell::Float(*flow),
                Cell::Date(day(1)),
                Cell::Date(day(20)),
                Cell::from("Approved"),
            ])
        },
    )
}

/// History rows `(canonical, raw, peak, SP_DA, SP_RT)` of March 2025.
pub fn history_result(rows: &[(i64, i64, i64, f64, Option<f64>)]) -> ResultSet {
    rows.iter().fold(
        ResultSet::new([
            columns::MONTH,
            columns::CANONICAL_ID,
            columns::RAW_ID,
            columns::NAME,
            columns::CONTINGENCY,
            columns::PEAK_ID,
            "'SP_DA'",
            "'SP_RT'",
        ]),
        |result, (canonical, raw, peak, day_ahead, real_time)| {
            result.with_row(vec![
                Cell::Date(day(1)),
                Cell::Int(*canonical),
                Cell::Int(*raw),
                Cell::from("LINE"),
                Cell::from("BASE"),
                Cell::Int(*peak),
                Cell::Float(*day_ahead),
                Cell::from(*real_time),
            ])
        },
    )
}

pub fn binding_summary_result(rows: &[(&str, f64, i64)]) -> ResultSet {
    rows.iter().fold(
        ResultSet::new([
            columns::SOURCE,
            columns::SHADOW_PRICE,
            columns::BINDING_HOURS,
            columns::SP_PER_HOUR,
            columns::MIN_LIMIT,
            columns::MAX_LIMIT,
        ]),
        |result, (source, total, hours)| {
            result.with_row(vec![
                Cell::from(*source),
                Cell::Float(*total),
                Cell::Int(*hours),
                Cell::Float(if *hours == 0 { 0.0 } else { total / *hours as f64 }),
                Cell::Float(-450.0),
                Cell::Float(450.0),
            ])
        },
    )
}

/// Load rows `(scenario, zone, hour ending, demand)`.
pub fn load_result(rows: &[(&str, &str, NaiveDateTime, f64)]) -> ResultSet {
    rows.iter().fold(
        ResultSet::new([
            columns::SCENARIO_NAME,
            columns::ZONE_NAME,
            columns::HOUR_ENDING,
            columns::DEMAND_MW,
        ]),
        |result, (name, zone, at, demand)| {
            result.with_row(vec![
                Cell::from(*name),
                Cell::from(*zone),
                Cell::Timestamp(*at),
                Cell::Float(*demand),
            ])
        },
    )
}

pub fn wind_result(rows: &[(&str, NaiveDateTime, f64)]) -> ResultSet {
    rows.iter().fold(
        ResultSet::new([
            columns::SCENARIO_NAME,
            columns::HOUR_ENDING,
            columns::WIND_GENERATION,
        ]),
        |result, (name, at, generation)| {
            result.with_row(vec![
                Cell::from(*name),
                Cell::Timestamp(*at),
                Cell::Float(*generation),
            ])
        },
    )
}

/// Post-mortem rows `(canonical, SP_DA, first priority SP, second SP)`.
pub fn post_mortem_result(rows: &[(i64, i64, Option<i64>, Option<i64>)]) -> ResultSet {
    let first = format!("'{FIRST_PRIORITY}'");
    let second = format!("'{SECOND_SCENARIO}'");
    rows.iter().fold(
        ResultSet::new([
            columns::MARKET_CANONICAL_ID,
            columns::MARKET_RAW_ID,
            columns::CONSTRAINT_NAME,
            columns::CONTINGENCY_NAME,
            columns::SP_DAY_AHEAD,
            first.as_str(),
            second.as_str(),
        ]),
        |result, (canonical, day_ahead, first_sp, second_sp)| {
            result.with_row(vec![
                Cell::Int(*canonical),
                Cell::Int(canonical + 1),
                Cell::from("LINE"),
                Cell::from("BASE"),
                Cell::Int(*day_ahead),
                first_sp.map_or(Cell::Null, Cell::Int),
                second_sp.map_or(Cell::Null, Cell::Int),
            ])
        },
    )
}
