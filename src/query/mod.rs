//! Warehouse script text and the column contract of each result.
//!
//! Every builder returns a `QueryScript` whose last statement produces the
//! columns its decoder reads. Each constraint-keyed script reconciles raw
//! constraint records with its own `MIN` raw id CTE at its native
//! granularity; decoded rows go through the same rule again in-process. Load
//! and wind are keyed by scenario and hour only.

mod grid;
mod history;
mod hourly;
mod identity;
mod outages;
mod post_mortem;

pub use grid::{decode_load_row, decode_wind_row, load_script, wind_script};
pub use history::{
    binding_summary_script, decode_binding_summary_row, decode_history_row, history_script,
};
pub use hourly::{categories_script, decode_category_row, decode_flow_row, flows_script};
pub use identity::{
    decode_identity_record, decode_scenario_ref, identity_mapping_script, scenario_ids_script,
};
pub use outages::{decode_outage_row, outages_script};
pub use post_mortem::{decode_post_mortem_row, post_mortem_script};

use chrono::NaiveDate;

use crate::core::{PoolId, id_list};
use crate::warehouse::quote_literal;

pub const IDENTITY_MAPPING: &str = "identity_mapping";
pub const SCENARIO_IDS: &str = "scenario_ids";
pub const FLOWS: &str = "flows";
pub const CATEGORIES: &str = "categories";
pub const OUTAGES: &str = "outages";
pub const SHADOW_PRICE_HISTORY: &str = "shadow_price_history";
pub const BINDING_SUMMARY: &str = "binding_summary";
pub const POST_MORTEM: &str = "post_mortem";
pub const LOAD: &str = "load";
pub const WIND: &str = "wind";

/// Result column names shared by scripts and decoders.
pub mod columns {
    pub const CANONICAL_ID: &str = "MAG_CID";
    pub const RAW_ID: &str = "CES_CID";
    pub const PACKAGE_VERSION_ID: &str = "MAG_REF_PACKAGEVERSION__ID";
    pub const SCENARIO_NAME: &str = "SCENARIONAME";
    pub const SCENARIO_ID: &str = "MAG_REF_SCENARIO_INFO__ID";
    pub const HOUR_ENDING: &str = "HEDATE";
    pub const FLOWS: &str = "FLOWS";
    pub const SP_SIMULATED: &str = "SP_DZR";
    pub const SP_DAY_AHEAD: &str = "SP_DA";
    pub const SP_REAL_TIME: &str = "SP_RT";
    pub const MIN_LIMIT: &str = "MINLIMIT";
    pub const MAX_LIMIT: &str = "MAXLIMIT";
    pub const SIMULATION_DATE: &str = "SIMULATIONDATE";
    pub const FROM_BUS: &str = "FROMBUSNAME";
    pub const TO_BUS: &str = "TOBUSNAME";
    pub const DATE: &str = "DATE";
    pub const EQUIPMENT_KEY: &str = "EQKEY";
    pub const OUTAGE_ID: &str = "OUTAGEID";
    pub const ILODF: &str = "ILODF";
    pub const AVG_REDIRECTED_FLOW: &str = "AVG_REDIRECTED_FLOW";
    pub const START_DATE: &str = "STARTDATE";
    pub const END_DATE: &str = "ENDDATE";
    pub const STATUS: &str = "STATUS";
    pub const MONTH: &str = "MONTH";
    pub const NAME: &str = "NAME";
    pub const CONTINGENCY: &str = "CTG";
    pub const PEAK_ID: &str = "PEAKID";
    pub const SOURCE: &str = "SCENARIO";
    pub const SHADOW_PRICE: &str = "SP";
    pub const BINDING_HOURS: &str = "NB_HOUR_BIND";
    pub const SP_PER_HOUR: &str = "SP_PER_HOUR";
    pub const ZONE_NAME: &str = "ZONENAME";
    pub const DEMAND_MW: &str = "DEMANDMW";
    pub const WIND_GENERATION: &str = "WIND_GEN";
    /// Market-side constraint ids of the post-mortem table.
    pub const MARKET_CANONICAL_ID: &str = "CID_MAG";
    pub const MARKET_RAW_ID: &str = "CID_CES";
    pub const CONSTRAINT_NAME: &str = "CONSTRAINTNAME";
    pub const CONTINGENCY_NAME: &str = "CONTINGENCYNAME";
}

/// Outages ending after this date are open-ended placeholders.
pub const OUTAGE_END_CUTOFF: &str = "2049-01-01";

/// Pools reachable from `pool`, hybrid markets included.
fn pool_filter(column: &str, pool: PoolId) -> String {
    format!(
        "({column} = {pool} OR {column} IN (SELECT DISTINCT MAG_REF_POOLHYBRID__ID \
         FROM MAGSNOWFLAKE.DAYZER.LINK_HYBRID_MKT WHERE MAG_REF_POOL__ID = {pool}))"
    )
}

/// `IN` list body; an empty list matches nothing instead of being invalid.
fn in_list<I, T>(ids: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    or_null(id_list(ids))
}

/// Rendered list, or `NULL` when it is empty.
fn or_null(list: String) -> String {
    if list.is_empty() { "NULL".to_owned() } else { list }
}

fn text_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    or_null(
        values
            .into_iter()
            .map(quote_literal)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn date_literal(date: NaiveDate) -> String {
    format!("DATE('{}')", date.format("%Y-%m-%d"))
}
