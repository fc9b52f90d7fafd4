use crate::core::{DateWindow, LoadRow, ScenarioName, TOTAL_LOAD_ZONE, WindRow};
use crate::error::PostMortemResult;
use crate::warehouse::{QueryScript, RowView, quote_literal};

use super::{LOAD, WIND, columns, date_literal, text_list};

/// Hourly demand of every load zone plus a `TOTAL` zone summing them.
/// Industrial load zones are left out of both.
#[must_use]
pub fn load_script(scenarios: &[ScenarioName], window: DateWindow) -> QueryScript {
    let names = text_list(scenarios.iter().map(ScenarioName::as_str));
    let start = date_literal(window.start);
    let end = date_literal(window.end);
    let total = quote_literal(TOTAL_LOAD_ZONE);

    QueryScript::new(LOAD).with_statement(format!(
        "WITH ZONES AS (
    SELECT SCENARIONAME, ZONENAME, HEDATE, DEMANDMW
    FROM MAGSNOWFLAKE.DAYZER_CUBES.ZONES_RESULTS_HOURLY
    WHERE SCENARIONAME IN ({names})
      AND (ZONETYPE <> 'IndustrialLoad' OR ZONETYPE IS NULL)
      AND DATE BETWEEN {start} AND {end}
)
SELECT SCENARIONAME, ZONENAME, HEDATE, DEMANDMW FROM ZONES
UNION ALL
SELECT SCENARIONAME, {total} AS ZONENAME, HEDATE, SUM(DEMANDMW) AS DEMANDMW
FROM ZONES
GROUP BY SCENARIONAME, HEDATE
ORDER BY HEDATE"
    ))
}

pub fn decode_load_row(row: &RowView<'_>) -> PostMortemResult<LoadRow> {
    Ok(LoadRow {
        scenario: ScenarioName::parse(&row.text(columns::SCENARIO_NAME)?),
        zone: row.text(columns::ZONE_NAME)?,
        hour_ending: row.timestamp(columns::HOUR_ENDING)?,
        demand_mw: row.opt_f64(columns::DEMAND_MW)?,
    })
}

/// Hourly generation of every wind unit, summed per scenario.
#[must_use]
pub fn wind_script(scenarios: &[ScenarioName], window: DateWindow) -> QueryScript {
    let names = text_list(scenarios.iter().map(ScenarioName::as_str));
    let start = date_literal(window.start);
    let end = date_literal(window.end);

    QueryScript::new(WIND).with_statement(format!(
        "SELECT SCENARIONAME, HEDATE, SUM(GENERATIONMW) AS WIND_GEN
FROM MAGSNOWFLAKE.DAYZER_CUBES.UNITS_RESULTS_HOURLY
WHERE SCENARIONAME IN ({names})
  AND DATE BETWEEN {start} AND {end}
  AND FUELNAME = 'Wind'
GROUP BY SCENARIONAME, HEDATE
ORDER BY HEDATE"
    ))
}

pub fn decode_wind_row(row: &RowView<'_>) -> PostMortemResult<WindRow> {
    Ok(WindRow {
        scenario: ScenarioName::parse(&row.text(columns::SCENARIO_NAME)?),
        hour_ending: row.timestamp(columns::HOUR_ENDING)?,
        generation_mw: row.opt_f64(columns::WIND_GENERATION)?,
    })
}
