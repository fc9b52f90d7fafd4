use indexmap::IndexMap;

use crate::core::{
    CanonicalConstraintId, DateWindow, PoolId, PostMortemRow, RawConstraintId, ScenarioName,
    month_start,
};
use crate::error::PostMortemResult;
use crate::warehouse::{QueryScript, RowView, normalize_column};

use super::{POST_MORTEM, columns, date_literal, text_list};

const POST_MORTEM_KEY_COLUMNS: [&str; 5] = [
    columns::MARKET_CANONICAL_ID,
    columns::MARKET_RAW_ID,
    columns::CONSTRAINT_NAME,
    columns::CONTINGENCY_NAME,
    columns::SP_DAY_AHEAD,
];

/// Day-ahead market shadow price of every constraint of the pool against the
/// simulated shadow price of each named scenario, ordered by `|SP_DA|`.
///
/// Market prices come from the package version in force at the start of
/// the window. Simulated prices keep the minimum raw id of each canonical
/// constraint and scenario before being pivoted by scenario name.
#[must_use]
pub fn post_mortem_script(
    pool: PoolId,
    scenarios: &[ScenarioName],
    window: DateWindow,
) -> QueryScript {
    let names = text_list(scenarios.iter().map(ScenarioName::as_str));
    let first_month = date_literal(month_start(window.start));
    let start = date_literal(window.start);
    let end = date_literal(window.end);

    QueryScript::new(POST_MORTEM)
        .with_statement(format!(
            "SET PACK_ID = (SELECT MAX(MAG_REF_PACKAGEVERSION__ID) \
             FROM MAGSNOWFLAKE.DAYZER_CUBES.NODES_RESULTS_MONTHLY \
             WHERE DATE = {first_month} AND MAG_REF_POOL__ID = {pool})"
        ))
        .with_statement(format!(
            "CREATE OR REPLACE TEMPORARY TABLE POST_MORTEM_DA AS
SELECT CID_MAG, CID_CES, CONSTRAINTNAME, CONTINGENCYNAME,
       CAST(SUM(SHADOWPRICE) AS INT) AS SP_DA
FROM (SELECT DISTINCT MAG_REF_POOL__ID, PEAKID, POOLNAME, DATE, HE, CID_MAG, CID_CES,
                      CONSTRAINTNAME, FACILITYNAME, CONTINGENCYNAME, SHADOWPRICE
      FROM MAGSNOWFLAKE.DAYZER.PROD_DA_CONSTRAINTS_MAPPED
      WHERE MAG_REF_POOL__ID = {pool}
        AND DATE BETWEEN {start} AND {end}
        AND MAG_REF_PACKAGEVERSION__ID = $PACK_ID)
GROUP BY CID_MAG, CID_CES, CONSTRAINTNAME, FACILITYNAME, CONTINGENCYNAME"
        ))
        .with_statement(format!(
            "CREATE OR REPLACE TEMPORARY TABLE POST_MORTEM_SIMULATED AS
WITH SIMULATED AS (
    SELECT CONSTRAINTMAPPING_MAG_REF__ID AS CID_MAG,
           CONSTRAINTMAPPING_DAYZER_REF__ID AS CID_CES,
           SCENARIONAME AS PIVOT_COLUMN,
           CAST(SUM(ABS(SHADOWPRICE)) AS INT) AS PIVOT_VALUE
    FROM MAGSNOWFLAKE.DAYZER.VWMAG_CONSTRAINTS_RESULTS_MONTHLY
    WHERE MAG_REF_POOL__ID = {pool}
      AND SHADOWPRICE <> 0
      AND SCENARIONAME IN ({names})
      AND MONTH BETWEEN {first_month} AND {end}
    GROUP BY 1, 2, 3
),
MIN_RAW AS (
    SELECT CID_MAG, PIVOT_COLUMN, MIN(CID_CES) AS CID_CES
    FROM SIMULATED
    GROUP BY CID_MAG, PIVOT_COLUMN
)
SELECT A.CID_MAG, A.PIVOT_COLUMN, A.PIVOT_VALUE
FROM SIMULATED A
INNER JOIN MIN_RAW B
    ON A.CID_MAG = B.CID_MAG
   AND A.PIVOT_COLUMN = B.PIVOT_COLUMN
   AND A.CID_CES = B.CID_CES"
        ))
        .with_statement(
            "CREATE OR REPLACE TEMPORARY TABLE POST_MORTEM_PIVOT AS
SELECT * FROM POST_MORTEM_SIMULATED
PIVOT (SUM(PIVOT_VALUE) FOR PIVOT_COLUMN IN (ANY ORDER BY PIVOT_COLUMN))",
        )
        .with_statement(
            "SELECT A.*, B.* EXCLUDE (CID_MAG)
FROM POST_MORTEM_DA A
LEFT JOIN POST_MORTEM_PIVOT B ON A.CID_MAG = B.CID_MAG
ORDER BY ABS(A.SP_DA) DESC",
        )
}

/// Key columns are read by name; every other column is a scenario.
pub fn decode_post_mortem_row(row: &RowView<'_>) -> PostMortemResult<PostMortemRow> {
    let mut simulated = IndexMap::new();
    for column in row.columns() {
        let name = normalize_column(column);
        if POST_MORTEM_KEY_COLUMNS
            .iter()
            .any(|key| key.eq_ignore_ascii_case(name))
        {
            continue;
        }
        simulated.insert(name.to_owned(), row.opt_i64(column)?);
    }

    Ok(PostMortemRow {
        canonical: CanonicalConstraintId::new(row.i64(columns::MARKET_CANONICAL_ID)?),
        raw: row
            .opt_i64(columns::MARKET_RAW_ID)?
            .map(RawConstraintId::new),
        constraint_name: row.opt_text(columns::CONSTRAINT_NAME)?.unwrap_or_default(),
        contingency: row.opt_text(columns::CONTINGENCY_NAME)?,
        sp_day_ahead: row.opt_i64(columns::SP_DAY_AHEAD)?.unwrap_or_default(),
        simulated,
    })
}
