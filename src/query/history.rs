use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::core::{
    BindingSummaryRow, CanonicalConstraintId, DateWindow, PoolId, RawConstraintId, ScenarioId,
    ShadowPriceHistoryRow, month_start,
};
use crate::error::{PostMortemError, PostMortemResult};
use crate::warehouse::{Cell, QueryScript, RowView, normalize_column};

use super::{BINDING_SUMMARY, SHADOW_PRICE_HISTORY, columns, date_literal, in_list};

const HISTORY_KEY_COLUMNS: [&str; 6] = [
    columns::MONTH,
    columns::CANONICAL_ID,
    columns::RAW_ID,
    columns::NAME,
    columns::CONTINGENCY,
    columns::PEAK_ID,
];

/// Monthly shadow price of every constraint on the main constraint's
/// monitored line, one column per source. Without a window the full history
/// is returned.
#[must_use]
pub fn history_script(
    pool: PoolId,
    constraint: CanonicalConstraintId,
    scenario_ids: &[ScenarioId],
    window: Option<DateWindow>,
) -> QueryScript {
    let scenarios = in_list(scenario_ids);
    let month_filter = window.map_or_else(String::new, |window| {
        format!(
            "WHERE MONTH BETWEEN {} AND {}",
            date_literal(month_start(window.start)),
            date_literal(window.end)
        )
    });

    let collect = format!(
        "CREATE OR REPLACE TEMPORARY TABLE HISTORY_SOURCES AS
WITH LINE_CONSTRAINTS AS (
    SELECT MAG_CID, MIN(CES_CID) AS CES_CID, MIN(CES_NAME) AS CES_NAME,
           CONCAT(' MAG: ', MAG_CID, ' CES: ', MIN(CES_CID), ' CTG: ', SPLIT_PART(MIN(CES_NAME), ':', 2)) AS NAME,
           SPLIT_PART(MIN(CES_NAME), ':', 2) AS CTG
    FROM MAGSQLSERVER.DAYZERSTUDY.MAG_CES_CONSTRAINTS_MAP_HISTORIC
    WHERE SPLIT_PART(CES_NAME, ':', 0) = (
        SELECT TOP 1 SPLIT_PART(CES_NAME, ':', 0)
        FROM MAGSQLSERVER.DAYZERSTUDY.MAG_CES_CONSTRAINTS_MAP_HISTORIC
        WHERE MAG_CID = {constraint}
    )
    GROUP BY MAG_CID
),
MARKET AS (
    SELECT DATE_TRUNC(MONTH, A.DATE) AS MONTH, B.MAG_CID, B.CES_CID, B.NAME, B.CTG, A.PEAKID,
           'SP_DA' AS PIVOT_COLUMN, SUM(A.SHADOWPRICE) AS PIVOT_VALUE
    FROM (SELECT DISTINCT MAG_REF_POOL__ID, DATE, HE, PEAKID, CID_MAG, CONSTRAINTNAME,
                          FACILITYNAME, CONTINGENCYNAME, SHADOWPRICE
          FROM MAGSNOWFLAKE.DAYZER.PROD_DA_CONSTRAINTS_MAPPED
          WHERE MAG_REF_POOL__ID = {pool}) A
    INNER JOIN LINE_CONSTRAINTS B ON A.CID_MAG = B.MAG_CID
    GROUP BY 1, 2, 3, 4, 5, 6
    UNION
    SELECT DATE_TRUNC(MONTH, A.DATE), B.MAG_CID, B.CES_CID, B.NAME, B.CTG, A.PEAKID,
           'SP_RT', SUM(A.SP_RT)
    FROM (SELECT DISTINCT MAG_REF_POOL__ID, DATE, HE, PEAKID, CID_MAG, CONSTRAINTNAME,
                          FACILITYNAME, CONTINGENCYNAME, SP_RT
          FROM MAGSNOWFLAKE.DAYZER.PROD_RT_CONSTRAINTS_MAPPED
          WHERE MAG_REF_POOL__ID = {pool}) A
    INNER JOIN LINE_CONSTRAINTS B ON A.CID_MAG = B.MAG_CID
    GROUP BY 1, 2, 3, 4, 5, 6
),
SHADOW_COST AS (
    SELECT A.STARTDATE AS MONTH, C.MAG_CID, C.CES_CID, C.NAME, C.CTG, A.PEAKID,
           CASE
               WHEN A.ISANNUAL = 0 AND A.STARTDATE = A.AUCTIONDATE THEN 'SC_1MA'
               WHEN A.ISANNUAL = 0 AND A.STARTDATE > A.AUCTIONDATE
                    AND DATEDIFF(MONTH, A.STARTDATE, A.ENDDATE) <= 1
                   THEN CONCAT('SC_', DATEDIFF(MONTH, A.AUCTIONDATE, A.STARTDATE) + 1, 'MA')
               WHEN A.ISANNUAL = 1 AND A.MAG_REF_MARKET__ID = 5 THEN CONCAT('SC_1YA_S', A.ROUND)
               WHEN A.ISANNUAL = 1 AND A.MAG_REF_MARKET__ID = 0 AND MONTH(A.AUCTIONDATE) IN (4, 5)
                   THEN CONCAT('SC_1YA_R', A.ROUND)
               WHEN A.ISANNUAL = 1 AND A.MAG_REF_MARKET__ID = 4 THEN 'SC_1YA'
           END AS PIVOT_COLUMN,
           CAST(SUM(ABS(A.SHADOWCOST)) AS INT) AS PIVOT_VALUE
    FROM MAGSNOWFLAKE.DAYZER.VWMAG_SHADOWCOST A
    INNER JOIN MAGSQLSERVER.DAYZERSTUDY.MAG_CES_CONSTRAINTS_MAP_HISTORIC B
        ON A.CID_CES = B.CES_CID
       AND A.MAG_REF_PACKAGEVERSION__ID = B.MAG_REF_PACKAGEVERSION__ID
       AND A.MAG_REF_MARKET__ID = B.MAG_REF_POOL__ID
    INNER JOIN LINE_CONSTRAINTS C ON B.MAG_CID = C.MAG_CID
    WHERE A.MAG_REF_MARKET__ID = {pool}
    GROUP BY 1, 2, 3, 4, 5, 6, 7
),
SIMULATED AS (
    SELECT A.MONTH, B.MAG_CID, B.CES_CID, B.NAME, B.CTG, A.PEAKID,
           A.SCENARIONAME AS PIVOT_COLUMN, CAST(SUM(A.SHADOWPRICE) AS INT) AS PIVOT_VALUE
    FROM MAGSNOWFLAKE.DAYZER.VWMAG_CONSTRAINTS_RESULTS_MONTHLY A
    INNER JOIN LINE_CONSTRAINTS B ON A.CONSTRAINTMAPPING_MAG_REF__ID = B.MAG_CID
    WHERE A.SHADOWPRICE <> 0
      AND A.MAG_REF_SCENARIO_INFO__ID IN ({scenarios})
    GROUP BY 1, 2, 3, 4, 5, 6, 7
)
SELECT * FROM (
    SELECT * FROM SHADOW_COST
    UNION
    SELECT * FROM SIMULATED
    UNION
    SELECT * FROM MARKET
)
{month_filter}"
    );

    QueryScript::new(SHADOW_PRICE_HISTORY)
        .with_statement(collect)
        .with_statement(
            "SELECT * FROM HISTORY_SOURCES
PIVOT (SUM(PIVOT_VALUE) FOR PIVOT_COLUMN IN (ANY ORDER BY PIVOT_COLUMN))
ORDER BY MONTH, MAG_CID, PEAKID",
        )
}

/// Fixed key columns are read by name; every other column is a source value.
pub fn decode_history_row(row: &RowView<'_>) -> PostMortemResult<ShadowPriceHistoryRow> {
    let mut values = IndexMap::new();
    for column in row.columns() {
        let name = normalize_column(column);
        if HISTORY_KEY_COLUMNS
            .iter()
            .any(|key| key.eq_ignore_ascii_case(name))
        {
            continue;
        }
        values.insert(name.to_owned(), row.opt_f64(column)?);
    }

    Ok(ShadowPriceHistoryRow {
        month: row.date(columns::MONTH)?,
        canonical: CanonicalConstraintId::new(row.i64(columns::CANONICAL_ID)?),
        raw: RawConstraintId::new(row.i64(columns::RAW_ID)?),
        name: row.opt_text(columns::NAME)?.unwrap_or_default(),
        contingency: row.opt_text(columns::CONTINGENCY)?,
        peak_id: row.opt_i64(columns::PEAK_ID)?.unwrap_or_default(),
        values,
    })
}

/// Binding hours and totals per source over an FTR window: each simulated
/// scenario, day-ahead and real-time market prices, and the monthly auction
/// shadow cost.
#[must_use]
pub fn binding_summary_script(
    pool: PoolId,
    constraint: CanonicalConstraintId,
    window: DateWindow,
) -> QueryScript {
    let start = date_literal(window.start);
    let end = date_literal(window.end);

    QueryScript::new(BINDING_SUMMARY)
        .with_statement(format!(
            "SET POOL_NAME = (SELECT DISTINCT MARKET FROM MAGSQLSERVER.DAYZERSTUDY.MAG_REF_MARKET \
             WHERE MAG_REF_MARKET__ID = {pool})"
        ))
        .with_statement(format!(
            "WITH PEAK_HOURS AS (
    SELECT FTR_PEAKID AS PEAKID, COUNT(*) AS NB_HOUR
    FROM MAGSNOWFLAKE.DAYZER_CUBES_STAGING.YESENERGY_PEAKS
    WHERE MAG_REF_POOL__ID = {pool}
      AND DATE_TRUNC(DAY, DATEADD(HOUR, -1, DATETIME)) BETWEEN {start} AND {end}
    GROUP BY FTR_PEAKID
),
DAY_AHEAD AS (
    SELECT 'SP_DA' AS SCENARIO, CAST(SUM(SHADOWPRICE) AS INT) AS SP, COUNT(*) AS NB_HOUR_BIND,
           CAST(IFF(COUNT(*) = 0, 0, SUM(SHADOWPRICE) / COUNT(*)) AS INT) AS SP_PER_HOUR,
           NULL AS MINLIMIT, NULL AS MAXLIMIT
    FROM (SELECT DISTINCT MAG_REF_POOL__ID, PEAKID, DATE, HE, CID_MAG, CONSTRAINTNAME,
                          FACILITYNAME, CONTINGENCYNAME, SHADOWPRICE
          FROM MAGSNOWFLAKE.DAYZER.PROD_DA_CONSTRAINTS_MAPPED
          WHERE MAG_REF_POOL__ID = {pool}
            AND DATE BETWEEN {start} AND {end}
            AND CID_MAG = {constraint})
),
REAL_TIME AS (
    SELECT 'SP_RT' AS SCENARIO, CAST(SUM(SP_RT) AS INT) AS SP, COUNT(*) AS NB_HOUR_BIND,
           CAST(IFF(COUNT(*) = 0, 0, SUM(SP_RT) / COUNT(*)) AS INT) AS SP_PER_HOUR,
           NULL AS MINLIMIT, NULL AS MAXLIMIT
    FROM (SELECT DISTINCT MAG_REF_POOL__ID, PEAKID, DATE, HE, CID_MAG, CONSTRAINTNAME,
                          FACILITYNAME, CONTINGENCYNAME, SP_RT
          FROM MAGSNOWFLAKE.DAYZER.PROD_RT_CONSTRAINTS_MAPPED
          WHERE MAG_REF_POOL__ID = {pool}
            AND DATE BETWEEN {start} AND {end}
            AND CID_MAG = {constraint})
),
SHADOW_COST AS (
    SELECT 'SP_SC_1MA' AS SCENARIO, CAST(SUM(ABS(SHADOWCOST)) AS INT) AS SP,
           NULL AS NB_HOUR_BIND, NULL AS SP_PER_HOUR, NULL AS MINLIMIT, NULL AS MAXLIMIT
    FROM (SELECT DISTINCT B.MAG_CID, A.PEAKID, A.SHADOWCOST
          FROM MAGSNOWFLAKE.DAYZER.VWMAG_SHADOWCOST A
          INNER JOIN MAGSQLSERVER.DAYZERSTUDY.MAG_CES_CONSTRAINTS_MAP_HISTORIC B
              ON A.CID_CES = B.CES_CID
             AND A.MAG_REF_PACKAGEVERSION__ID = B.MAG_REF_PACKAGEVERSION__ID
          WHERE A.POOLNAME = $POOL_NAME
            AND A.AUCTIONDATE = A.STARTDATE
            AND A.STARTDATE = {start}
            AND A.ENDDATE = {end}
            AND B.MAG_CID = {constraint})
),
SIMULATED AS (
    SELECT A.SCENARIONAME AS SCENARIO, CAST(SUM(ABS(A.SHADOWPRICE)) AS INT) AS SP,
           SUM(CAST(B.NB_HOUR * A.BINDINGHOURSPCT AS INT)) AS NB_HOUR_BIND,
           CAST(IFF(SUM(CAST(B.NB_HOUR * A.BINDINGHOURSPCT AS INT)) = 0, 0,
                    SUM(ABS(A.SHADOWPRICE)) / SUM(CAST(B.NB_HOUR * A.BINDINGHOURSPCT AS INT))) AS INT)
               AS SP_PER_HOUR,
           AVG(A.MINLOWERLIMIT) AS MINLIMIT, AVG(A.MAXUPPERLIMIT) AS MAXLIMIT
    FROM MAGSNOWFLAKE.DAYZER.VWMAG_CONSTRAINTS_RESULTS_MONTHLY A
    LEFT JOIN PEAK_HOURS B ON A.PEAKID = B.PEAKID
    WHERE A.MAG_REF_POOL__ID = {pool}
      AND A.MONTH = {start}
      AND A.CONSTRAINTMAPPING_MAG_REF__ID = {constraint}
      AND A.MAG_REF_PRODUCT__ID IN (1, 2)
    GROUP BY A.SCENARIONAME
)
SELECT * FROM SIMULATED
UNION SELECT * FROM DAY_AHEAD
UNION SELECT * FROM SHADOW_COST
UNION SELECT * FROM REAL_TIME
ORDER BY SCENARIO"
        ))
}

pub fn decode_binding_summary_row(row: &RowView<'_>) -> PostMortemResult<BindingSummaryRow> {
    Ok(BindingSummaryRow {
        source: row.text(columns::SOURCE)?,
        total_shadow_price: decimal_or_zero(row, columns::SHADOW_PRICE)?,
        binding_hours: row.opt_i64(columns::BINDING_HOURS)?.unwrap_or_default(),
        shadow_price_per_hour: decimal_or_zero(row, columns::SP_PER_HOUR)?,
        min_limit: row.opt_f64(columns::MIN_LIMIT)?,
        max_limit: row.opt_f64(columns::MAX_LIMIT)?,
    })
}

fn decimal_or_zero(row: &RowView<'_>, column: &str) -> PostMortemResult<Decimal> {
    if let Cell::Int(value) = row.cell(column)? {
        return Ok(Decimal::from(*value));
    }
    match row.opt_f64(column)? {
        None => Ok(Decimal::ZERO),
        Some(value) => Decimal::try_from(value).map_err(|e| {
            PostMortemError::malformed(BINDING_SUMMARY, column, format!("`{value}`: {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{
        binding_summary_script, decode_binding_summary_row, decode_history_row, history_script,
    };
    use crate::core::{CanonicalConstraintId, DateWindow, PoolId, ScenarioId};
    use crate::warehouse::{Cell, ResultSet};

    fn march() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid"),
            NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid"),
        )
        .expect("window")
    }

    #[test]
    fn history_script_collects_then_pivots() {
        let script = history_script(
            PoolId::new(5),
            CanonicalConstraintId::new(50011660),
            &[ScenarioId::new(3)],
            None,
        );
        assert_eq!(script.statements().len(), 2);
        assert!(script.statements()[0].starts_with("CREATE OR REPLACE TEMPORARY TABLE"));
        assert!(script.statements()[1].contains("PIVOT (SUM(PIVOT_VALUE)"));
        assert!(!script.statements()[0].contains("WHERE MONTH BETWEEN"));

        let windowed = history_script(
            PoolId::new(5),
            CanonicalConstraintId::new(50011660),
            &[ScenarioId::new(3)],
            Some(march()),
        );
        assert!(windowed.statements()[0].contains("WHERE MONTH BETWEEN DATE('2025-03-01')"));
    }

    #[test]
    fn history_rows_keep_every_pivoted_column_by_bare_name() {
        let set = ResultSet::new([
            "MONTH",
            "MAG_CID",
            "CES_CID",
            "NAME",
            "CTG",
            "PEAKID",
            "'SC_1MA'",
            "'SP_DA'",
            "'ERCOT_1MA_Default'",
        ])
        .with_row(vec![
            Cell::from("2025-03-01"),
            Cell::Int(50011660),
            Cell::Int(799),
            Cell::from(" MAG: 50011660 CES: 799 CTG: BASE"),
            Cell::from("BASE"),
            Cell::Int(1),
            Cell::Null,
            Cell::Float(-310.0),
            Cell::Int(120),
        ]);
        let rows = set.decode("history", decode_history_row).expect("decode");
        let keys: Vec<&str> = rows[0].values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["SC_1MA", "SP_DA", "ERCOT_1MA_Default"]);
        assert_eq!(rows[0].value("SP_DA"), 310.0);
        assert_eq!(rows[0].value("SC_1MA"), 0.0);
    }

    #[test]
    fn binding_summary_reads_nulls_as_zero() {
        let script = binding_summary_script(
            PoolId::new(5),
            CanonicalConstraintId::new(50011660),
            march(),
        );
        assert_eq!(script.statements().len(), 2);
        assert!(script.text().contains("'SP_SC_1MA' AS SCENARIO"));

        let set = ResultSet::new(["SCENARIO", "SP", "NB_HOUR_BIND", "SP_PER_HOUR", "MINLIMIT", "MAXLIMIT"])
            .with_row(vec![
                Cell::from("SP_SC_1MA"),
                Cell::Int(45210),
                Cell::Null,
                Cell::Null,
                Cell::Null,
                Cell::Null,
            ]);
        let rows = set
            .decode("binding_summary", decode_binding_summary_row)
            .expect("decode");
        assert_eq!(rows[0].total_shadow_price, Decimal::new(45210, 0));
        assert_eq!(rows[0].binding_hours, 0);
        assert_eq!(rows[0].shadow_price_per_hour, Decimal::ZERO);
        assert_eq!(rows[0].total_display(), "$45,210");
    }
}
