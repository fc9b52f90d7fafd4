use crate::core::{
    CanonicalConstraintId, DateWindow, OutageRow, RawConstraintId, ResolvedIdentity, ScenarioId,
    ScenarioName,
};
use crate::error::PostMortemResult;
use crate::warehouse::{QueryScript, RowView};

use super::{OUTAGE_END_CUTOFF, OUTAGES, columns, date_literal, in_list};

/// Daily redirected flow per outage equipment. Impacts under 1 MW and
/// open-ended outages are left out.
#[must_use]
pub fn outages_script(
    identity: &ResolvedIdentity,
    scenario_ids: &[ScenarioId],
    window: DateWindow,
) -> QueryScript {
    let pool = identity.pool;
    let constraint = identity.constraint;
    let scenarios = in_list(scenario_ids);
    let start = date_literal(window.start);
    let end = date_literal(window.end);

    QueryScript::new(OUTAGES).with_statement(format!(
        "WITH DAILY AS (
    SELECT A.MDB_SCENARIONAME AS SCENARIONAME, B.MAG_CID, B.CES_CID, A.DATE,
           A.OUTAGEMAPPING_DAYZER_REF__ID AS OUTAGEID, A.EQKEY, A.ILODF,
           AVG(A.AVGREDIRECTEDFLOW) AS AVG_REDIRECTED_FLOW,
           A.STARTDATE, A.ENDDATE, A.STATUS
    FROM MAGSNOWFLAKE.DAYZER_CUBES.LOR_RESULTS_DAILY A
    INNER JOIN MAGSQLSERVER.DAYZERSTUDY.MAG_CES_CONSTRAINTS_MAP_HISTORIC B
        ON A.CONSTRAINTMAPPING_DAYZER_REF__ID = B.CES_CID
       AND A.MAG_REF_PACKAGEVERSION__ID = B.MAG_REF_PACKAGEVERSION__ID
    WHERE B.MAG_CID = {constraint}
      AND B.MAG_REF_POOL__ID = {pool}
      AND A.MAG_REF_SCENARIO_INFO__ID IN ({scenarios})
      AND ABS(A.AVGREDIRECTEDFLOW) >= 1
      AND A.DATE BETWEEN {start} AND {end}
      AND A.ENDDATE <= '{OUTAGE_END_CUTOFF}'
    GROUP BY A.MDB_SCENARIONAME, B.MAG_CID, B.CES_CID, A.DATE,
             A.OUTAGEMAPPING_DAYZER_REF__ID, A.EQKEY, A.ILODF,
             A.STARTDATE, A.ENDDATE, A.STATUS
),
MIN_RAW AS (
    SELECT SCENARIONAME, DATE, MAG_CID, MIN(CES_CID) AS MIN_CES_CID
    FROM DAILY
    GROUP BY SCENARIONAME, DATE, MAG_CID
)
SELECT A.SCENARIONAME, A.DATE, A.MAG_CID, A.CES_CID, A.EQKEY, A.OUTAGEID, A.ILODF,
       A.AVG_REDIRECTED_FLOW, TO_DATE(A.STARTDATE) AS STARTDATE,
       TO_DATE(A.ENDDATE) AS ENDDATE, A.STATUS
FROM DAILY A
INNER JOIN MIN_RAW B
    ON A.SCENARIONAME = B.SCENARIONAME
   AND A.DATE = B.DATE
   AND A.MAG_CID = B.MAG_CID
   AND A.CES_CID = B.MIN_CES_CID
ORDER BY A.DATE"
    ))
}

pub fn decode_outage_row(row: &RowView<'_>) -> PostMortemResult<OutageRow> {
    Ok(OutageRow {
        scenario: ScenarioName::parse(&row.text(columns::SCENARIO_NAME)?),
        date: row.date(columns::DATE)?,
        canonical: CanonicalConstraintId::new(row.i64(columns::CANONICAL_ID)?),
        raw: RawConstraintId::new(row.i64(columns::RAW_ID)?),
        equipment: row.text(columns::EQUIPMENT_KEY)?,
        outage_id: row.opt_i64(columns::OUTAGE_ID)?,
        ilodf: row.opt_f64(columns::ILODF)?,
        avg_redirected_flow: row.f64(columns::AVG_REDIRECTED_FLOW)?,
        start_date: row.opt_date(columns::START_DATE)?,
        end_date: row.opt_date(columns::END_DATE)?,
        status: row.opt_text(columns::STATUS)?,
    })
}
