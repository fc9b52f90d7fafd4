use crate::core::{
    CanonicalConstraintId, Category, CategoryRow, DateWindow, FlowRow, LimitSentinels,
    PackageVersionId, RawConstraintId, ResolvedIdentity, ScenarioId, ScenarioName,
    sanitize_limit,
};
use crate::error::PostMortemResult;
use crate::warehouse::{QueryScript, RowView};

use super::{CATEGORIES, FLOWS, columns, date_literal, in_list, or_null, pool_filter};

/// Monitored element of each kept raw constraint, oriented from/to bus.
fn monitored_element_ctes(identity: &ResolvedIdentity) -> String {
    let pool = identity.pool;
    let raw_ids = or_null(identity.raw_id_list());
    let packages = or_null(identity.package_version_list());
    let definition_pool = pool_filter("MAG_REF_POOL__ID", pool);
    let element_pool = pool_filter("MAG_REF_POOL__ID", pool);
    format!(
        "DEFINITION AS (
    SELECT MAG_REF_POOL__ID, CES_CID, MAG_REF_PACKAGEVERSION__ID,
           SPLIT_PART(MONITOREDDAYZERELEMENTIDS, '_', 1) AS ELEMENT_ID,
           SPLIT_PART(MONITOREDDAYZERELEMENTIDS_DIR, '_', 1) AS ELEMENT_DIR
    FROM MAGSQLSERVER.DAYZERSTUDY.REF_DAYZER_CONSTRAINTS_DETAILS
    WHERE {definition_pool}
      AND TRY_TO_NUMBER(MONITOREDDAYZERELEMENTIDS) IS NOT NULL
      AND CES_CID IN ({raw_ids})
      AND MAG_REF_PACKAGEVERSION__ID IN ({packages})
),
ELEMENTS AS (
    SELECT MAG_REF_POOL__ID, MAG_REF_PACKAGEVERSION__ID, DAYZERELEMENTID, FROMBUSNAME, TOBUSNAME
    FROM MAGSQLSERVER.DAYZERSTUDY.REF_DAYZER_TRANSMISSION_ELEMENTS_DETAILS
    WHERE {element_pool}
),
MONITORED AS (
    SELECT D.CES_CID, D.MAG_REF_PACKAGEVERSION__ID,
           IFF(D.ELEMENT_DIR = 1, E.FROMBUSNAME, E.TOBUSNAME) AS FROMBUSNAME,
           IFF(D.ELEMENT_DIR = 1, E.TOBUSNAME, E.FROMBUSNAME) AS TOBUSNAME
    FROM DEFINITION D
    INNER JOIN ELEMENTS E
        ON D.ELEMENT_ID = E.DAYZERELEMENTID
       AND D.MAG_REF_PACKAGEVERSION__ID = E.MAG_REF_PACKAGEVERSION__ID
       AND D.MAG_REF_POOL__ID = E.MAG_REF_POOL__ID
),
CANONICAL_LINK AS (
    SELECT MAG_CID, CES_CID, MAG_REF_PACKAGEVERSION__ID, MAG_REF_POOL__ID
    FROM MAGSQLSERVER.DAYZERSTUDY.MAG_CES_CONSTRAINTS_MAP_HISTORIC
    WHERE MAG_CID = {constraint}
)",
        constraint = identity.constraint,
    )
}

/// Hourly flows, simulated and market shadow prices, and limits.
#[must_use]
pub fn flows_script(
    identity: &ResolvedIdentity,
    scenario_ids: &[ScenarioId],
    window: DateWindow,
    sentinels: LimitSentinels,
) -> QueryScript {
    let pool = identity.pool;
    let constraint = identity.constraint;
    let scenarios = in_list(scenario_ids);
    let raw_ids = or_null(identity.raw_id_list());
    let packages = or_null(identity.package_version_list());
    let start = date_literal(window.start);
    let end = date_literal(window.end);
    let raw_limit = sentinels.raw_limit;
    let flow_limit = sentinels.flow_limit;
    let shared = monitored_element_ctes(identity);

    QueryScript::new(FLOWS).with_statement(format!(
        "WITH {shared},
SIMULATED AS (
    SELECT DISTINCT SCENARIONAME, HEDATE, CONSTRAINTMAPPING_DAYZER_REF__ID AS CES_CID, FLOWS,
           ABS(SHADOWPRICE) AS SP_DZR,
           IFF(ABS(MINFLOWLIMIT) > {raw_limit}, NULL, MINFLOWLIMIT) AS MINLIMIT,
           IFF(ABS(MAXFLOWLIMIT) > {raw_limit}, NULL, MAXFLOWLIMIT) AS MAXLIMIT,
           SIMULATIONDATE, MAG_REF_PACKAGEVERSION__ID, MAG_REF_POOL__ID
    FROM MAGSNOWFLAKE.DAYZER_CUBES.CONSTRAINTS_RESULTS_HOURLY
    WHERE MAG_REF_SCENARIO_INFO__ID IN ({scenarios})
      AND MAG_REF_POOL__ID = {pool}
      AND CONSTRAINTMAPPING_DAYZER_REF__ID IN ({raw_ids})
      AND MAG_REF_PACKAGEVERSION__ID IN ({packages})
      AND CAST(DATEADD(HOUR, -1, HEDATE) AS DATE) BETWEEN {start} AND {end}
),
LINKED AS (
    SELECT S.*, L.MAG_CID
    FROM SIMULATED S
    INNER JOIN CANONICAL_LINK L
        ON S.CES_CID = L.CES_CID
       AND S.MAG_REF_PACKAGEVERSION__ID = L.MAG_REF_PACKAGEVERSION__ID
       AND S.MAG_REF_POOL__ID = L.MAG_REF_POOL__ID
),
MIN_RAW AS (
    SELECT SCENARIONAME, HEDATE, MAG_CID, MIN(CES_CID) AS MIN_CES_CID
    FROM LINKED
    GROUP BY SCENARIONAME, HEDATE, MAG_CID
),
KEPT AS (
    SELECT A.*
    FROM LINKED A
    INNER JOIN MIN_RAW B
        ON A.SCENARIONAME = B.SCENARIONAME
       AND A.HEDATE = B.HEDATE
       AND A.MAG_CID = B.MAG_CID
       AND A.CES_CID = B.MIN_CES_CID
),
MARKET_DA AS (
    SELECT DISTINCT DATEADD(HOUR, HE, DATE) AS HEDATE, SHADOWPRICE AS SP_DA
    FROM MAGSNOWFLAKE.DAYZER.PROD_DA_CONSTRAINTS_MAPPED
    WHERE MAG_REF_POOL__ID = {pool} AND CID_MAG = {constraint}
),
MARKET_RT AS (
    SELECT DISTINCT DATEADD(HOUR, HE, DATE) AS HEDATE, SP_RT
    FROM MAGSNOWFLAKE.DAYZER.PROD_RT_CONSTRAINTS_MAPPED
    WHERE MAG_REF_POOL__ID = {pool} AND CID_MAG = {constraint}
)
SELECT K.SCENARIONAME, K.HEDATE, K.MAG_CID, K.CES_CID, K.MAG_REF_PACKAGEVERSION__ID,
       K.FLOWS, ABS(K.SP_DZR) AS SP_DZR,
       ABS(IFNULL(DA.SP_DA, 0)) AS SP_DA,
       ABS(IFNULL(RT.SP_RT, 0)) AS SP_RT,
       IFF(ABS(K.MINLIMIT) > {flow_limit}, NULL, K.MINLIMIT) AS MINLIMIT,
       IFF(ABS(K.MAXLIMIT) > {flow_limit}, NULL, K.MAXLIMIT) AS MAXLIMIT,
       K.SIMULATIONDATE, M.FROMBUSNAME, M.TOBUSNAME
FROM KEPT K
LEFT JOIN MARKET_DA DA ON K.HEDATE = DA.HEDATE
LEFT JOIN MARKET_RT RT ON K.HEDATE = RT.HEDATE
LEFT JOIN MONITORED M
    ON K.MAG_REF_PACKAGEVERSION__ID = M.MAG_REF_PACKAGEVERSION__ID
   AND K.CES_CID = M.CES_CID
ORDER BY K.HEDATE"
    ))
}

pub fn decode_flow_row(row: &RowView<'_>, sentinels: LimitSentinels) -> PostMortemResult<FlowRow> {
    Ok(FlowRow {
        scenario: ScenarioName::parse(&row.text(columns::SCENARIO_NAME)?),
        hour_ending: row.timestamp(columns::HOUR_ENDING)?,
        canonical: CanonicalConstraintId::new(row.i64(columns::CANONICAL_ID)?),
        raw: RawConstraintId::new(row.i64(columns::RAW_ID)?),
        package_version: PackageVersionId::new(row.i64(columns::PACKAGE_VERSION_ID)?),
        flow: row.opt_f64(columns::FLOWS)?,
        sp_simulated: row.opt_f64(columns::SP_SIMULATED)?.map(f64::abs),
        sp_day_ahead: row.opt_f64(columns::SP_DAY_AHEAD)?.map_or(0.0, f64::abs),
        sp_real_time: row.opt_f64(columns::SP_REAL_TIME)?.map_or(0.0, f64::abs),
        min_limit: sanitize_limit(row.opt_f64(columns::MIN_LIMIT)?, sentinels.flow_limit),
        max_limit: sanitize_limit(row.opt_f64(columns::MAX_LIMIT)?, sentinels.flow_limit),
        simulation_date: row.opt_date(columns::SIMULATION_DATE)?,
        from_bus: row.opt_text(columns::FROM_BUS)?,
        to_bus: row.opt_text(columns::TO_BUS)?,
    })
}

/// Hourly contribution of each generation category to the flow.
#[must_use]
pub fn categories_script(
    identity: &ResolvedIdentity,
    scenario_ids: &[ScenarioId],
    window: DateWindow,
) -> QueryScript {
    let scenarios = in_list(scenario_ids);
    let raw_ids = or_null(identity.raw_id_list());
    let packages = or_null(identity.package_version_list());
    let start = date_literal(window.start);
    let end = date_literal(window.end);
    let shared = monitored_element_ctes(identity);

    QueryScript::new(CATEGORIES).with_statement(format!(
        "WITH {shared},
IMPACTS AS (
    SELECT SCENARIONAME, MAG_REF_SCENARIO_INFO__ID, HEDATE, CONSTRAINTID AS CES_CID,
           MAG_REF_PACKAGEVERSION__ID, MAG_REF_POOL__ID,
           HYDRO_IMPACT AS HYDRO, WIND_IMPACT AS WIND, LOAD_IMPACT AS LOAD,
           SOLAR_IMPACT AS SOLAR, NRGEN_IMPACT AS OTHERS_UNITS, IE_IMPACT AS IE,
           GEO_IMPACT AS GEO, INDUSTRIALLOAD_IMPACT AS INDL_LOAD
    FROM MAGSNOWFLAKE.DAYZER_CUBES.CATEGORY_RESULTS_HOURLY
    WHERE MAG_REF_SCENARIO_INFO__ID IN ({scenarios})
      AND CONSTRAINTID IN ({raw_ids})
      AND MAG_REF_PACKAGEVERSION__ID IN ({packages})
      AND CAST(DATEADD(HOUR, -1, HEDATE) AS DATE) BETWEEN {start} AND {end}
),
LINKED AS (
    SELECT I.*, L.MAG_CID
    FROM IMPACTS I
    INNER JOIN CANONICAL_LINK L
        ON I.CES_CID = L.CES_CID
       AND I.MAG_REF_PACKAGEVERSION__ID = L.MAG_REF_PACKAGEVERSION__ID
       AND I.MAG_REF_POOL__ID = L.MAG_REF_POOL__ID
),
MIN_RAW AS (
    SELECT MAG_REF_SCENARIO_INFO__ID, HEDATE, MAG_CID, MIN(CES_CID) AS MIN_CES_CID
    FROM LINKED
    GROUP BY MAG_REF_SCENARIO_INFO__ID, HEDATE, MAG_CID
)
SELECT A.SCENARIONAME, A.MAG_REF_SCENARIO_INFO__ID, A.HEDATE, A.MAG_CID, A.CES_CID,
       A.MAG_REF_PACKAGEVERSION__ID,
       A.HYDRO, A.WIND, A.LOAD, A.SOLAR, A.OTHERS_UNITS, A.IE, A.GEO, A.INDL_LOAD,
       M.FROMBUSNAME, M.TOBUSNAME
FROM LINKED A
INNER JOIN MIN_RAW B
    ON A.MAG_REF_SCENARIO_INFO__ID = B.MAG_REF_SCENARIO_INFO__ID
   AND A.HEDATE = B.HEDATE
   AND A.MAG_CID = B.MAG_CID
   AND A.CES_CID = B.MIN_CES_CID
LEFT JOIN MONITORED M
    ON A.MAG_REF_PACKAGEVERSION__ID = M.MAG_REF_PACKAGEVERSION__ID
   AND A.CES_CID = M.CES_CID
ORDER BY A.HEDATE"
    ))
}

pub fn decode_category_row(row: &RowView<'_>) -> PostMortemResult<CategoryRow> {
    let mut impacts = [None; 8];
    for category in Category::ORDERED {
        impacts[category.index()] = row.opt_f64(category.label())?;
    }
    Ok(CategoryRow {
        scenario: ScenarioName::parse(&row.text(columns::SCENARIO_NAME)?),
        scenario_id: ScenarioId::new(row.i64(columns::SCENARIO_ID)?),
        hour_ending: row.timestamp(columns::HOUR_ENDING)?,
        canonical: CanonicalConstraintId::new(row.i64(columns::CANONICAL_ID)?),
        raw: RawConstraintId::new(row.i64(columns::RAW_ID)?),
        package_version: PackageVersionId::new(row.i64(columns::PACKAGE_VERSION_ID)?),
        impacts,
        from_bus: row.opt_text(columns::FROM_BUS)?,
        to_bus: row.opt_text(columns::TO_BUS)?,
    })
}
