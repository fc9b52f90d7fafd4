use crate::core::{
    CanonicalConstraintId, PackageVersionId, PoolId, RawConstraintId, RawIdentityRecord,
    ScenarioId, ScenarioName, ScenarioRef,
};
use crate::error::PostMortemResult;
use crate::warehouse::{QueryScript, RowView};

use super::{IDENTITY_MAPPING, SCENARIO_IDS, columns, text_list};

/// Minimum raw id of each (canonical constraint, package version) group.
#[must_use]
pub fn identity_mapping_script(pool: PoolId, constraint: CanonicalConstraintId) -> QueryScript {
    QueryScript::new(IDENTITY_MAPPING).with_statement(format!(
        "WITH MIN_RAW AS (
    SELECT MAG_CID, MAG_REF_PACKAGEVERSION__ID, MIN(CES_CID) AS CES_CID
    FROM MAGSQLSERVER.DAYZERSTUDY.MAG_CES_CONSTRAINTS_MAP_HISTORIC
    WHERE MAG_REF_POOL__ID = {pool}
      AND MAG_CID = {constraint}
    GROUP BY MAG_CID, MAG_REF_PACKAGEVERSION__ID
)
SELECT DISTINCT MAG_CID, CES_CID, MAG_REF_PACKAGEVERSION__ID
FROM MIN_RAW
ORDER BY MAG_REF_PACKAGEVERSION__ID"
    ))
}

pub fn decode_identity_record(row: &RowView<'_>) -> PostMortemResult<RawIdentityRecord> {
    Ok(RawIdentityRecord {
        canonical: CanonicalConstraintId::new(row.i64(columns::CANONICAL_ID)?),
        raw: RawConstraintId::new(row.i64(columns::RAW_ID)?),
        package_version: PackageVersionId::new(row.i64(columns::PACKAGE_VERSION_ID)?),
    })
}

/// Numeric ids of the named scenarios. Unknown names simply produce no row.
#[must_use]
pub fn scenario_ids_script(names: &[ScenarioName]) -> QueryScript {
    let names = text_list(names.iter().map(ScenarioName::as_str));
    QueryScript::new(SCENARIO_IDS).with_statement(format!(
        "SELECT DISTINCT SCENARIONAME, MAG_REF_SCENARIO_INFO__ID
FROM MAGSNOWFLAKE.DAYZER.CONSTRAINT_SCENARIO_TO_BE_CUBED
WHERE SCENARIONAME IN ({names})
ORDER BY SCENARIONAME"
    ))
}

pub fn decode_scenario_ref(row: &RowView<'_>) -> PostMortemResult<ScenarioRef> {
    Ok(ScenarioRef {
        name: ScenarioName::parse(&row.text(columns::SCENARIO_NAME)?),
        id: ScenarioId::new(row.i64(columns::SCENARIO_ID)?),
    })
}
