use tracing::{debug, info};

use crate::core::{
    CanonicalConstraintId, PoolId, RawIdentityRecord, ResolvedIdentity, select_min_raw_id,
};
use crate::error::PostMortemResult;
use crate::query::{decode_identity_record, identity_mapping_script};
use crate::warehouse::{QuerySession, Warehouse};

/// Reconciles a canonical constraint against its raw identity records.
pub struct IdentityResolver;

impl IdentityResolver {
    /// Resolves the inclusion filters of `constraint` in `pool`.
    ///
    /// A constraint without any raw record resolves to an empty identity,
    /// which downstream retrieval turns into empty tables.
    pub fn resolve<W: Warehouse + ?Sized>(
        session: &mut QuerySession<'_, W>,
        pool: PoolId,
        constraint: CanonicalConstraintId,
    ) -> PostMortemResult<ResolvedIdentity> {
        let records = session.fetch(
            identity_mapping_script(pool, constraint),
            decode_identity_record,
        )?;
        let identity = Self::reconcile(pool, constraint, records);
        info!(
            pool = %pool,
            constraint = %constraint,
            raw_ids = identity.raw_ids.len(),
            package_versions = identity.package_versions.len(),
            "resolved constraint identity"
        );
        Ok(identity)
    }

    /// Keeps the minimum raw id per (canonical constraint, package version)
    /// and unions the survivors into filters. Records of other canonical
    /// constraints are ignored. The result does not depend on record order.
    #[must_use]
    pub fn reconcile(
        pool: PoolId,
        constraint: CanonicalConstraintId,
        records: Vec<RawIdentityRecord>,
    ) -> ResolvedIdentity {
        let records: Vec<RawIdentityRecord> = records
            .into_iter()
            .filter(|record| record.canonical == constraint)
            .collect();
        let (selected, stats) = select_min_raw_id(records);
        debug!(
            input = stats.input,
            groups = stats.groups,
            kept = stats.kept,
            "identity records reconciled"
        );
        ResolvedIdentity::from_selected(pool, constraint, &selected)
    }
}
