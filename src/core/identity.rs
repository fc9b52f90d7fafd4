use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::dedup::DedupRecord;
use super::{CanonicalConstraintId, PackageVersionId, PoolId, RawConstraintId, id_list};

/// One (raw constraint, package version) pairing mapped to a canonical
/// constraint by the source system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawIdentityRecord {
    pub canonical: CanonicalConstraintId,
    pub raw: RawConstraintId,
    pub package_version: PackageVersionId,
}

impl DedupRecord for RawIdentityRecord {
    type GroupKey = (CanonicalConstraintId, PackageVersionId);
    type OrderKey = (CanonicalConstraintId, PackageVersionId, RawConstraintId);

    fn group_key(&self) -> Self::GroupKey {
        (self.canonical, self.package_version)
    }

    fn raw_id(&self) -> RawConstraintId {
        self.raw
    }

    fn order_key(&self) -> Self::OrderKey {
        (self.canonical, self.package_version, self.raw)
    }
}

/// Canonical constraint plus the inclusion filters every retrieval is scoped
/// to: exactly the raw ids and package versions the dedup rule kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub pool: PoolId,
    pub constraint: CanonicalConstraintId,
    pub raw_ids: BTreeSet<RawConstraintId>,
    pub package_versions: BTreeSet<PackageVersionId>,
}

impl ResolvedIdentity {
    #[must_use]
    pub fn empty(pool: PoolId, constraint: CanonicalConstraintId) -> Self {
        Self {
            pool,
            constraint,
            raw_ids: BTreeSet::new(),
            package_versions: BTreeSet::new(),
        }
    }

    /// Builds the filters from records that already passed dedup.
    #[must_use]
    pub fn from_selected(
        pool: PoolId,
        constraint: CanonicalConstraintId,
        selected: &[RawIdentityRecord],
    ) -> Self {
        Self {
            pool,
            constraint,
            raw_ids: selected.iter().map(|record| record.raw).collect(),
            package_versions: selected.iter().map(|record| record.package_version).collect(),
        }
    }

    /// No raw record survived: the constraint has no history to retrieve.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw_ids.is_empty() || self.package_versions.is_empty()
    }

    /// Kept raw ids, comma separated, for the scripts' inclusion filters.
    #[must_use]
    pub fn raw_id_list(&self) -> String {
        id_list(&self.raw_ids)
    }

    #[must_use]
    pub fn package_version_list(&self) -> String {
        id_list(&self.package_versions)
    }
}
