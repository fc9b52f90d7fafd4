use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident, $raw:ty) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($raw);

        impl $name {
            #[must_use]
            pub const fn new(raw: $raw) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn raw(self) -> $raw {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id!(
    /// Market pool the constraint belongs to.
    PoolId,
    i64
);
integer_id!(
    /// Stable identity of a logical transmission constraint.
    CanonicalConstraintId,
    i64
);
integer_id!(
    /// Raw constraint identifier of one simulation package version.
    ///
    /// Many raw ids can map to one canonical constraint; the minimum raw id of
    /// a group is the authoritative one.
    RawConstraintId,
    i64
);
integer_id!(PackageVersionId, i64);
integer_id!(ScenarioId, i64);

/// Identity of one rendered layer, assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(u32);

impl LayerId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Position of the layer inside the creation-ordered layer list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Joins typed ids into a literal SQL list (`1,2,3`).
#[must_use]
pub fn id_list<I, T>(ids: I) -> String
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
