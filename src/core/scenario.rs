use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ScenarioId;

const CLASSIFICATION_DELIMITER: char = '_';

/// Scenario name split once into its two-part key.
///
/// `ERCOT_1DA_Default` has classification `ERCOT` and scenario type
/// `1DA_Default`. A name without delimiter has an empty classification and is
/// its own scenario type.
#[derive(Debug, Clone, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScenarioName {
    name: String,
    split_at: Option<usize>,
}

impl ScenarioName {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_owned();
        let split_at = name.find(CLASSIFICATION_DELIMITER);
        Self { name, split_at }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn classification(&self) -> &str {
        match self.split_at {
            Some(index) => &self.name[..index],
            None => "",
        }
    }

    #[must_use]
    pub fn scenario_type(&self) -> &str {
        match self.split_at {
            Some(index) => &self.name[index + CLASSIFICATION_DELIMITER.len_utf8()..],
            None => &self.name,
        }
    }

    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        self.scenario_type() == other.scenario_type()
    }
}

impl PartialEq for ScenarioName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl PartialOrd for ScenarioName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScenarioName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl From<String> for ScenarioName {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for ScenarioName {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<ScenarioName> for String {
    fn from(value: ScenarioName) -> Self {
        value.name
    }
}

impl fmt::Display for ScenarioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Breakdown scenario shown for a selection: the selected scenario itself
/// when it is a candidate, otherwise the first candidate of the same
/// scenario type. At most one scenario is ever picked.
#[must_use]
pub fn pick_breakdown_target<'a>(
    candidates: &'a [ScenarioName],
    selected: &ScenarioName,
) -> Option<&'a ScenarioName> {
    candidates
        .iter()
        .find(|candidate| *candidate == selected)
        .or_else(|| candidates.iter().find(|candidate| candidate.same_type(selected)))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioRef {
    pub name: ScenarioName,
    pub id: ScenarioId,
}

/// Outcome of resolving one logical scenario grouping.
///
/// Unknown names are kept in `requested` but produce no `ScenarioRef`;
/// retrieval only ever uses `ids()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedScenarios {
    pub requested: Vec<ScenarioName>,
    pub refs: Vec<ScenarioRef>,
}

impl ResolvedScenarios {
    /// Distinct resolved ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ScenarioId> {
        let mut ids: Vec<ScenarioId> = self.refs.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Requested names in request order, duplicates removed.
    #[must_use]
    pub fn requested_names(&self) -> Vec<ScenarioName> {
        let mut seen = Vec::with_capacity(self.requested.len());
        for name in &self.requested {
            if !seen.contains(name) {
                seen.push(name.clone());
            }
        }
        seen
    }

    /// Resolved names in resolution order, duplicates removed.
    #[must_use]
    pub fn names(&self) -> Vec<ScenarioName> {
        let mut names: Vec<ScenarioName> = Vec::with_capacity(self.refs.len());
        for scenario in &self.refs {
            if !names.contains(&scenario.name) {
                names.push(scenario.name.clone());
            }
        }
        names
    }

    #[must_use]
    pub fn unresolved(&self) -> Vec<ScenarioName> {
        self.requested_names()
            .into_iter()
            .filter(|name| !self.refs.iter().any(|r| &r.name == name))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
