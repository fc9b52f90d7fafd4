use tracing::{debug, info};

use crate::core::{ResolvedScenarios, ScenarioName, ScenarioRef};
use crate::error::PostMortemResult;
use crate::query::{decode_scenario_ref, scenario_ids_script};
use crate::warehouse::{QuerySession, Warehouse};

/// Maps scenario names to the numeric ids retrieval is keyed by.
pub struct ScenarioResolver;

impl ScenarioResolver {
    /// Resolves one scenario grouping. Unknown and duplicate names are
    /// dropped silently; an empty request skips the warehouse entirely.
    pub fn resolve<W: Warehouse + ?Sized>(
        session: &mut QuerySession<'_, W>,
        grouping: &str,
        names: &[ScenarioName],
    ) -> PostMortemResult<ResolvedScenarios> {
        let requested = dedup_names(names);
        if requested.is_empty() {
            debug!(grouping, "no scenario requested");
            return Ok(ResolvedScenarios::default());
        }
        let refs = session.fetch(scenario_ids_script(&requested), decode_scenario_ref)?;
        let resolved = Self::reconcile(requested, refs);
        info!(
            grouping,
            requested = resolved.requested.len(),
            resolved_ids = resolved.ids().len(),
            unresolved = resolved.unresolved().len(),
            "resolved scenarios"
        );
        Ok(resolved)
    }

    /// Keeps refs whose name was requested, once each, in request order.
    #[must_use]
    pub fn reconcile(requested: Vec<ScenarioName>, refs: Vec<ScenarioRef>) -> ResolvedScenarios {
        let requested = dedup_names(&requested);
        let mut kept: Vec<ScenarioRef> = Vec::with_capacity(refs.len());
        for name in &requested {
            let mut matches: Vec<&ScenarioRef> =
                refs.iter().filter(|r| &r.name == name).collect();
            matches.sort_by_key(|r| r.id);
            for found in matches {
                if !kept.contains(found) {
                    kept.push(found.clone());
                }
            }
        }
        ResolvedScenarios {
            requested,
            refs: kept,
        }
    }
}

fn dedup_names(names: &[ScenarioName]) -> Vec<ScenarioName> {
    let mut unique: Vec<ScenarioName> = Vec::with_capacity(names.len());
    for name in names {
        if !name.as_str().is_empty() && !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    unique
}
