use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{
    ConstraintScope, Layer, LayerList, LayerRole, Panel, ScenarioName, Visibility,
    VisibilityVector, pick_breakdown_target,
};
use crate::error::{PostMortemError, PostMortemResult};

const PRIMARY_HISTORY_COLUMN: &str = "SP_DA";

/// Discrete user action the dashboard reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionEvent {
    /// Breakdown scenario button.
    ScenarioSelected(ScenarioName),
    /// Outage slider, in whole MW.
    OutageThresholdChanged { panel: Panel, threshold: i64 },
    /// Historical shadow-price scope button.
    ConstraintScopeSelected(ConstraintScope),
}

impl SelectionEvent {
    /// Panel whose layers the event may reassign.
    #[must_use]
    pub fn addressed_panels(&self) -> &'static [Panel] {
        match self {
            Self::ScenarioSelected(_) => &[Panel::Category, Panel::Outage],
            Self::OutageThresholdChanged { .. } => &[Panel::Outage],
            Self::ConstraintScopeSelected(_) => &[Panel::ShadowpriceHistory],
        }
    }
}

/// Pure visibility state machine over one layer list.
///
/// The whole state is the `VisibilityVector`: every transition takes the
/// current vector and returns a new one, reassigning every layer of the
/// addressed panels and copying every other entry unchanged. Vector length
/// and per-index identity never change.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityEngine<'a> {
    layers: &'a LayerList,
}

impl<'a> VisibilityEngine<'a> {
    #[must_use]
    pub fn new(layers: &'a LayerList) -> Self {
        Self { layers }
    }

    #[must_use]
    pub fn layers(&self) -> &'a LayerList {
        self.layers
    }

    /// Vector of every layer's default visibility.
    #[must_use]
    pub fn initial_vector(&self) -> VisibilityVector {
        VisibilityVector::from_defaults(self.layers)
    }

    /// Applies `event` to `current`.
    ///
    /// An invalid event is rejected before anything is computed; the caller
    /// keeps `current`. Unmatched scenarios and scopes are not errors: they
    /// hide the addressed layers.
    pub fn transition(
        &self,
        current: &VisibilityVector,
        event: &SelectionEvent,
    ) -> PostMortemResult<VisibilityVector> {
        current.ensure_matches(self.layers)?;

        let next = match event {
            SelectionEvent::ScenarioSelected(scenario) => self.select_scenario(current, scenario),
            SelectionEvent::OutageThresholdChanged { panel, threshold } => self
                .apply_outage_threshold(current, *panel, *threshold)
                .inspect_err(|err| warn!(error = %err, "selection rejected"))?,
            SelectionEvent::ConstraintScopeSelected(scope) => self.select_scope(current, *scope),
        };

        debug!(
            event = ?event,
            changed = changed_count(current, &next),
            drawn = next.iter().filter(|(_, state)| state.is_drawn()).count(),
            "selection applied"
        );
        Ok(next)
    }

    /// Scenario whose outage anchor is currently drawn.
    #[must_use]
    pub fn active_outage_scenario(&self, vector: &VisibilityVector) -> Option<&'a ScenarioName> {
        self.layers
            .in_panel(Panel::Outage)
            .find(|layer| {
                matches!(layer.role, LayerRole::OutageHoverAnchor) && vector.is_drawn(layer)
            })
            .and_then(|layer| layer.scenario.as_ref())
    }

    /// Largest precomputed peak among the outage bars of `scenario`;
    /// 0 when the scenario has none.
    #[must_use]
    pub fn max_outage_peak(&self, scenario: &ScenarioName) -> f64 {
        self.layers
            .in_panel(Panel::Outage)
            .filter(|layer| layer.scenario.as_ref() == Some(scenario))
            .filter_map(|layer| layer.role.outage_peak())
            .fold(0.0, f64::max)
    }

    /// Valid thresholds for the active outage scenario, `1..=floor(max peak)`.
    /// `None` when no scenario is active or its max peak is below 1.
    #[must_use]
    pub fn outage_threshold_domain(&self, vector: &VisibilityVector) -> Option<RangeInclusive<i64>> {
        let scenario = self.active_outage_scenario(vector)?;
        let max_peak = self.max_outage_peak(scenario).floor();
        if max_peak < 1.0 {
            return None;
        }
        Some(1..=max_peak as i64)
    }

    fn select_scenario(
        &self,
        current: &VisibilityVector,
        selected: &ScenarioName,
    ) -> VisibilityVector {
        let category_scenarios = self.layers.scenarios_in(Panel::Category);
        let target = pick_breakdown_target(&category_scenarios, selected);
        trace!(
            selected = %selected,
            category_target = target.map(ScenarioName::as_str),
            "scenario selection target"
        );

        self.reassign(current, &[Panel::Category, Panel::Outage], |layer| {
            let matches = match layer.panel {
                Panel::Category => target.is_some() && layer.scenario.as_ref() == target,
                _ => layer.scenario.as_ref() == Some(selected),
            };
            Visibility::from_flag(matches)
        })
    }

    fn apply_outage_threshold(
        &self,
        current: &VisibilityVector,
        panel: Panel,
        threshold: i64,
    ) -> PostMortemResult<VisibilityVector> {
        if panel != Panel::Outage {
            return Err(PostMortemError::InvalidSelection(format!(
                "outage threshold addressed to panel {panel:?}"
            )));
        }
        if threshold <= 0 {
            return Err(PostMortemError::InvalidSelection(format!(
                "outage threshold must be positive, got {threshold}"
            )));
        }
        let Some(active) = self.active_outage_scenario(current) else {
            return Err(PostMortemError::InvalidSelection(
                "no outage scenario is selected".to_owned(),
            ));
        };
        let max_peak = self.max_outage_peak(active);
        if threshold as f64 > max_peak {
            return Err(PostMortemError::InvalidSelection(format!(
                "outage threshold {threshold} exceeds max redirected flow {max_peak} of {active}"
            )));
        }

        Ok(self.reassign(current, &[Panel::Outage], |layer| {
            let in_scenario = layer.scenario.as_ref() == Some(active);
            let visible = match layer.role {
                LayerRole::OutageHoverAnchor => in_scenario,
                LayerRole::OutageRedirect { peak_magnitude, .. } => {
                    in_scenario && peak_magnitude >= threshold as f64
                }
                _ => false,
            };
            Visibility::from_flag(visible)
        }))
    }

    fn select_scope(&self, current: &VisibilityVector, scope: ConstraintScope) -> VisibilityVector {
        self.reassign(current, &[Panel::ShadowpriceHistory], |layer| match &layer.role {
            LayerRole::HistoryColumn {
                column,
                scope: layer_scope,
            } if *layer_scope == scope => {
                if column == PRIMARY_HISTORY_COLUMN {
                    Visibility::Visible
                } else {
                    Visibility::LegendOnly
                }
            }
            _ => Visibility::Hidden,
        })
    }

    /// Copies `current`, replacing the state of every layer in `panels`.
    fn reassign(
        &self,
        current: &VisibilityVector,
        panels: &[Panel],
        state_of: impl Fn(&Layer) -> Visibility,
    ) -> VisibilityVector {
        let mut next = current.clone();
        for layer in self.layers.iter().filter(|layer| panels.contains(&layer.panel)) {
            next.set(layer.id, state_of(layer));
        }
        next
    }
}

fn changed_count(before: &VisibilityVector, after: &VisibilityVector) -> usize {
    before
        .iter()
        .zip(after.iter())
        .filter(|((_, a), (_, b))| a != b)
        .count()
}
