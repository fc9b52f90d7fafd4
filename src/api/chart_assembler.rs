use tracing::{debug, warn};

use crate::core::{
    ConstraintScope, DateWindow, Figure, LayerList, Panel, PanelStack, ScenarioName,
    VisibilityVector,
};
use crate::error::PostMortemResult;
use crate::render::{
    ChartControls, ChartFrame, ChartRenderer, ControlButton, FigureFrame, HOVER_TIME_FORMAT,
    LayerProjection, SliderControl, SliderStep,
};

use super::{SelectionEvent, VisibilityEngine};

const OUTAGE_SLIDER_PREFIX: &str = "Redirected flow >= ";

/// Owns the built layers and the current vector, and forwards every frame
/// to a `ChartRenderer`.
///
/// The host wires user actions to `dispatch`; the returned vector is the
/// engine's output applied verbatim.
pub struct ChartAssembler<R: ChartRenderer> {
    renderer: R,
    layers: LayerList,
    vector: VisibilityVector,
    window: DateWindow,
    hourly: PanelStack,
    history: PanelStack,
}

impl<R: ChartRenderer> ChartAssembler<R> {
    pub fn new(
        renderer: R,
        layers: LayerList,
        vector: VisibilityVector,
        window: DateWindow,
    ) -> PostMortemResult<Self> {
        vector.ensure_matches(&layers)?;
        Ok(Self {
            renderer,
            layers,
            vector,
            window,
            hourly: PanelStack::hourly(),
            history: PanelStack::shadow_price_history(),
        })
    }

    #[must_use]
    pub fn layers(&self) -> &LayerList {
        &self.layers
    }

    #[must_use]
    pub fn vector(&self) -> &VisibilityVector {
        &self.vector
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Changes the relative height of one hourly panel.
    pub fn set_stretch_factor(&mut self, panel: Panel, stretch_factor: f64) -> PostMortemResult<bool> {
        self.hourly.set_stretch_factor(panel, stretch_factor)
    }

    /// Frame of the current visibility state.
    #[must_use]
    pub fn frame(&self) -> ChartFrame {
        self.frame_for(&self.vector)
    }

    fn frame_for(&self, vector: &VisibilityVector) -> ChartFrame {
        let layers = self
            .layers
            .iter()
            .map(|layer| LayerProjection {
                id: layer.id,
                name: layer.name.clone(),
                panel: layer.panel,
                kind: layer.kind,
                legend_group: layer.style.legend_group.clone(),
                show_legend: layer.style.show_legend,
                visibility: vector.get(layer.id).unwrap_or_default(),
            })
            .collect();

        let mut figures = vec![
            FigureFrame::from_stack(&self.hourly, Some(self.window.hourly_axis_range())),
            FigureFrame::from_stack(&self.history, None),
        ];
        figures.extend(self.grid_figures());

        ChartFrame {
            figures,
            hover_time_format: HOVER_TIME_FORMAT.to_owned(),
            layers,
            controls: self.controls(vector),
        }
    }

    /// Demand and wind figures, each only when it has layers. The demand
    /// title names the zone its layers were built for.
    fn grid_figures(&self) -> Vec<FigureFrame> {
        let range = Some(self.window.hourly_axis_range());
        let mut figures = Vec::new();
        if let Some(first) = self.layers.in_panel(Panel::Load).next() {
            let mut figure = FigureFrame::from_stack(&PanelStack::load(), range);
            if let Some(zone) = first.role.load_zone() {
                figure.title = Figure::load_title(zone);
            }
            figures.push(figure);
        }
        if self.layers.in_panel(Panel::Wind).next().is_some() {
            figures.push(FigureFrame::from_stack(&PanelStack::wind(), range));
        }
        figures
    }

    pub fn render(&mut self) -> PostMortemResult<()> {
        let frame = self.frame();
        self.renderer.render(&frame)
    }

    /// Applies `event` and re-renders. The new vector is kept only once
    /// its frame rendered; on any error the current vector stays.
    pub fn dispatch(&mut self, event: &SelectionEvent) -> PostMortemResult<&VisibilityVector> {
        let next = VisibilityEngine::new(&self.layers)
            .transition(&self.vector, event)
            .inspect_err(|err| warn!(error = %err, "keeping current visibility"))?;
        let frame = self.frame_for(&next);
        self.renderer
            .render(&frame)
            .inspect_err(|err| warn!(error = %err, "render failed, keeping current visibility"))?;
        self.vector = next;
        debug!(event = ?event, "dispatched selection");
        Ok(&self.vector)
    }

    /// Sorted union of the category and outage scenarios.
    #[must_use]
    pub fn breakdown_scenarios(&self) -> Vec<ScenarioName> {
        let mut scenarios = self.layers.scenarios_in(Panel::Category);
        scenarios.extend(self.layers.scenarios_in(Panel::Outage));
        scenarios.sort();
        scenarios.dedup();
        scenarios
    }

    fn controls(&self, vector: &VisibilityVector) -> ChartControls {
        let scenario_buttons = self
            .breakdown_scenarios()
            .into_iter()
            .map(|scenario| ControlButton {
                label: scenario.to_string(),
                event: SelectionEvent::ScenarioSelected(scenario),
            })
            .collect();

        let outage_slider = VisibilityEngine::new(&self.layers)
            .outage_threshold_domain(vector)
            .map(|domain| SliderControl {
                panel: Panel::Outage,
                prefix: OUTAGE_SLIDER_PREFIX.to_owned(),
                steps: domain.map(SliderStep::new).collect(),
            });

        let has_history = self.layers.in_panel(Panel::ShadowpriceHistory).next().is_some();
        let scope_buttons = if has_history {
            ConstraintScope::ORDERED
                .into_iter()
                .map(|scope| ControlButton {
                    label: scope.label().to_owned(),
                    event: SelectionEvent::ConstraintScopeSelected(scope),
                })
                .collect()
        } else {
            Vec::new()
        };

        ChartControls {
            scenario_buttons,
            outage_slider,
            scope_buttons,
        }
    }
}
