use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::api::SelectionEvent;
use crate::core::{AxisSpec, Figure, LayerId, LayerKind, Panel, PanelStack, Visibility};
use crate::error::{PostMortemError, PostMortemResult};

/// Hover time format shared by every hourly panel.
pub const HOVER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M (%a)";

/// One stacked panel, placed in paper coordinates (`0.0` top, `1.0` bottom).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelFrame {
    pub panel: Panel,
    pub title: String,
    pub plot_top: f64,
    pub plot_bottom: f64,
    pub y_axis: AxisSpec,
    pub secondary_y_axis: Option<AxisSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureFrame {
    pub figure: Figure,
    pub title: String,
    /// Shared x-range of every panel in the figure; `None` lets the host fit.
    pub x_range: Option<(NaiveDateTime, NaiveDateTime)>,
    pub panels: Vec<PanelFrame>,
}

impl FigureFrame {
    #[must_use]
    pub fn from_stack(stack: &PanelStack, x_range: Option<(NaiveDateTime, NaiveDateTime)>) -> Self {
        let panels = stack
            .layout_regions(0.0, 1.0)
            .into_iter()
            .zip(stack.panels())
            .map(|(region, descriptor)| PanelFrame {
                panel: descriptor.panel,
                title: descriptor.panel.title().to_owned(),
                plot_top: region.plot_top,
                plot_bottom: region.plot_bottom,
                y_axis: descriptor.y_axis.clone(),
                secondary_y_axis: descriptor.secondary_y_axis.clone(),
            })
            .collect();
        Self {
            figure: stack.figure(),
            title: stack.figure().title().to_owned(),
            x_range,
            panels,
        }
    }
}

/// What the host needs to draw and toggle one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProjection {
    pub id: LayerId,
    pub name: String,
    pub panel: Panel,
    pub kind: LayerKind,
    pub legend_group: Option<String>,
    pub show_legend: bool,
    pub visibility: Visibility,
}

/// Button wired to one selection event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlButton {
    pub label: String,
    pub event: SelectionEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderStep {
    pub label: String,
    pub threshold: i64,
}

impl SliderStep {
    #[must_use]
    pub fn new(threshold: i64) -> Self {
        Self {
            label: format!("{threshold} MW"),
            threshold,
        }
    }
}

/// Outage threshold slider of the active outage scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderControl {
    pub panel: Panel,
    pub prefix: String,
    pub steps: Vec<SliderStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartControls {
    pub scenario_buttons: Vec<ControlButton>,
    pub outage_slider: Option<SliderControl>,
    pub scope_buttons: Vec<ControlButton>,
}

/// Complete, renderer-agnostic description of the dashboard in its current
/// visibility state. Layers are listed in creation order, so position in
/// `layers` is the layer index the host toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFrame {
    pub figures: Vec<FigureFrame>,
    pub hover_time_format: String,
    pub layers: Vec<LayerProjection>,
    pub controls: ChartControls,
}

impl ChartFrame {
    pub fn validate(&self) -> PostMortemResult<()> {
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.id.index() != index {
                return Err(PostMortemError::InvalidData(format!(
                    "layer {} projected at position {index}",
                    layer.id.raw()
                )));
            }
        }
        for figure in &self.figures {
            if let Some((start, end)) = figure.x_range {
                if start > end {
                    return Err(PostMortemError::InvalidData(format!(
                        "figure {:?} x-range starts after it ends",
                        figure.figure
                    )));
                }
            }
        }
        Ok(())
    }

    /// Positional visibility vector, applied verbatim by the host.
    #[must_use]
    pub fn visibility(&self) -> Vec<Visibility> {
        self.layers.iter().map(|layer| layer.visibility).collect()
    }

    #[must_use]
    pub fn drawn_count(&self) -> usize {
        self.layers
            .iter()
            .filter(|layer| layer.visibility.is_drawn())
            .count()
    }

    #[must_use]
    pub fn figure(&self, figure: Figure) -> Option<&FigureFrame> {
        self.figures.iter().find(|frame| frame.figure == figure)
    }
}
