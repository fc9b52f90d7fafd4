use serde::{Deserialize, Serialize};

use crate::error::{PostMortemError, PostMortemResult};

/// Chart panel a layer is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Panel {
    Flow,
    Category,
    Outage,
    ShadowpriceHistory,
    Load,
    Wind,
}

impl Panel {
    pub const ALL: [Panel; 6] = [
        Panel::Flow,
        Panel::Category,
        Panel::Outage,
        Panel::ShadowpriceHistory,
        Panel::Load,
        Panel::Wind,
    ];

    #[must_use]
    pub const fn figure(self) -> Figure {
        match self {
            Self::Flow | Self::Category | Self::Outage => Figure::Hourly,
            Self::ShadowpriceHistory => Figure::ShadowPriceHistory,
            Self::Load => Figure::Load,
            Self::Wind => Figure::Wind,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Flow => "Flows",
            Self::Category => "Categories",
            Self::Outage => "Transmission Outages",
            Self::ShadowpriceHistory => "Historical ShadowPrice",
            Self::Load => "Demand",
            Self::Wind => "Wind Generation",
        }
    }
}

/// Independent figure hosting one or more stacked panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Figure {
    Hourly,
    ShadowPriceHistory,
    /// Hourly demand of one load zone per scenario.
    Load,
    /// Hourly wind generation per scenario.
    Wind,
}

impl Figure {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Hourly => "Constraint Driver Decomposition",
            Self::ShadowPriceHistory => "Historical ShadowPrice",
            Self::Load => "Demand Over Time by Scenario",
            Self::Wind => "Wind Generation Time by Scenario",
        }
    }

    /// Load figure title naming its zone.
    #[must_use]
    pub fn load_title(zone: &str) -> String {
        format!("Demand {zone} Over Time by Scenario")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub title: String,
    /// Panel whose y-range this axis follows, when ranges are linked.
    pub matches: Option<Panel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDescriptor {
    pub panel: Panel,
    pub stretch_factor: f64,
    pub y_axis: AxisSpec,
    pub secondary_y_axis: Option<AxisSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelLayoutRegion {
    pub panel: Panel,
    pub plot_top: f64,
    pub plot_bottom: f64,
}

impl PanelLayoutRegion {
    #[must_use]
    pub fn height(self) -> f64 {
        (self.plot_bottom - self.plot_top).max(0.0)
    }
}

/// Ordered panels of one figure, top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelStack {
    figure: Figure,
    panels: Vec<PanelDescriptor>,
}

impl PanelStack {
    /// The hourly figure: flows over categories over outages.
    #[must_use]
    pub fn hourly() -> Self {
        Self {
            figure: Figure::Hourly,
            panels: vec![
                PanelDescriptor {
                    panel: Panel::Flow,
                    stretch_factor: 1.0,
                    y_axis: axis("Flows (MW)", None),
                    secondary_y_axis: Some(axis("ShadowPrice ($)", None)),
                },
                PanelDescriptor {
                    panel: Panel::Category,
                    stretch_factor: 1.0,
                    y_axis: axis("Flows (MW)", Some(Panel::Flow)),
                    secondary_y_axis: None,
                },
                PanelDescriptor {
                    panel: Panel::Outage,
                    stretch_factor: 1.0,
                    y_axis: axis("Redirected flow (MW)", None),
                    secondary_y_axis: None,
                },
            ],
        }
    }

    #[must_use]
    pub fn shadow_price_history() -> Self {
        Self {
            figure: Figure::ShadowPriceHistory,
            panels: vec![PanelDescriptor {
                panel: Panel::ShadowpriceHistory,
                stretch_factor: 1.0,
                y_axis: axis("ShadowPrice ($)", None),
                secondary_y_axis: None,
            }],
        }
    }

    #[must_use]
    pub fn load() -> Self {
        Self::single(Figure::Load, Panel::Load, "Demand (MW)")
    }

    #[must_use]
    pub fn wind() -> Self {
        Self::single(Figure::Wind, Panel::Wind, "Wind (MW)")
    }

    fn single(figure: Figure, panel: Panel, y_title: &str) -> Self {
        Self {
            figure,
            panels: vec![PanelDescriptor {
                panel,
                stretch_factor: 1.0,
                y_axis: axis(y_title, None),
                secondary_y_axis: None,
            }],
        }
    }

    #[must_use]
    pub fn figure(&self) -> Figure {
        self.figure
    }

    #[must_use]
    pub fn panels(&self) -> &[PanelDescriptor] {
        &self.panels
    }

    #[must_use]
    pub fn contains(&self, panel: Panel) -> bool {
        self.panels.iter().any(|descriptor| descriptor.panel == panel)
    }

    pub fn set_stretch_factor(&mut self, panel: Panel, stretch_factor: f64) -> PostMortemResult<bool> {
        validate_stretch_factor(stretch_factor)?;
        let Some(descriptor) = self.panels.iter_mut().find(|d| d.panel == panel) else {
            return Ok(false);
        };
        descriptor.stretch_factor = stretch_factor;
        Ok(true)
    }

    /// Splits `[plot_top, plot_bottom]` between panels by stretch factor.
    ///
    /// Regions are contiguous and the last one always ends on `plot_bottom`.
    #[must_use]
    pub fn layout_regions(&self, plot_top: f64, plot_bottom: f64) -> Vec<PanelLayoutRegion> {
        if self.panels.is_empty() {
            return Vec::new();
        }

        let safe_top = if plot_top.is_finite() {
            plot_top.max(0.0)
        } else {
            0.0
        };
        let safe_bottom = if plot_bottom.is_finite() {
            plot_bottom.max(safe_top)
        } else {
            safe_top
        };
        let total_height = safe_bottom - safe_top;

        let mut weights: Vec<f64> = self
            .panels
            .iter()
            .map(|d| {
                if d.stretch_factor.is_finite() && d.stretch_factor > 0.0 {
                    d.stretch_factor
                } else {
                    0.0
                }
            })
            .collect();
        let weight_sum: f64 = weights.iter().sum();
        if !weight_sum.is_finite() || weight_sum <= 0.0 {
            weights.fill(1.0 / self.panels.len() as f64);
        } else {
            for weight in &mut weights {
                *weight /= weight_sum;
            }
        }

        let mut regions = Vec::with_capacity(self.panels.len());
        let mut cursor = safe_top;
        let last_index = self.panels.len() - 1;
        for (index, descriptor) in self.panels.iter().enumerate() {
            let next_bottom = if index == last_index {
                safe_bottom
            } else {
                (cursor + total_height * weights[index]).clamp(cursor, safe_bottom)
            };
            regions.push(PanelLayoutRegion {
                panel: descriptor.panel,
                plot_top: cursor,
                plot_bottom: next_bottom,
            });
            cursor = next_bottom;
        }
        regions
    }
}

fn axis(title: &str, matches: Option<Panel>) -> AxisSpec {
    AxisSpec {
        title: title.to_owned(),
        matches,
    }
}

fn validate_stretch_factor(stretch_factor: f64) -> PostMortemResult<()> {
    if !stretch_factor.is_finite() || stretch_factor <= 0.0 {
        return Err(PostMortemError::InvalidData(
            "panel stretch factor must be finite and > 0".to_owned(),
        ));
    }
    Ok(())
}
