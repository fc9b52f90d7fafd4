use chrono::NaiveDateTime;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::{LayerId, Panel, ScenarioName};

/// Display state of one layer.
///
/// Serialized the way chart hosts expect it: `true`, `false` or
/// `"legendonly"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    Visible,
    /// Present and selectable in the legend, not drawn until toggled.
    LegendOnly,
    #[default]
    Hidden,
}

impl Visibility {
    #[must_use]
    pub const fn from_flag(visible: bool) -> Self {
        if visible { Self::Visible } else { Self::Hidden }
    }

    #[must_use]
    pub const fn is_drawn(self) -> bool {
        matches!(self, Self::Visible)
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Visible => serializer.serialize_bool(true),
            Self::Hidden => serializer.serialize_bool(false),
            Self::LegendOnly => serializer.serialize_str("legendonly"),
        }
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VisibilityVisitor;

        impl Visitor<'_> for VisibilityVisitor {
            type Value = Visibility;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a boolean or \"legendonly\"")
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Visibility, E> {
                Ok(Visibility::from_flag(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Visibility, E> {
                if value == "legendonly" {
                    Ok(Visibility::LegendOnly)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(value), &self))
                }
            }
        }

        deserializer.deserialize_any(VisibilityVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Line,
    Fill,
    Bar,
    Marker,
}

/// Generation-category breakdown, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Hydro,
    Wind,
    Load,
    Solar,
    OtherUnits,
    Interchange,
    Geothermal,
    IndustrialLoad,
}

impl Category {
    pub const ORDERED: [Category; 8] = [
        Category::Hydro,
        Category::Wind,
        Category::Load,
        Category::Solar,
        Category::OtherUnits,
        Category::Interchange,
        Category::Geothermal,
        Category::IndustrialLoad,
    ];

    /// Column label used both in result sets and in layer names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hydro => "HYDRO",
            Self::Wind => "WIND",
            Self::Load => "LOAD",
            Self::Solar => "SOLAR",
            Self::OtherUnits => "OTHERS_UNITS",
            Self::Interchange => "IE",
            Self::Geothermal => "GEO",
            Self::IndustrialLoad => "INDL_LOAD",
        }
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Hydro => "lightblue",
            Self::Wind => "lightgreen",
            Self::Load => "lightpink",
            Self::Solar => "orange",
            Self::OtherUnits => "lightgrey",
            Self::Interchange => "purple",
            Self::Geothermal => "brown",
            Self::IndustrialLoad => "#d62728",
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Sign partition used by stacked and split layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackSide {
    Negative,
    Positive,
}

impl StackSide {
    /// Clamps a contribution onto this side of zero.
    #[must_use]
    pub fn clamp(self, value: f64) -> f64 {
        match self {
            Self::Negative => value.min(0.0),
            Self::Positive => value.max(0.0),
        }
    }
}

/// Which constraints the historical shadow-price panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintScope {
    MainConstraint,
    All,
}

impl ConstraintScope {
    pub const ORDERED: [ConstraintScope; 2] = [ConstraintScope::MainConstraint, ConstraintScope::All];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MainConstraint => "Main Constraint",
            Self::All => "All",
        }
    }
}

/// What a layer represents inside its panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum LayerRole {
    Flow,
    SimulatedShadowPrice,
    MinLimit,
    MaxLimit,
    DayAheadShadowPrice,
    RealTimeShadowPrice,
    CategoryContribution { category: Category, side: StackSide },
    CategoryFlowOverlay,
    OutageHoverAnchor,
    OutageRedirect {
        equipment: String,
        side: StackSide,
        /// Largest absolute redirected flow drawn by this layer.
        peak_magnitude: f64,
    },
    HistoryColumn { column: String, scope: ConstraintScope },
    ZoneDemand { zone: String },
    WindGeneration,
}

impl LayerRole {
    #[must_use]
    pub fn outage_peak(&self) -> Option<f64> {
        match self {
            Self::OutageRedirect { peak_magnitude, .. } => Some(*peak_magnitude),
            _ => None,
        }
    }

    #[must_use]
    pub fn load_zone(&self) -> Option<&str> {
        match self {
            Self::ZoneDemand { zone } => Some(zone),
            _ => None,
        }
    }

    #[must_use]
    pub fn history_scope(&self) -> Option<ConstraintScope> {
        match self {
            Self::HistoryColumn { scope, .. } => Some(*scope),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPoint {
    pub time: NaiveDateTime,
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
}

impl LayerPoint {
    #[must_use]
    pub fn new(time: NaiveDateTime, value: Option<f64>) -> Self {
        Self {
            time,
            value,
            hover: None,
        }
    }

    #[must_use]
    pub fn with_hover(mut self, hover: String) -> Self {
        self.hover = Some(hover);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub color: Option<String>,
    pub legend_group: Option<String>,
    pub show_legend: bool,
    pub secondary_axis: bool,
    pub stack_group: Option<StackSide>,
}

/// A renderable series before it is given its `LayerId`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDraft {
    name: String,
    panel: Panel,
    kind: LayerKind,
    role: LayerRole,
    scenario: Option<ScenarioName>,
    default_visibility: Visibility,
    style: LayerStyle,
    points: Vec<LayerPoint>,
}

impl LayerDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, panel: Panel, kind: LayerKind, role: LayerRole) -> Self {
        Self {
            name: name.into(),
            panel,
            kind,
            role,
            scenario: None,
            default_visibility: Visibility::Visible,
            style: LayerStyle {
                show_legend: true,
                ..LayerStyle::default()
            },
            points: Vec::new(),
        }
    }

    #[must_use]
    pub fn scenario(mut self, scenario: &ScenarioName) -> Self {
        self.scenario = Some(scenario.clone());
        self
    }

    #[must_use]
    pub fn default_visibility(mut self, visibility: Visibility) -> Self {
        self.default_visibility = visibility;
        self
    }

    #[must_use]
    pub fn style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn points(mut self, points: Vec<LayerPoint>) -> Self {
        self.points = points;
        self
    }
}

/// Renderable unit. Only its visibility changes during a session, and that
/// state lives in a `VisibilityVector`, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub panel: Panel,
    pub kind: LayerKind,
    pub role: LayerRole,
    pub scenario: Option<ScenarioName>,
    pub default_visibility: Visibility,
    pub style: LayerStyle,
    pub points: Vec<LayerPoint>,
}

/// Creation-ordered layers of one dashboard build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerList {
    layers: Vec<Layer>,
}

impl LayerList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, draft: LayerDraft) -> LayerId {
        let id = LayerId::new(self.layers.len() as u32);
        self.layers.push(Layer {
            id,
            name: draft.name,
            panel: draft.panel,
            kind: draft.kind,
            role: draft.role,
            scenario: draft.scenario,
            default_visibility: draft.default_visibility,
            style: draft.style,
            points: draft.points,
        });
        id
    }

    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.index()).filter(|layer| layer.id == id)
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn in_panel(&self, panel: Panel) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(move |layer| layer.panel == panel)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Distinct scenarios with at least one layer in `panel`, in layer order.
    #[must_use]
    pub fn scenarios_in(&self, panel: Panel) -> Vec<ScenarioName> {
        let mut scenarios: Vec<ScenarioName> = Vec::new();
        for layer in self.in_panel(panel) {
            if let Some(scenario) = &layer.scenario {
                if !scenarios.contains(scenario) {
                    scenarios.push(scenario.clone());
                }
            }
        }
        scenarios
    }
}
