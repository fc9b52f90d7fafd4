use chrono::{NaiveDateTime, NaiveTime};
use ordered_float::OrderedFloat;
use tracing::{debug, info};

use crate::core::{
    CanonicalConstraintId, Category, ConstraintScope, FlowRow, LayerDraft, LayerKind, LayerList,
    LayerPoint, LayerRole, LayerStyle, OutageRow, Panel, ScenarioName, StackSide,
    TOTAL_LOAD_ZONE, Visibility, pick_breakdown_target,
};

use super::SeriesBundle;

const DAY_AHEAD_FILL: &str = "rgba(255, 0, 0, 0.5)";
const REAL_TIME_FILL: &str = "rgba(0, 0, 255, 0.5)";
const CATEGORY_LEGEND_GROUP: &str = "Category";
const DAY_AHEAD_COLUMN: &str = "SP_DA";

const HISTORY_COLORS: [(&str, &str); 9] = [
    ("SP_DA", "#D62728"),
    ("SP_RT", "#17BECF"),
    ("SC_1MA", "#2ca02c"),
    ("SC_1YA_S1", "#FF6692"),
    ("SC_1YA_S2", "#19D3F3"),
    ("SC_1YA_S3", "#8C564B"),
    ("SC_1YA_S4", "#F39C12"),
    ("SC_1YA_S5", "#85929E"),
    ("SC_1YA_S6", "#F1948A"),
];

const PALETTE: [&str; 30] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52", "#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B",
    "#E377C2", "#7F7F7F", "#BCBD22", "#17BECF", "#A9CCE3", "#F1948A", "#76D7C4", "#D98880",
    "#F7DC6F", "#BB8FCE", "#82E0AA", "#85929E", "#F0B27A", "#5499C7",
];

/// Builds the creation-ordered layer list of one dashboard.
///
/// Panels are laid out one after another (flow, category, outage, history,
/// then the load and wind figures when their tables hold rows) and scenarios
/// are iterated in lexicographic order inside each panel, so layer ids are
/// deterministic and every panel owns a contiguous id range.
#[derive(Debug, Clone)]
pub struct LayerBuilder {
    first_priority: ScenarioName,
    default_breakdown: Option<ScenarioName>,
    main_constraint: CanonicalConstraintId,
    load_zone: String,
}

impl LayerBuilder {
    #[must_use]
    pub fn new(first_priority: ScenarioName, main_constraint: CanonicalConstraintId) -> Self {
        Self {
            first_priority,
            default_breakdown: None,
            main_constraint,
            load_zone: TOTAL_LOAD_ZONE.to_owned(),
        }
    }

    /// Zone drawn on the load figure.
    #[must_use]
    pub fn with_load_zone(mut self, zone: impl Into<String>) -> Self {
        self.load_zone = zone.into();
        self
    }

    /// Breakdown scenario shown first on the category and outage panels.
    /// Without one, the first breakdown scenario in sorted order is used.
    #[must_use]
    pub fn with_default_breakdown(mut self, scenario: Option<ScenarioName>) -> Self {
        self.default_breakdown = scenario;
        self
    }

    /// Sorted union of the scenarios present in the category and outage
    /// tables.
    #[must_use]
    pub fn breakdown_scenarios(series: &SeriesBundle) -> Vec<ScenarioName> {
        let mut scenarios = series.categories.scenarios();
        scenarios.extend(series.outages.scenarios());
        scenarios.sort();
        scenarios.dedup();
        scenarios
    }

    /// Default breakdown scenario actually used for `series`.
    #[must_use]
    pub fn resolved_default_breakdown(&self, series: &SeriesBundle) -> Option<ScenarioName> {
        self.default_breakdown
            .clone()
            .or_else(|| Self::breakdown_scenarios(series).into_iter().next())
    }

    /// `flow_scenarios` lists the resolved flow scenarios; scenarios without
    /// rows still get (empty) flow layers.
    #[must_use]
    pub fn build(&self, series: &SeriesBundle, flow_scenarios: &[ScenarioName]) -> LayerList {
        let mut layers = LayerList::new();
        let default_breakdown = self.resolved_default_breakdown(series);

        self.push_flow_layers(&mut layers, series, flow_scenarios);
        push_category_layers(&mut layers, series, default_breakdown.as_ref());
        push_outage_layers(&mut layers, series, default_breakdown.as_ref());
        self.push_history_layers(&mut layers, series);
        push_load_layers(&mut layers, series, &self.load_zone);
        push_wind_layers(&mut layers, series);

        info!(
            total = layers.len(),
            flow = layers.in_panel(Panel::Flow).count(),
            category = layers.in_panel(Panel::Category).count(),
            outage = layers.in_panel(Panel::Outage).count(),
            history = layers.in_panel(Panel::ShadowpriceHistory).count(),
            load = layers.in_panel(Panel::Load).count(),
            wind = layers.in_panel(Panel::Wind).count(),
            default_breakdown = default_breakdown.as_ref().map(ScenarioName::as_str),
            "layers built"
        );
        layers
    }

    fn push_flow_layers(
        &self,
        layers: &mut LayerList,
        series: &SeriesBundle,
        flow_scenarios: &[ScenarioName],
    ) {
        let mut scenarios = series.flows.scenarios();
        scenarios.extend(flow_scenarios.iter().cloned());
        scenarios.sort();
        scenarios.dedup();

        for scenario in &scenarios {
            let rows: Vec<&FlowRow> = series.flows.for_scenario(scenario).collect();
            let is_first = *scenario == self.first_priority;
            let visibility = if is_first {
                Visibility::Visible
            } else {
                Visibility::LegendOnly
            };
            let group = LayerStyle {
                legend_group: Some(scenario.to_string()),
                show_legend: true,
                ..LayerStyle::default()
            };

            layers.push(
                LayerDraft::new(scenario.as_str(), Panel::Flow, LayerKind::Line, LayerRole::Flow)
                    .scenario(scenario)
                    .default_visibility(visibility)
                    .style(group.clone())
                    .points(rows.iter().map(|row| flow_point(row)).collect()),
            );
            layers.push(
                LayerDraft::new(
                    format!("SP_{scenario}"),
                    Panel::Flow,
                    LayerKind::Fill,
                    LayerRole::SimulatedShadowPrice,
                )
                .scenario(scenario)
                .default_visibility(visibility)
                .style(LayerStyle {
                    secondary_axis: true,
                    ..group.clone()
                })
                .points(hourly(&rows, |row| row.sp_simulated)),
            );
            layers.push(
                LayerDraft::new(
                    format!("MINLIMIT_{scenario}"),
                    Panel::Flow,
                    LayerKind::Line,
                    LayerRole::MinLimit,
                )
                .scenario(scenario)
                .default_visibility(visibility)
                .style(group.clone())
                .points(hourly(&rows, |row| row.min_limit)),
            );
            layers.push(
                LayerDraft::new(
                    format!("MAXLIMIT_{scenario}"),
                    Panel::Flow,
                    LayerKind::Line,
                    LayerRole::MaxLimit,
                )
                .scenario(scenario)
                .default_visibility(visibility)
                .style(group.clone())
                .points(hourly(&rows, |row| row.max_limit)),
            );

            if is_first {
                layers.push(market_fill(
                    "SP_DA",
                    LayerRole::DayAheadShadowPrice,
                    DAY_AHEAD_FILL,
                    scenario,
                    &group,
                    hourly(&rows, |row| Some(row.sp_day_ahead)),
                ));
                layers.push(market_fill(
                    "SP_RT",
                    LayerRole::RealTimeShadowPrice,
                    REAL_TIME_FILL,
                    scenario,
                    &group,
                    hourly(&rows, |row| Some(row.sp_real_time)),
                ));
            }
        }
        debug!(scenarios = scenarios.len(), "flow layers pushed");
    }

    fn push_history_layers(&self, layers: &mut LayerList, series: &SeriesBundle) {
        let columns = series.history.value_columns();
        for scope in ConstraintScope::ORDERED {
            for (index, column) in columns.iter().enumerate() {
                let visibility = match scope {
                    ConstraintScope::MainConstraint if column == DAY_AHEAD_COLUMN => {
                        Visibility::Visible
                    }
                    ConstraintScope::MainConstraint => Visibility::LegendOnly,
                    ConstraintScope::All => Visibility::Hidden,
                };
                let points = series
                    .history
                    .rows()
                    .iter()
                    .filter(|row| {
                        scope == ConstraintScope::All || row.canonical == self.main_constraint
                    })
                    .map(|row| {
                        let value = row.value(column);
                        LayerPoint::new(row.month.and_time(NaiveTime::MIN), Some(value))
                            .with_hover(format!(
                                "PeakId: {} | SP: ${value:.2} | CTG: {}",
                                row.peak_id,
                                row.contingency.as_deref().unwrap_or("")
                            ))
                    })
                    .collect();

                layers.push(
                    LayerDraft::new(
                        column.as_str(),
                        Panel::ShadowpriceHistory,
                        LayerKind::Bar,
                        LayerRole::HistoryColumn {
                            column: column.clone(),
                            scope,
                        },
                    )
                    .default_visibility(visibility)
                    .style(LayerStyle {
                        color: Some(history_color(column, index).to_owned()),
                        legend_group: Some(column.clone()),
                        show_legend: true,
                        ..LayerStyle::default()
                    })
                    .points(points),
                );
            }
        }
    }
}

fn push_category_layers(
    layers: &mut LayerList,
    series: &SeriesBundle,
    default_breakdown: Option<&ScenarioName>,
) {
    let scenarios = series.categories.scenarios();
    let target = default_breakdown.and_then(|selected| pick_breakdown_target(&scenarios, selected));

    for scenario in &scenarios {
        let visibility = Visibility::from_flag(Some(scenario) == target);
        let rows: Vec<_> = series.categories.for_scenario(scenario).collect();

        for category in Category::ORDERED {
            let name = format!("{}_{}", category.label(), scenario.scenario_type());
            for side in [StackSide::Negative, StackSide::Positive] {
                let points = rows
                    .iter()
                    .map(|row| {
                        LayerPoint::new(
                            row.hour_ending,
                            row.impact(category).map(|value| side.clamp(value).round()),
                        )
                    })
                    .collect();
                layers.push(
                    LayerDraft::new(
                        name.as_str(),
                        Panel::Category,
                        LayerKind::Fill,
                        LayerRole::CategoryContribution { category, side },
                    )
                    .scenario(scenario)
                    .default_visibility(visibility)
                    .style(LayerStyle {
                        color: Some(category.color().to_owned()),
                        legend_group: Some(CATEGORY_LEGEND_GROUP.to_owned()),
                        show_legend: side == StackSide::Negative,
                        secondary_axis: false,
                        stack_group: Some(side),
                    })
                    .points(points),
                );
            }
        }

        let overlay: Vec<&FlowRow> = series.flows.for_scenario(scenario).collect();
        layers.push(
            LayerDraft::new(
                scenario.as_str(),
                Panel::Category,
                LayerKind::Line,
                LayerRole::CategoryFlowOverlay,
            )
            .scenario(scenario)
            .default_visibility(visibility)
            .style(LayerStyle {
                legend_group: Some(CATEGORY_LEGEND_GROUP.to_owned()),
                show_legend: true,
                ..LayerStyle::default()
            })
            .points(overlay.iter().map(|row| flow_point(row)).collect()),
        );
    }
}

fn push_outage_layers(
    layers: &mut LayerList,
    series: &SeriesBundle,
    default_breakdown: Option<&ScenarioName>,
) {
    for scenario in series.outages.scenarios() {
        let visibility = Visibility::from_flag(Some(&scenario) == default_breakdown);
        let mut rows: Vec<&OutageRow> = series.outages.for_scenario(&scenario).collect();

        rows.sort_by_key(|row| std::cmp::Reverse(OrderedFloat(row.avg_redirected_flow)));
        let bars = outage_bar_layers(&scenario, &rows, visibility);
        if bars.is_empty() {
            debug!(scenario = %scenario, "no redirected flow of at least 1 MW, no outage layers");
            continue;
        }

        let mut dates: Vec<_> = rows.iter().map(|row| row.date).collect();
        dates.sort_unstable();
        dates.dedup();
        layers.push(
            LayerDraft::new(
                scenario.as_str(),
                Panel::Outage,
                LayerKind::Marker,
                LayerRole::OutageHoverAnchor,
            )
            .scenario(&scenario)
            .default_visibility(visibility)
            .style(LayerStyle::default())
            .points(
                dates
                    .into_iter()
                    .map(|date| {
                        LayerPoint::new(date.and_time(NaiveTime::MIN), Some(0.0))
                            .with_hover(scenario.to_string())
                    })
                    .collect(),
            ),
        );
        for bar in bars {
            layers.push(bar);
        }
    }
}

/// One bar layer per equipment and side, positive side first, equipment in
/// the order of `rows` (descending flow).
fn outage_bar_layers(
    scenario: &ScenarioName,
    rows: &[&OutageRow],
    visibility: Visibility,
) -> Vec<LayerDraft> {
    let mut drafts = Vec::new();
    for side in [StackSide::Positive, StackSide::Negative] {
        let on_side: Vec<&OutageRow> = rows
            .iter()
            .copied()
            .filter(|row| match side {
                StackSide::Positive => row.avg_redirected_flow >= 1.0,
                StackSide::Negative => row.avg_redirected_flow <= -1.0,
            })
            .collect();
        let mut equipment: Vec<&str> = Vec::new();
        for row in &on_side {
            if !equipment.contains(&row.equipment.as_str()) {
                equipment.push(row.equipment.as_str());
            }
        }

        for key in equipment {
            let bars: Vec<&OutageRow> = on_side
                .iter()
                .copied()
                .filter(|row| row.equipment == key)
                .collect();
            let peak_magnitude = bars
                .iter()
                .map(|row| OrderedFloat(row.avg_redirected_flow.abs()))
                .max()
                .map_or(0.0, |peak| peak.0);
            drafts.push(
                LayerDraft::new(
                    key,
                    Panel::Outage,
                    LayerKind::Bar,
                    LayerRole::OutageRedirect {
                        equipment: key.to_owned(),
                        side,
                        peak_magnitude,
                    },
                )
                .scenario(scenario)
                .default_visibility(visibility)
                .style(LayerStyle {
                    legend_group: Some(key.to_owned()),
                    show_legend: false,
                    ..LayerStyle::default()
                })
                .points(bars.iter().map(|row| outage_point(row)).collect()),
            );
        }
    }
    drafts
}

/// One line per scenario with rows in `zone`, scenarios sorted.
fn push_load_layers(layers: &mut LayerList, series: &SeriesBundle, zone: &str) {
    for scenario in series.load.scenarios() {
        let points: Vec<LayerPoint> = series
            .load
            .for_scenario(&scenario)
            .filter(|row| row.zone == zone)
            .map(|row| megawatt_point(row.hour_ending, row.demand_mw, "Demand"))
            .collect();
        if points.is_empty() {
            continue;
        }
        layers.push(
            LayerDraft::new(
                scenario.as_str(),
                Panel::Load,
                LayerKind::Line,
                LayerRole::ZoneDemand {
                    zone: zone.to_owned(),
                },
            )
            .scenario(&scenario)
            .points(points),
        );
    }
}

fn push_wind_layers(layers: &mut LayerList, series: &SeriesBundle) {
    for scenario in series.wind.scenarios() {
        let points = series
            .wind
            .for_scenario(&scenario)
            .map(|row| megawatt_point(row.hour_ending, row.generation_mw, "Wind"))
            .collect();
        layers.push(
            LayerDraft::new(
                scenario.as_str(),
                Panel::Wind,
                LayerKind::Line,
                LayerRole::WindGeneration,
            )
            .scenario(&scenario)
            .points(points),
        );
    }
}

fn megawatt_point(hour_ending: NaiveDateTime, value: Option<f64>, label: &str) -> LayerPoint {
    LayerPoint::new(hour_ending, value).with_hover(format!(
        "{label}: {} MW",
        value.map_or_else(|| "n/a".to_owned(), |mw| format!("{mw:.0}"))
    ))
}

fn flow_point(row: &FlowRow) -> LayerPoint {
    let flow = row.flow.map(f64::round);
    LayerPoint::new(row.hour_ending, flow).with_hover(format!(
        "Flow: {}<br>Package ID: {}<br> {} → {}",
        flow.map_or_else(|| "n/a".to_owned(), |value| format!("{value:.0}")),
        row.package_version,
        row.from_bus.as_deref().unwrap_or(""),
        row.to_bus.as_deref().unwrap_or("")
    ))
}

fn outage_point(row: &OutageRow) -> LayerPoint {
    let value = row.avg_redirected_flow.round();
    let date_text = |date: Option<chrono::NaiveDate>| date.map_or_else(String::new, |d| d.to_string());
    LayerPoint::new(row.date.and_time(NaiveTime::MIN), Some(value)).with_hover(format!(
        "{}: {value:.0} <br> OutageID: {} <br> StartDate: {} <br> EndDate: {}",
        row.equipment,
        row.outage_id.map_or_else(String::new, |id| id.to_string()),
        date_text(row.start_date),
        date_text(row.end_date)
    ))
}

fn hourly(rows: &[&FlowRow], value: impl Fn(&FlowRow) -> Option<f64>) -> Vec<LayerPoint> {
    rows.iter()
        .map(|row| LayerPoint::new(row.hour_ending, value(*row)))
        .collect()
}

/// Market price fill drawn once, under the first-priority scenario.
fn market_fill(
    name: &str,
    role: LayerRole,
    color: &str,
    scenario: &ScenarioName,
    group: &LayerStyle,
    points: Vec<LayerPoint>,
) -> LayerDraft {
    LayerDraft::new(name, Panel::Flow, LayerKind::Fill, role)
        .scenario(scenario)
        .style(LayerStyle {
            color: Some(color.to_owned()),
            secondary_axis: true,
            ..group.clone()
        })
        .points(points)
}

fn history_color(column: &str, index: usize) -> &'static str {
    HISTORY_COLORS
        .iter()
        .find(|(key, _)| *key == column)
        .map_or(PALETTE[index % PALETTE.len()], |&(_, color)| color)
}
