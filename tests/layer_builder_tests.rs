mod support;

use approx::assert_relative_eq;
use postmortem_rs::api::{LayerBuilder, SeriesBundle};
use postmortem_rs::core::{
    Category, ConstraintScope, LayerKind, LayerRole, Panel, StackSide, TimeSeriesTable,
    Visibility,
};
use postmortem_rs::{SelectionEvent, VisibilityEngine};
use support::{
    FIRST_PRIORITY, SECOND_SCENARIO, grid_series, outage_row, sample_builder, sample_layers,
    sample_series, scenario,
};

#[test]
fn panels_own_contiguous_id_ranges_in_build_order() {
    let layers = sample_layers();
    assert_eq!(layers.len(), 55);
    assert_eq!(layers.in_panel(Panel::Flow).count(), 10);
    assert_eq!(layers.in_panel(Panel::Category).count(), 34);
    assert_eq!(layers.in_panel(Panel::Outage).count(), 5);
    assert_eq!(layers.in_panel(Panel::ShadowpriceHistory).count(), 6);

    let panels: Vec<Panel> = layers.iter().map(|layer| layer.panel).collect();
    let mut sorted = panels.clone();
    sorted.sort();
    assert_eq!(panels, sorted);
    for (index, layer) in layers.iter().enumerate() {
        assert_eq!(layer.id.index(), index);
    }
}

#[test]
fn first_priority_scenario_gets_market_areas_and_full_visibility() {
    let layers = sample_layers();
    let flow: Vec<_> = layers.in_panel(Panel::Flow).collect();

    let names: Vec<&str> = flow.iter().map(|layer| layer.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            FIRST_PRIORITY,
            "SP_ERCOT_1DA_Default",
            "MINLIMIT_ERCOT_1DA_Default",
            "MAXLIMIT_ERCOT_1DA_Default",
            "SP_DA",
            "SP_RT",
            SECOND_SCENARIO,
            "SP_ERCOT_1MA_Default",
            "MINLIMIT_ERCOT_1MA_Default",
            "MAXLIMIT_ERCOT_1MA_Default",
        ]
    );
    assert!(flow[..6]
        .iter()
        .all(|layer| layer.default_visibility == Visibility::Visible
            && layer.scenario == Some(scenario(FIRST_PRIORITY))));
    assert!(flow[6..]
        .iter()
        .all(|layer| layer.default_visibility == Visibility::LegendOnly));

    let market_roles = flow
        .iter()
        .filter(|layer| {
            matches!(
                layer.role,
                LayerRole::DayAheadShadowPrice | LayerRole::RealTimeShadowPrice
            )
        })
        .count();
    assert_eq!(market_roles, 2);
    assert!(flow[1].style.secondary_axis);
    assert_eq!(flow[0].points[0].value, Some(310.0));
}

#[test]
fn first_priority_without_flow_data_gets_no_market_areas() {
    let series = sample_series();
    let layers = LayerBuilder::new(scenario("ERCOT_2DA_Default"), support::main_constraint())
        .build(&series, &[scenario(FIRST_PRIORITY), scenario(SECOND_SCENARIO)]);
    assert_eq!(layers.in_panel(Panel::Flow).count(), 8);
    assert!(layers
        .in_panel(Panel::Flow)
        .all(|layer| layer.default_visibility == Visibility::LegendOnly));
}

#[test]
fn category_layers_stack_negative_then_positive_per_category() {
    let layers = sample_layers();
    let category: Vec<_> = layers.in_panel(Panel::Category).collect();

    assert_eq!(category[0].name, "HYDRO_1DA_Default");
    assert_eq!(
        category[0].role,
        LayerRole::CategoryContribution {
            category: Category::Hydro,
            side: StackSide::Negative
        }
    );
    assert!(category[0].style.show_legend);
    assert_eq!(category[1].name, "HYDRO_1DA_Default");
    assert!(!category[1].style.show_legend);
    assert_eq!(category[1].style.stack_group, Some(StackSide::Positive));
    assert_eq!(category[14].name, "INDL_LOAD_1DA_Default");

    // hydro impact 10 is clamped to 0 on the negative side
    assert_eq!(category[0].points[0].value, Some(0.0));
    assert_eq!(category[1].points[0].value, Some(10.0));
    // wind impact -20 is clamped to 0 on the positive side
    assert_eq!(category[2].points[0].value, Some(-20.0));
    assert_eq!(category[3].points[0].value, Some(0.0));

    assert_eq!(category[16].role, LayerRole::CategoryFlowOverlay);
    assert_eq!(category[16].kind, LayerKind::Line);
    assert_eq!(category[16].points.len(), 2);
}

#[test]
fn only_the_default_breakdown_scenario_starts_visible() {
    let layers = sample_layers();
    for layer in layers.in_panel(Panel::Category).chain(layers.in_panel(Panel::Outage)) {
        let expected = if layer.scenario == Some(scenario(FIRST_PRIORITY)) {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        assert_eq!(layer.default_visibility, expected, "layer {}", layer.name);
    }
}

#[test]
fn explicit_default_breakdown_overrides_sort_order() {
    let layers = sample_builder()
        .with_default_breakdown(Some(scenario(SECOND_SCENARIO)))
        .build(&sample_series(), &[scenario(FIRST_PRIORITY)]);
    let visible: Vec<_> = layers
        .in_panel(Panel::Category)
        .filter(|layer| layer.default_visibility == Visibility::Visible)
        .map(|layer| layer.scenario.clone())
        .collect();
    assert_eq!(visible.len(), 17);
    assert!(visible.iter().all(|s| *s == Some(scenario(SECOND_SCENARIO))));
}

#[test]
fn outage_layers_start_with_anchor_and_order_equipment_by_flow() {
    let layers = sample_layers();
    let outage: Vec<_> = layers.in_panel(Panel::Outage).collect();

    assert_eq!(outage[0].role, LayerRole::OutageHoverAnchor);
    assert_eq!(outage[0].kind, LayerKind::Marker);
    assert!(!outage[0].style.show_legend);
    assert_eq!(outage[0].points.len(), 2);
    assert_eq!(outage[0].points[0].hover.as_deref(), Some(FIRST_PRIORITY));

    assert_eq!(outage[1].name, "LINE_A");
    assert_relative_eq!(outage[1].role.outage_peak().unwrap_or_default(), 120.4);
    assert_eq!(outage[1].points.len(), 2);
    assert_eq!(outage[1].points[0].value, Some(120.0));

    assert_eq!(outage[2].name, "LINE_B");
    assert!(matches!(
        outage[2].role,
        LayerRole::OutageRedirect {
            side: StackSide::Negative,
            ..
        }
    ));
    assert_relative_eq!(outage[2].role.outage_peak().unwrap_or_default(), 45.6);

    // LINE_C redirects less than 1 MW and gets no layer
    assert!(outage.iter().all(|layer| layer.name != "LINE_C"));
    assert_eq!(outage[3].scenario, Some(scenario(SECOND_SCENARIO)));
}

#[test]
fn equipment_on_both_sides_gets_two_layers() {
    let mut series = sample_series();
    series.outages = TimeSeriesTable::from_records(vec![
        outage_row(FIRST_PRIORITY, 1, "XFMR_1", 55.0),
        outage_row(FIRST_PRIORITY, 2, "XFMR_1", -70.0),
    ]);
    let layers = sample_builder().build(&series, &[]);
    let outage: Vec<_> = layers.in_panel(Panel::Outage).collect();
    assert_eq!(outage.len(), 3);
    assert_relative_eq!(outage[1].role.outage_peak().unwrap_or_default(), 55.0);
    assert_relative_eq!(outage[2].role.outage_peak().unwrap_or_default(), 70.0);
}

#[test]
fn scenario_without_a_bar_of_one_megawatt_gets_no_outage_layers() {
    let mut series = sample_series();
    series.outages =
        TimeSeriesTable::from_records(vec![outage_row(FIRST_PRIORITY, 1, "LINE_C", 0.4)]);
    let builder = sample_builder();
    assert_eq!(
        builder.resolved_default_breakdown(&series),
        Some(scenario(FIRST_PRIORITY))
    );
    let layers = builder.build(&series, &[]);
    assert_eq!(layers.in_panel(Panel::Outage).count(), 0);

    let engine = VisibilityEngine::new(&layers);
    let initial = engine.initial_vector();
    assert_eq!(engine.outage_threshold_domain(&initial), None);
    assert!(initial.drawn_in(&layers, Panel::Outage).is_empty());
}

#[test]
fn history_layers_split_main_constraint_from_all_constraints() {
    let layers = sample_layers();
    let history: Vec<_> = layers.in_panel(Panel::ShadowpriceHistory).collect();
    let names: Vec<&str> = history.iter().map(|layer| layer.name.as_str()).collect();
    assert_eq!(names, vec!["SP_DA", "SP_RT", "SC_1MA", "SP_DA", "SP_RT", "SC_1MA"]);

    let defaults: Vec<Visibility> = history.iter().map(|layer| layer.default_visibility).collect();
    assert_eq!(
        defaults,
        vec![
            Visibility::Visible,
            Visibility::LegendOnly,
            Visibility::LegendOnly,
            Visibility::Hidden,
            Visibility::Hidden,
            Visibility::Hidden,
        ]
    );

    assert_eq!(history[0].role.history_scope(), Some(ConstraintScope::MainConstraint));
    assert_eq!(history[0].points.len(), 1);
    assert_eq!(history[0].points[0].value, Some(250.0));
    assert_eq!(history[0].style.color.as_deref(), Some("#D62728"));

    // the sibling constraint has no SP_RT value, which reads as 0
    assert_eq!(history[4].points.len(), 2);
    assert_eq!(history[4].points[0].value, Some(0.0));
}

#[test]
fn empty_series_build_only_requested_flow_layers() {
    let layers = sample_builder().build(&SeriesBundle::default(), &[scenario(FIRST_PRIORITY)]);
    assert_eq!(layers.len(), 6);
    assert!(layers.iter().all(|layer| layer.points.is_empty()));
    assert_eq!(
        LayerBuilder::breakdown_scenarios(&SeriesBundle::default()),
        Vec::new()
    );
}

#[test]
fn breakdown_scenarios_union_categories_and_outages() {
    let mut series = sample_series();
    series.outages = TimeSeriesTable::from_records(vec![outage_row("SPP_1DA_Default", 1, "X", 5.0)]);
    assert_eq!(
        LayerBuilder::breakdown_scenarios(&series),
        vec![
            scenario(FIRST_PRIORITY),
            scenario(SECOND_SCENARIO),
            scenario("SPP_1DA_Default"),
        ]
    );
}

#[test]
fn grid_layers_follow_history_one_line_per_scenario() {
    let layers = sample_builder().build(
        &grid_series(),
        &[scenario(FIRST_PRIORITY), scenario(SECOND_SCENARIO)],
    );
    assert_eq!(layers.len(), 59);
    let panels: Vec<Panel> = layers.iter().map(|layer| layer.panel).collect();
    let mut sorted = panels.clone();
    sorted.sort();
    assert_eq!(panels, sorted);

    let load: Vec<_> = layers.in_panel(Panel::Load).collect();
    let names: Vec<&str> = load.iter().map(|layer| layer.name.as_str()).collect();
    assert_eq!(names, vec![FIRST_PRIORITY, SECOND_SCENARIO]);
    assert!(load.iter().all(|layer| layer.kind == LayerKind::Line));
    assert_eq!(load[0].role.load_zone(), Some("TOTAL"));
    let demand: Vec<Option<f64>> = load[0].points.iter().map(|point| point.value).collect();
    assert_eq!(demand, vec![Some(41_300.0), Some(41_900.0)]);
    assert_eq!(load[0].points[0].hover.as_deref(), Some("Demand: 41300 MW"));

    let wind: Vec<_> = layers.in_panel(Panel::Wind).collect();
    assert_eq!(wind.len(), 2);
    assert_eq!(wind[0].role, LayerRole::WindGeneration);
    assert_eq!(wind[0].points[0].hover.as_deref(), Some("Wind: 8450 MW"));
}

#[test]
fn load_zone_filters_demand_and_drops_scenarios_without_it() {
    let layers = sample_builder().with_load_zone("WEST").build(
        &grid_series(),
        &[scenario(FIRST_PRIORITY), scenario(SECOND_SCENARIO)],
    );
    let load: Vec<_> = layers.in_panel(Panel::Load).collect();
    assert_eq!(load.len(), 1);
    assert_eq!(load[0].scenario, Some(scenario(SECOND_SCENARIO)));
    assert_eq!(
        load[0].role,
        LayerRole::ZoneDemand {
            zone: "WEST".to_owned()
        }
    );
    assert_eq!(load[0].points.len(), 1);
}

#[test]
fn grid_layers_stay_visible_through_scenario_selection() {
    let layers = sample_builder().build(
        &grid_series(),
        &[scenario(FIRST_PRIORITY), scenario(SECOND_SCENARIO)],
    );
    let engine = VisibilityEngine::new(&layers);
    let initial = engine.initial_vector();
    let next = engine
        .transition(
            &initial,
            &SelectionEvent::ScenarioSelected(scenario(SECOND_SCENARIO)),
        )
        .expect("transition");

    for layer in layers.in_panel(Panel::Load).chain(layers.in_panel(Panel::Wind)) {
        assert_eq!(layer.default_visibility, Visibility::Visible);
        assert_eq!(initial.get(layer.id), Some(Visibility::Visible));
        assert_eq!(next.get(layer.id), Some(Visibility::Visible));
    }
}
