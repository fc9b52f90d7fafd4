mod support;

use chrono::NaiveDate;
use postmortem_rs::core::{
    CanonicalConstraintId, DateWindow, Figure, Panel, PoolId, ScenarioId, Visibility,
};
use postmortem_rs::query;
use postmortem_rs::render::NullRenderer;
use postmortem_rs::warehouse::FixtureWarehouse;
use postmortem_rs::{DashboardConfig, PostMortemDashboard, PostMortemError, SelectionEvent};
use support::{
    FIRST_PRIORITY, MAIN_CONSTRAINT, POOL, SECOND_SCENARIO, binding_summary_result,
    categories_result, flows_result, history_result, hour_ending, identity_result, load_result,
    outages_result, post_mortem_result, scenario, scenario_ids_result, wind_result,
};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).expect("valid date")
}

fn config() -> DashboardConfig {
    DashboardConfig::new(
        PoolId::new(POOL),
        CanonicalConstraintId::new(MAIN_CONSTRAINT),
        DateWindow::new(date(3, 1), date(6, 30)).expect("window"),
        vec![
            scenario(FIRST_PRIORITY),
            scenario(SECOND_SCENARIO),
            scenario("ERCOT_1YA_S1"),
            scenario("ERCOT_RETIRED_Scenario"),
        ],
        scenario(FIRST_PRIORITY),
    )
    .with_shadow_price_factor_scenarios(vec![scenario(FIRST_PRIORITY), scenario(SECOND_SCENARIO)])
    .with_history_scenarios(vec![scenario("ERCOT_1YA_S1")])
    .with_query_tag(Some("NERD_MONKEY".to_owned()))
}

fn warehouse() -> FixtureWarehouse {
    FixtureWarehouse::new()
        .with_response(
            query::IDENTITY_MAPPING,
            identity_result(&[
                (MAIN_CONSTRAINT, 812, 40),
                (MAIN_CONSTRAINT, 799, 40),
                (MAIN_CONSTRAINT, 805, 41),
            ]),
        )
        .with_response(
            query::SCENARIO_IDS,
            scenario_ids_result(&[
                (FIRST_PRIORITY, 12),
                (SECOND_SCENARIO, 11),
                ("ERCOT_1YA_S1", 31),
            ]),
        )
        .with_response(
            query::SCENARIO_IDS,
            scenario_ids_result(&[(FIRST_PRIORITY, 12), (SECOND_SCENARIO, 11)]),
        )
        .with_response(query::SCENARIO_IDS, scenario_ids_result(&[("ERCOT_1YA_S1", 31)]))
        .with_response(
            query::SHADOW_PRICE_HISTORY,
            history_result(&[(MAIN_CONSTRAINT, 799, 1, -250.0, Some(80.0))]),
        )
        .with_response(
            query::FLOWS,
            flows_result(&[
                (FIRST_PRIORITY, hour_ending(1, 1), 799, 310.0, 450.0),
                (FIRST_PRIORITY, hour_ending(1, 2), 799, 305.0, 450.0),
                (SECOND_SCENARIO, hour_ending(1, 1), 799, 120.0, 450.0),
            ]),
        )
        .with_response(
            query::CATEGORIES,
            categories_result(&[
                (FIRST_PRIORITY, 12, hour_ending(1, 1), -42.0),
                (SECOND_SCENARIO, 11, hour_ending(1, 1), 8.0),
            ]),
        )
        .with_response(
            query::OUTAGES,
            outages_result(&[
                (FIRST_PRIORITY, 1, 799, "LINE_A", 88.0),
                (SECOND_SCENARIO, 1, 799, "LINE_B", -12.0),
            ]),
        )
        .with_response(
            query::BINDING_SUMMARY,
            binding_summary_result(&[("SP_DA", 5_000.0, 4)]),
        )
}

#[test]
fn build_runs_every_stage_in_order() {
    let mut warehouse = warehouse();
    let build = PostMortemDashboard::build(&mut warehouse, &config()).expect("build");

    assert_eq!(
        warehouse.executed_labels(),
        vec![
            query::IDENTITY_MAPPING,
            query::SCENARIO_IDS,
            query::SCENARIO_IDS,
            query::SCENARIO_IDS,
            query::SHADOW_PRICE_HISTORY,
            query::FLOWS,
            query::CATEGORIES,
            query::OUTAGES,
        ]
    );
    assert!(warehouse
        .executed()
        .iter()
        .all(|script| script.statements()[0].contains("QUERY_TAG = 'NERD_MONKEY'")));

    assert_eq!(build.identity.raw_id_list(), "799,805");
    assert_eq!(
        build.flow_scenarios.ids(),
        vec![ScenarioId::new(11), ScenarioId::new(12), ScenarioId::new(31)]
    );
    assert_eq!(
        build.flow_scenarios.unresolved(),
        vec![scenario("ERCOT_RETIRED_Scenario")]
    );
    assert_eq!(build.binding_summary, None);
    assert_eq!(build.default_breakdown, Some(scenario(FIRST_PRIORITY)));
    assert_eq!(build.initial_visibility.len(), build.layers.len());
}

#[test]
fn resolved_flow_scenarios_without_data_still_get_layers() {
    let mut warehouse = warehouse();
    let build = PostMortemDashboard::build(&mut warehouse, &config()).expect("build");
    let flow_scenarios = build.layers.scenarios_in(Panel::Flow);
    assert_eq!(
        flow_scenarios,
        vec![
            scenario(FIRST_PRIORITY),
            scenario(SECOND_SCENARIO),
            scenario("ERCOT_1YA_S1"),
        ]
    );
    assert!(!flow_scenarios.contains(&scenario("ERCOT_RETIRED_Scenario")));
}

#[test]
fn initial_vector_shows_first_priority_and_default_breakdown() {
    let mut warehouse = warehouse();
    let build = PostMortemDashboard::build(&mut warehouse, &config()).expect("build");
    let vector = build.initial_vector().expect("vector");

    for layer in build.layers.iter() {
        let state = vector.get(layer.id).expect("state");
        let expected = match layer.panel {
            Panel::Flow if layer.scenario.as_ref() == Some(&scenario(FIRST_PRIORITY)) => {
                Visibility::Visible
            }
            Panel::Flow => Visibility::LegendOnly,
            Panel::Category | Panel::Outage
                if layer.scenario.as_ref() == Some(&scenario(FIRST_PRIORITY)) =>
            {
                Visibility::Visible
            }
            Panel::Category | Panel::Outage => Visibility::Hidden,
            Panel::ShadowpriceHistory | Panel::Load | Panel::Wind => continue,
        };
        assert_eq!(state, expected, "layer {}", layer.name);
    }
}

#[test]
fn ftr_window_adds_the_binding_summary_stage() {
    let mut warehouse = warehouse();
    let config = config()
        .with_ftr_window(Some(DateWindow::new(date(6, 1), date(6, 30)).expect("ftr window")));
    let build = PostMortemDashboard::build(&mut warehouse, &config).expect("build");
    assert_eq!(
        warehouse.executed_labels().last(),
        Some(&query::BINDING_SUMMARY)
    );
    let summary = build.binding_summary.expect("summary");
    assert_eq!(summary.get("SP_DA").expect("row").total_display(), "$5,000");
}

#[test]
fn empty_history_list_skips_its_resolution() {
    let mut warehouse = warehouse();
    let config = config().with_history_scenarios(Vec::new());
    PostMortemDashboard::build(&mut warehouse, &config).expect("build");
    let resolutions = warehouse
        .executed_labels()
        .into_iter()
        .filter(|label| *label == query::SCENARIO_IDS)
        .count();
    assert_eq!(resolutions, 2);
}

#[test]
fn failing_stage_fails_the_build() {
    let mut warehouse = warehouse().with_failure(query::CATEGORIES, "warehouse suspended");
    let err = PostMortemDashboard::build(&mut warehouse, &config()).expect_err("failure");
    assert!(matches!(
        err,
        PostMortemError::UpstreamQuery { ref script, .. } if script == query::CATEGORIES
    ));
    assert_eq!(warehouse.executed_labels().last(), Some(&query::CATEGORIES));
}

#[test]
fn invalid_config_fails_before_any_query() {
    let mut warehouse = warehouse();
    let mut config = config();
    config.first_priority = scenario("MISO_1DA_Default");
    let err = PostMortemDashboard::build(&mut warehouse, &config).expect_err("invalid");
    assert!(matches!(err, PostMortemError::InvalidConfig(_)));
    assert!(warehouse.executed().is_empty());
}

#[test]
fn build_hands_off_to_a_chart_assembler() {
    let mut warehouse = warehouse();
    let build = PostMortemDashboard::build(&mut warehouse, &config()).expect("build");
    let layer_count = build.layers.len();
    let mut assembler = build.into_assembler(NullRenderer::default()).expect("assembler");
    assembler.render().expect("render");
    assembler
        .dispatch(&SelectionEvent::ScenarioSelected(scenario(SECOND_SCENARIO)))
        .expect("dispatch");

    let renderer = assembler.into_renderer();
    assert_eq!(renderer.render_count, 2);
    assert_eq!(renderer.last_layer_count, layer_count);
    let frame = renderer.last_frame.expect("frame");
    let outage_drawn: Vec<&str> = frame
        .layers
        .iter()
        .filter(|layer| layer.panel == Panel::Outage && layer.visibility.is_drawn())
        .map(|layer| layer.name.as_str())
        .collect();
    assert_eq!(outage_drawn, vec![SECOND_SCENARIO, "LINE_B"]);
}

#[test]
fn grid_context_and_post_mortem_scenarios_add_their_stages() {
    let mut warehouse = warehouse()
        .with_response(
            query::LOAD,
            load_result(&[
                (FIRST_PRIORITY, "TOTAL", hour_ending(1, 1), 41_300.0),
                (SECOND_SCENARIO, "TOTAL", hour_ending(1, 1), 40_100.0),
            ]),
        )
        .with_response(
            query::WIND,
            wind_result(&[(FIRST_PRIORITY, hour_ending(1, 1), 8_450.0)]),
        )
        .with_response(
            query::POST_MORTEM,
            post_mortem_result(&[(MAIN_CONSTRAINT, -48_210, Some(12_000), None)]),
        );
    let config = config()
        .with_grid_context(true)
        .with_post_mortem_scenarios(vec![scenario(FIRST_PRIORITY), scenario(SECOND_SCENARIO)]);
    let build = PostMortemDashboard::build(&mut warehouse, &config).expect("build");

    let labels = warehouse.executed_labels();
    assert_eq!(
        &labels[labels.len() - 3..],
        &[query::LOAD, query::WIND, query::POST_MORTEM]
    );
    assert!(warehouse.executed()[labels.len() - 3]
        .text()
        .contains("'ERCOT_1DA_Default', 'ERCOT_1MA_Default', 'ERCOT_1YA_S1'"));

    assert_eq!(build.series.load.len(), 2);
    assert_eq!(build.series.wind.len(), 1);
    assert_eq!(build.layers.in_panel(Panel::Load).count(), 2);
    assert_eq!(build.layers.in_panel(Panel::Wind).count(), 1);
    let table = build.post_mortem.as_ref().expect("post-mortem table");
    assert_eq!(table.rows[0].sp_day_ahead, -48_210);

    let frame = build.into_assembler(NullRenderer::default()).expect("assembler").frame();
    let load = frame.figure(Figure::Load).expect("load figure");
    assert_eq!(load.title, "Demand TOTAL Over Time by Scenario");
    assert!(frame.figure(Figure::Wind).is_some());
}

#[test]
fn grid_context_is_off_by_default() {
    let mut warehouse = warehouse();
    let build = PostMortemDashboard::build(&mut warehouse, &config()).expect("build");
    assert!(!warehouse.executed_labels().contains(&query::LOAD));
    assert!(build.series.load.is_empty());
    assert!(build.series.wind.is_empty());
    assert_eq!(build.post_mortem, None);
}
