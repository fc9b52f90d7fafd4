use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::core::{
    BindingSummary, LayerList, PostMortemTable, ResolvedIdentity, ResolvedScenarios,
    ScenarioName, TimeSeriesTable, Visibility, VisibilityVector,
};
use crate::error::PostMortemResult;
use crate::render::ChartRenderer;
use crate::warehouse::{QuerySession, Warehouse};

use super::{
    ChartAssembler, DashboardConfig, IdentityResolver, LayerBuilder, ScenarioResolver,
    SeriesBundle, SeriesRetriever, VisibilityEngine,
};

/// Everything one dashboard build produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardBuild {
    pub config: DashboardConfig,
    pub identity: ResolvedIdentity,
    pub flow_scenarios: ResolvedScenarios,
    pub shadow_price_factor_scenarios: ResolvedScenarios,
    pub history_scenarios: ResolvedScenarios,
    pub series: SeriesBundle,
    pub binding_summary: Option<BindingSummary>,
    /// Pool-wide table, present when post-mortem scenarios are configured.
    #[serde(default)]
    pub post_mortem: Option<PostMortemTable>,
    pub layers: LayerList,
    /// Positional projection of the initial vector.
    pub initial_visibility: Vec<Visibility>,
    pub default_breakdown: Option<ScenarioName>,
}

impl DashboardBuild {
    /// Initial vector keyed by layer id.
    pub fn initial_vector(&self) -> PostMortemResult<VisibilityVector> {
        VisibilityVector::from_positional(&self.layers, &self.initial_visibility)
    }

    /// Hands the layers and initial vector to a chart assembler.
    pub fn into_assembler<R: ChartRenderer>(self, renderer: R) -> PostMortemResult<ChartAssembler<R>> {
        let vector = self.initial_vector()?;
        ChartAssembler::new(renderer, self.layers, vector, self.config.window)
    }
}

/// Runs the whole pipeline against one warehouse session.
pub struct PostMortemDashboard;

impl PostMortemDashboard {
    /// Builds a dashboard. Stages run strictly in order; the first failing
    /// stage fails the build and nothing partial is returned.
    pub fn build<W: Warehouse + ?Sized>(
        warehouse: &mut W,
        config: &DashboardConfig,
    ) -> PostMortemResult<DashboardBuild> {
        config.validate()?;
        let span = info_span!(
            "dashboard_build",
            pool = %config.pool,
            constraint = %config.constraint
        );
        let _entered = span.enter();

        let mut session = QuerySession::new(warehouse, config.query_tag.clone());

        let identity = IdentityResolver::resolve(&mut session, config.pool, config.constraint)?;
        let flow_scenarios =
            ScenarioResolver::resolve(&mut session, "flows", &config.flow_scenarios)?;
        let shadow_price_factor_scenarios = ScenarioResolver::resolve(
            &mut session,
            "shadow_price_factor",
            &config.shadow_price_factor_scenarios,
        )?;
        let history_scenarios =
            ScenarioResolver::resolve(&mut session, "history", &config.history_scenarios)?;

        let retriever = SeriesRetriever::new(&identity, config.limit_sentinels());
        let history =
            retriever.shadow_price_history(&mut session, &history_scenarios, config.history_window)?;
        let flows = retriever.flows(&mut session, &flow_scenarios, config.window)?;
        let categories =
            retriever.categories(&mut session, &shadow_price_factor_scenarios, config.window)?;
        let outages =
            retriever.outages(&mut session, &shadow_price_factor_scenarios, config.window)?;
        let binding_summary = match config.ftr_window {
            Some(window) => Some(retriever.binding_summary(&mut session, window)?),
            None => None,
        };
        let (load, wind) = if config.grid_context {
            (
                retriever.load(&mut session, &flow_scenarios, config.window)?,
                retriever.wind(&mut session, &flow_scenarios, config.window)?,
            )
        } else {
            (TimeSeriesTable::empty(), TimeSeriesTable::empty())
        };
        let post_mortem = if config.post_mortem_scenarios.is_empty() {
            None
        } else {
            Some(retriever.post_mortem_table(
                &mut session,
                &config.post_mortem_scenarios,
                config.window,
            )?)
        };
        let series = SeriesBundle {
            flows,
            categories,
            outages,
            history,
            load,
            wind,
        };

        let builder = LayerBuilder::new(config.first_priority.clone(), config.constraint)
            .with_default_breakdown(config.default_breakdown.clone())
            .with_load_zone(config.load_zone.clone());
        let layers = builder.build(&series, &flow_scenarios.names());
        let default_breakdown = builder.resolved_default_breakdown(&series);
        let initial_visibility = VisibilityEngine::new(&layers).initial_vector().positional();

        info!(
            layers = layers.len(),
            drawn = initial_visibility.iter().filter(|state| state.is_drawn()).count(),
            binding_summary = binding_summary.is_some(),
            post_mortem = post_mortem.as_ref().map_or(0, PostMortemTable::len),
            "dashboard built"
        );

        Ok(DashboardBuild {
            config: config.clone(),
            identity,
            flow_scenarios,
            shadow_price_factor_scenarios,
            history_scenarios,
            series,
            binding_summary,
            post_mortem,
            layers,
            initial_visibility,
            default_breakdown,
        })
    }
}
