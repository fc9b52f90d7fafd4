//! Pipeline stages of a post-mortem dashboard, leaves first: identity and
//! scenario resolution, series retrieval, layer building, the visibility
//! engine, and the chart assembler that drives a renderer.

mod chart_assembler;
mod dashboard;
mod dashboard_config;
mod identity_resolver;
mod json_contract;
mod layer_builder;
mod scenario_resolver;
mod series_retriever;
mod visibility_engine;

pub use chart_assembler::ChartAssembler;
pub use dashboard::{DashboardBuild, PostMortemDashboard};
pub use dashboard_config::DashboardConfig;
pub use identity_resolver::IdentityResolver;
pub use json_contract::{CHART_FRAME_JSON_SCHEMA_V1, ChartFrameJsonContractV1};
pub use layer_builder::LayerBuilder;
pub use scenario_resolver::ScenarioResolver;
pub use series_retriever::{SeriesBundle, SeriesRetriever};
pub use visibility_engine::{SelectionEvent, VisibilityEngine};
