//! postmortem-rs: transmission-constraint post-mortem dashboards.
//!
//! The crate resolves a canonical constraint against its raw identity
//! records, retrieves flows, category decomposition, outage impact and
//! historical shadow prices through a `Warehouse` seam, builds one ordered
//! layer list per dashboard, and drives layer visibility with a pure state
//! engine. Chart drawing stays behind the `ChartRenderer` boundary.

pub mod api;
pub mod core;
pub mod error;
pub mod query;
pub mod render;
pub mod telemetry;
pub mod warehouse;

pub use api::{
    ChartAssembler, DashboardBuild, DashboardConfig, PostMortemDashboard, SelectionEvent,
    VisibilityEngine,
};
pub use error::{PostMortemError, PostMortemResult};
