pub mod date_window;
pub mod dedup;
pub mod identity;
pub mod ids;
pub mod layer;
pub mod panel;
pub mod post_mortem;
pub mod scenario;
pub mod series;
pub mod visibility;

pub use date_window::{DateWindow, month_start, operating_day};
pub use dedup::{DedupRecord, DedupStats, select_min_raw_id};
pub use identity::{RawIdentityRecord, ResolvedIdentity};
pub use ids::{
    CanonicalConstraintId, LayerId, PackageVersionId, PoolId, RawConstraintId, ScenarioId, id_list,
};
pub use layer::{
    Category, ConstraintScope, Layer, LayerDraft, LayerKind, LayerList, LayerPoint, LayerRole,
    LayerStyle, StackSide, Visibility,
};
pub use panel::{AxisSpec, Figure, Panel, PanelDescriptor, PanelLayoutRegion, PanelStack};
pub use post_mortem::{PostMortemRow, PostMortemTable};
pub use scenario::{ResolvedScenarios, ScenarioName, ScenarioRef, pick_breakdown_target};
pub use series::{
    BindingSummary, BindingSummaryRow, CategoryRow, DEFAULT_FLOW_LIMIT_SENTINEL,
    DEFAULT_RAW_LIMIT_SENTINEL, FlowRow, LimitSentinels, LoadRow, OutageRow, SeriesRow,
    ShadowPriceHistoryRow, TOTAL_LOAD_ZONE, TimeSeriesTable, WindRow, format_currency,
    sanitize_limit,
};
pub use visibility::VisibilityVector;
