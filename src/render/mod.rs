mod frame;
mod null_renderer;

pub use frame::{
    ChartControls, ChartFrame, ControlButton, FigureFrame, HOVER_TIME_FORMAT, LayerProjection,
    PanelFrame, SliderControl, SliderStep,
};
pub use null_renderer::NullRenderer;

use crate::error::PostMortemResult;

/// Contract implemented by any chart host.
///
/// Hosts receive a fully materialized `ChartFrame` and apply its positional
/// visibility verbatim, so drawing code stays isolated from the visibility
/// rules.
pub trait ChartRenderer {
    fn render(&mut self, frame: &ChartFrame) -> PostMortemResult<()>;
}
