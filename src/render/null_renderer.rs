use crate::error::PostMortemResult;
use crate::render::{ChartFrame, ChartRenderer};

/// No-op renderer used by tests and headless dashboard usage.
///
/// It still validates frame content so tests can catch misaligned layer
/// projections before a real chart host is wired in.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub render_count: usize,
    pub last_layer_count: usize,
    pub last_drawn_count: usize,
    pub last_frame: Option<ChartFrame>,
}

impl ChartRenderer for NullRenderer {
    fn render(&mut self, frame: &ChartFrame) -> PostMortemResult<()> {
        frame.validate()?;
        self.render_count += 1;
        self.last_layer_count = frame.layers.len();
        self.last_drawn_count = frame.drawn_count();
        self.last_frame = Some(frame.clone());
        Ok(())
    }
}
