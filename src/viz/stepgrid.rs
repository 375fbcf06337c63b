//! Step-grid playhead state.
//!
//! The sequencer and arpeggiator views highlight the cell of the most
//! recent visual tick. Ticks arrive already ordered and at most once per
//! step (the transport guarantees both); this type just holds the latest
//! and clears on stop.

use crate::transport::VisualTick;

#[derive(Debug, Default)]
pub struct StepGridView {
    current: Option<VisualTick>,
}

impl StepGridView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tick(&mut self, tick: &VisualTick) {
        self.current = Some(*tick);
    }

    /// Drop the highlight (Play→Stop clears before the next frame).
    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn highlighted_step(&self) -> Option<usize> {
        self.current.map(|tick| tick.step_index)
    }

    pub fn is_highlighted(&self, step: usize) -> bool {
        self.highlighted_step() == Some(step)
    }
}
