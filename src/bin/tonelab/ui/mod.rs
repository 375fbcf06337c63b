//! Terminal UI composition: spectrum on top, step grid in the middle,
//! transport/status line at the bottom.

mod spectrum;
mod stepgrid;
mod transport;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use tonelab::harness::WidgetHarness;
use tonelab::viz::{SpectrumPipeline, StepGridView};
use tonelab::widgets::DrumLabWidget;

pub fn draw(
    frame: &mut Frame,
    harness: &WidgetHarness<'_, DrumLabWidget>,
    spectrum_data: &SpectrumPipeline,
    grid_view: &StepGridView,
    cursor: (usize, usize),
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Min(7),
            Constraint::Length(3),
        ])
        .split(frame.area());

    spectrum::render_spectrum(frame, chunks[0], spectrum_data);
    stepgrid::render_step_grid(
        frame,
        chunks[1],
        harness.widget(),
        grid_view,
        cursor,
    );
    transport::render_transport(frame, chunks[2], harness);
}
