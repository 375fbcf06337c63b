//! Transport/status line: play state, bar:step readout, tempo, widget
//! status text.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use tonelab::harness::WidgetHarness;
use tonelab::widgets::DrumLabWidget;

pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    harness: &WidgetHarness<'_, DrumLabWidget>,
) {
    let position = harness.transport().position();
    let playing = if harness.is_playing() { "▶" } else { "■" };
    let status = harness.status();

    let line = Line::from(vec![
        Span::styled(
            format!(" {playing} "),
            Style::default().fg(if harness.is_playing() {
                Color::Green
            } else {
                Color::Red
            }),
        ),
        Span::raw(format!(
            "bar {} · step {:>2}/{} · {:.0} bpm   ",
            position.bar + 1,
            position.step + 1,
            position.steps_per_bar,
            harness.widget().bpm,
        )),
        Span::styled(format!("{status}"), Style::default().fg(Color::Gray)),
        Span::styled(
            "   space: play/stop  +/-: tempo  q: quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}
