//! Step grid widget: one row per track, sixteen cells, the playhead cell
//! highlighted and the edit cursor bracketed.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use tonelab::viz::StepGridView;
use tonelab::widgets::DrumLabWidget;

pub fn render_step_grid(
    frame: &mut Frame,
    area: Rect,
    widget: &DrumLabWidget,
    grid_view: &StepGridView,
    cursor: (usize, usize),
) {
    let block = Block::default()
        .title(" Pattern (arrows move, enter toggles) ")
        .borders(Borders::ALL);

    let playhead = grid_view.highlighted_step();
    let mut lines = Vec::new();

    for (track, name) in widget.track_names().iter().enumerate() {
        let mut spans = vec![Span::styled(
            format!("{name:>6} "),
            Style::default().fg(Color::Gray),
        )];

        for step in 0..widget.pattern.steps_per_bar() {
            let active = widget.pattern.is_active(track, step);
            let is_cursor = cursor == (track, step);
            let is_playhead = playhead == Some(step);

            let symbol = if active { "■" } else { "·" };
            let mut style = Style::default().fg(if active {
                Color::Cyan
            } else {
                Color::DarkGray
            });
            if is_playhead {
                style = style.bg(Color::Rgb(60, 60, 20)).add_modifier(Modifier::BOLD);
            }

            if is_cursor {
                spans.push(Span::styled("[", Style::default().fg(Color::Yellow)));
                spans.push(Span::styled(symbol.to_string(), style));
                spans.push(Span::styled("]", Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(symbol.to_string(), style));
                spans.push(Span::raw(" "));
            }

            // Beat group separator every four steps
            if step % 4 == 3 {
                spans.push(Span::styled("|", Style::default().fg(Color::DarkGray)));
            }
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
