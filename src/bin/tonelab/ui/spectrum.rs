//! Spectrum analyzer widget
//!
//! Log-binned FFT magnitudes from the master-bus analyzer tap.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use tonelab::viz::SpectrumPipeline;

pub fn render_spectrum(frame: &mut Frame, area: Rect, pipeline: &SpectrumPipeline) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    // Plot against log-bin index; the pipeline's bins are already
    // log-spaced so the x axis reads as frequency.
    let data: Vec<(f64, f64)> = pipeline
        .data()
        .enumerate()
        .map(|(i, (_, db))| (i as f64, db as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&data);

    let max_x = (data.len().max(2) - 1) as f64;
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, max_x])
                .labels(vec!["20", "630", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-100.0, 0.0])
                .labels(vec!["-100", "-60", "-20", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
