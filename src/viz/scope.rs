//! Oscilloscope draw data: a capture window becomes a polyline in screen
//! space, one point per sample (or decimated to the viewport width when
//! the window is wider than the surface).

use crate::viz::mapping::Viewport;

/// Build the waveform polyline for one capture window.
pub fn waveform_polyline(samples: &[f32], viewport: &Viewport, scale: f32) -> Vec<(f32, f32)> {
    if samples.is_empty() {
        return Vec::new();
    }

    // Decimate by max-magnitude so transients survive downsampling
    let max_points = (viewport.width.max(8.0) as usize).min(samples.len());
    let chunk = (samples.len() / max_points).max(1);

    samples
        .chunks(chunk)
        .take(max_points)
        .enumerate()
        .map(|(i, window)| {
            let peak = window
                .iter()
                .copied()
                .max_by(|a, b| a.abs().partial_cmp(&b.abs()).unwrap())
                .unwrap_or(0.0);
            (
                viewport.sample_to_x(i * chunk, samples.len()),
                viewport.amplitude_to_y(peak, scale),
            )
        })
        .collect()
}
