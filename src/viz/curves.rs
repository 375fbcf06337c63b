/*
Overlay Curves
==============

The two analytic overlays widgets draw on top of measured data:

  EQ response      The filter's `frequency_response` sampled on the log
                   grid and mapped into screen space, drawn over the FFT
                   trace so the user sees the curve shaping the spectrum.

  Transfer curve   The compressor's static input→output law, plotted on a
                   dB/dB square, with the reduction meter fed from the
                   live `reduction` signal next to it.
*/

use crate::dsp::biquad::log_frequency_grid;
use crate::dsp::dynamics::GainComputer;
use crate::viz::mapping::Viewport;

/// EQ overlay: screen-space polyline of a filter's magnitude response.
/// `response_db` must correspond to `log_frequency_grid(points)`.
pub fn eq_overlay(response_db: &[f32], viewport: &Viewport) -> Vec<(f32, f32)> {
    let grid = log_frequency_grid(response_db.len());
    grid.iter()
        .zip(response_db)
        .map(|(&freq, &db)| {
            // EQ curves swing ±40 dB around the center line, not the full
            // analyzer range; rescale so 0 dB sits mid-height.
            let y = (0.5 - db / 80.0).clamp(0.0, 1.0) * viewport.height;
            (viewport.freq_to_x(freq), y)
        })
        .collect()
}

/// Input range of the transfer plot, dB.
pub const TRANSFER_MIN_DB: f32 = -60.0;
pub const TRANSFER_MAX_DB: f32 = 0.0;

/// The compressor's static curve as a screen-space polyline over a
/// square plot (input dB on x, output dB on y).
pub fn transfer_curve(
    computer: &GainComputer,
    viewport: &Viewport,
    points: usize,
) -> Vec<(f32, f32)> {
    (0..points.max(2))
        .map(|i| {
            let t = i as f32 / (points - 1) as f32;
            let input_db = TRANSFER_MIN_DB + t * (TRANSFER_MAX_DB - TRANSFER_MIN_DB);
            let output_db = computer.transfer_point(input_db);

            let x = t * viewport.width;
            let ty = (output_db - TRANSFER_MIN_DB) / (TRANSFER_MAX_DB - TRANSFER_MIN_DB);
            let y = (1.0 - ty.clamp(0.0, 1.0)) * viewport.height;
            (x, y)
        })
        .collect()
}

/// Gain-reduction meter fill fraction for a given reduction in dB
/// (0 = idle, 1 = `floor_db` or more of reduction).
pub fn reduction_meter_fraction(reduction_db: f32, floor_db: f32) -> f32 {
    debug_assert!(floor_db < 0.0);
    (reduction_db / floor_db).clamp(0.0, 1.0)
}
