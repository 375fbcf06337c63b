/*
Filter / EQ Node
================

A stereo pair of RBJ biquads with one parameter surface:

  frequency   20 Hz – 20 kHz, swept exponentially (a linear sweep sounds
              wrong on a log-perceived axis)
  q           0.1 – 10
  gain        dB, only meaningful for the peaking and shelf shapes

The SHAPE is structural — switching lowpass → peaking goes through
`ParameterBinder::replace`, which rebuilds just this node. Everything else
is a live parameter write.

`frequency_response` is computed analytically from the coefficients so the
EQ widget can overlay the exact curve on its FFT trace.
*/

use crate::dsp::biquad::{Biquad, FilterShape};
use crate::dsp::smoother::{RampKind, Smoothed};
use crate::graph::node::{Ramp, RenderCtx};

pub struct FilterSection {
    left: Biquad,
    right: Biquad,
    sample_rate: f32,
    frequency: Smoothed,
    q: Smoothed,
    gain_db: Smoothed,
}

impl FilterSection {
    pub fn new(shape: FilterShape, sample_rate: f32) -> Self {
        let frequency = 1_000.0;
        let q = 0.707;
        let gain_db = 0.0;
        Self {
            left: Biquad::new(shape, sample_rate, frequency, q, gain_db),
            right: Biquad::new(shape, sample_rate, frequency, q, gain_db),
            sample_rate,
            frequency: Smoothed::new(frequency),
            q: Smoothed::new(q),
            gain_db: Smoothed::new(gain_db),
        }
    }

    pub fn shape(&self) -> FilterShape {
        self.left.shape()
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "frequency" => {
                let kind = if ramp.kind == RampKind::Step {
                    RampKind::Step
                } else {
                    RampKind::Exponential
                };
                self.frequency
                    .set_target(value.clamp(20.0, 20_000.0), kind, ramp.samples);
                true
            }
            "q" => {
                self.q
                    .set_target(value.clamp(0.1, 10.0), ramp.kind, ramp.samples);
                true
            }
            "gain" => {
                self.gain_db
                    .set_target(value.clamp(-40.0, 40.0), ramp.kind, ramp.samples);
                true
            }
            _ => false,
        }
    }

    /// Magnitude response in dB at the requested frequencies, from the
    /// current (ramp-target) settings.
    pub fn frequency_response(&self, frequencies: &[f32]) -> Vec<f32> {
        // Respond with where the filter is headed, not a mid-ramp value;
        // the overlay should match the knob the user just set.
        let probe = Biquad::new(
            self.left.shape(),
            self.sample_rate,
            self.frequency.target(),
            self.q.target(),
            self.gain_db.target(),
        );
        probe.frequency_response(frequencies)
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        // Coefficients update at most once per block: audible sweeps
        // re-enter every block anyway, and per-sample coefficient math
        // would triple the cost.
        let frames = left.len() as u32;
        let frequency = self.frequency.advance(frames);
        let q = self.q.advance(frames);
        let gain_db = self.gain_db.advance(frames);
        if frequency != self.left.frequency()
            || q != self.left.q()
            || gain_db != self.left.gain_db()
        {
            for side in [&mut self.left, &mut self.right] {
                side.set_frequency(frequency);
                side.set_q(q);
                side.set_gain_db(gain_db);
            }
        }

        self.left.render(left);
        self.right.render(right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_attenuates_high_content() {
        let mut section = FilterSection::new(FilterShape::Lowpass, 48_000.0);
        section.set_param("frequency", 300.0, Ramp::step());

        let mut osc = crate::dsp::oscillator::Oscillator::sine();
        let mut left = vec![0.0f32; 512];
        osc.render(&mut left, 6_000.0, 48_000.0);
        let mut right = left.clone();

        section.process(&mut left, &mut right, &RenderCtx::new(48_000.0, 0));

        let peak = left[64..].iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        assert!(peak < 0.05, "6 kHz through a 300 Hz lowpass: peak {peak}");
    }

    #[test]
    fn response_tracks_target_during_ramp() {
        let mut section = FilterSection::new(FilterShape::Peaking, 48_000.0);
        section.set_param("gain", 12.0, Ramp::linear(48_000));
        section.set_param("frequency", 1_000.0, Ramp::step());

        let response = section.frequency_response(&[1_000.0]);
        assert!(
            (response[0] - 12.0).abs() < 0.5,
            "overlay shows the target curve, got {}",
            response[0]
        );
    }

    #[test]
    fn channels_stay_matched() {
        let mut section = FilterSection::new(FilterShape::Bandpass, 48_000.0);
        let mut osc = crate::dsp::oscillator::Oscillator::sine();
        let mut left = vec![0.0f32; 256];
        osc.render(&mut left, 1_000.0, 48_000.0);
        let mut right = left.clone();

        section.process(&mut left, &mut right, &RenderCtx::new(48_000.0, 0));
        for (l, r) in left.iter().zip(&right) {
            assert!((l - r).abs() < 1e-6, "identical input, identical output");
        }
    }
}
