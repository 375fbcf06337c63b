/*
Saturation / Waveshaping
========================

A waveshaper pushes each sample through a nonlinear transfer curve:

    output = f(input * (1 + k))

We use the smooth arctangent-family curve

    f(x) = (1 + k) * x / (1 + k * |x|)

where k is derived from the drive control. At drive 0 the curve is the
identity; as drive rises the knees compress and odd harmonics appear —
warm, tube-style saturation rather than hard clipping.

Oversampling: the curve creates harmonics above Nyquist which fold back
down as inharmonic aliasing. Processing at 2× or 4× the sample rate pushes
those harmonics into headroom that is filtered away on the way back down.
The implementation interpolates between consecutive input samples, shapes
each sub-sample, and averages — a one-pole decimation that is cheap and
good enough for the mild drive range this node allows.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversample {
    None,
    X2,
    X4,
}

impl Oversample {
    pub fn factor(self) -> usize {
        match self {
            Oversample::None => 1,
            Oversample::X2 => 2,
            Oversample::X4 => 4,
        }
    }
}

/// Shape one sample. `drive` in [0, 0.5] maps to curve steepness.
#[inline]
pub fn saturate(sample: f32, drive: f32) -> f32 {
    let k = drive.clamp(0.0, 0.5) * 20.0;
    if k <= 0.0 {
        return sample;
    }
    (1.0 + k) * sample / (1.0 + k * sample.abs())
}

pub struct Waveshaper {
    drive: f32,
    oversample: Oversample,
    wet: f32,
    prev_input: f32,
}

impl Waveshaper {
    pub fn new(drive: f32, oversample: Oversample, wet: f32) -> Self {
        Self {
            drive: drive.clamp(0.0, 0.5),
            oversample,
            wet: wet.clamp(0.0, 1.0),
            prev_input: 0.0,
        }
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive.clamp(0.0, 0.5);
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    pub fn set_oversample(&mut self, oversample: Oversample) {
        self.oversample = oversample;
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn oversample(&self) -> Oversample {
        self.oversample
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let factor = self.oversample.factor();
        let shaped = if factor == 1 {
            saturate(input, self.drive)
        } else {
            // Linear-interpolate the input up, shape, average down
            let mut acc = 0.0;
            for i in 1..=factor {
                let t = i as f32 / factor as f32;
                let sub = self.prev_input + (input - self.prev_input) * t;
                acc += saturate(sub, self.drive);
            }
            acc / factor as f32
        };
        self.prev_input = input;
        shaped * self.wet + input * (1.0 - self.wet)
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.prev_input = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_drive_is_identity() {
        assert_eq!(saturate(0.5, 0.0), 0.5);
        assert_eq!(saturate(-0.8, 0.0), -0.8);
    }

    #[test]
    fn curve_is_odd_symmetric() {
        for x in [0.1f32, 0.4, 0.9] {
            let pos = saturate(x, 0.3);
            let neg = saturate(-x, 0.3);
            assert!((pos + neg).abs() < 1e-6, "f({x}) and f(-{x}) must mirror");
        }
    }

    #[test]
    fn output_is_bounded() {
        for i in 0..100 {
            let x = (i as f32 / 50.0) - 1.0;
            let y = saturate(x, 0.5);
            assert!(y.abs() <= 1.05, "saturate({x}) = {y} out of bounds");
        }
    }

    #[test]
    fn drive_compresses_peaks() {
        let gentle = saturate(0.9, 0.1);
        let hard = saturate(0.9, 0.5);
        assert!(
            hard < gentle,
            "more drive flattens peaks harder: {hard} vs {gentle}"
        );
    }

    #[test]
    fn dry_mix_bypasses_the_curve() {
        let mut shaper = Waveshaper::new(0.5, Oversample::None, 0.0);
        let out = shaper.process(0.7);
        assert!((out - 0.7).abs() < 1e-6, "wet=0 must be dry: {out}");
    }

    #[test]
    fn oversampled_output_close_to_plain_for_smooth_input() {
        let mut plain = Waveshaper::new(0.3, Oversample::None, 1.0);
        let mut over = Waveshaper::new(0.3, Oversample::X4, 1.0);

        // A slow ramp is band-limited; both paths should agree closely
        let mut max_diff = 0.0f32;
        for i in 0..200 {
            let x = (i as f32 / 200.0) * 0.5;
            let a = plain.process(x);
            let b = over.process(x);
            max_diff = max_diff.max((a - b).abs());
        }
        assert!(max_diff < 0.05, "paths diverged by {max_diff}");
    }
}
