/*
Compressor Node
===============

Feed-forward stereo compressor with the WebAudio-compatible parameter
surface: threshold (-60..0 dB), ratio (1..20), knee (0..40 dB), attack
(1 ms..1 s), release (10 ms..1 s).

Detection is linked peak (max of |L|, |R|) through an envelope follower;
the gain computer's static curve converts the detected level to a gain
reduction which is applied identically to both channels.

The current reduction in dB is published through an atomic so the meter in
the UI thread can read it without ever taking a lock against the audio
callback.
*/

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::dsp::dynamics::{db_to_linear, linear_to_db, EnvelopeFollower, GainComputer};
use crate::graph::node::{Ramp, RenderCtx};

/// Lock-free reader for the compressor's gain-reduction meter.
#[derive(Clone)]
pub struct ReductionReader {
    bits: Arc<AtomicU32>,
}

impl ReductionReader {
    /// Current gain reduction in dB (≤ 0; 0 means no compression).
    pub fn reduction_db(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

pub struct CompressorNode {
    follower: EnvelopeFollower,
    computer: GainComputer,
    attack: f32,
    release: f32,
    reduction_bits: Arc<AtomicU32>,
}

impl CompressorNode {
    pub fn new(sample_rate: f32) -> Self {
        let attack = 0.003;
        let release = 0.25;
        Self {
            follower: EnvelopeFollower::new(sample_rate, attack, release),
            computer: GainComputer::new(-24.0, 4.0, 6.0),
            attack,
            release,
            reduction_bits: Arc::new(AtomicU32::new(0.0f32.to_bits())),
        }
    }

    pub fn reduction_reader(&self) -> ReductionReader {
        ReductionReader {
            bits: self.reduction_bits.clone(),
        }
    }

    pub fn transfer_params(&self) -> GainComputer {
        self.computer
    }

    pub fn set_param(&mut self, name: &str, value: f32, _ramp: Ramp) -> bool {
        // Dynamics parameters move the detector, not the signal path;
        // they need no anti-zipper ramps.
        match name {
            "threshold" => {
                self.computer.threshold_db = value.clamp(-60.0, 0.0);
                true
            }
            "ratio" => {
                self.computer.ratio = value.clamp(1.0, 20.0);
                true
            }
            "knee" => {
                self.computer.knee_db = value.clamp(0.0, 40.0);
                true
            }
            "attack" => {
                self.attack = value.clamp(0.001, 1.0);
                self.follower.set_times(self.attack, self.release);
                true
            }
            "release" => {
                self.release = value.clamp(0.01, 1.0);
                self.follower.set_times(self.attack, self.release);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        let mut last_reduction = 0.0f32;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let detected = self.follower.track(l.abs().max(r.abs()));
            let reduction_db = self.computer.gain_reduction_db(linear_to_db(detected));
            let gain = db_to_linear(reduction_db);
            *l *= gain;
            *r *= gain;
            last_reduction = reduction_db;
        }

        self.reduction_bits
            .store(last_reduction.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn loud_block(frames: usize, level: f32) -> (Vec<f32>, Vec<f32>) {
        // Alternating-sign "noise" at a fixed peak level
        let left: Vec<f32> = (0..frames)
            .map(|i| if i % 2 == 0 { level } else { -level })
            .collect();
        (left.clone(), left)
    }

    #[test]
    fn quiet_signal_passes_untouched() {
        let mut comp = CompressorNode::new(SR);
        comp.set_param("threshold", -20.0, Ramp::step());
        comp.set_param("knee", 0.0, Ramp::step());

        let (mut left, mut right) = loud_block(9600, 0.05); // -26 dBFS
        comp.process(&mut left, &mut right, &RenderCtx::new(SR, 0));

        assert!(
            (left[9000].abs() - 0.05).abs() < 0.005,
            "below threshold: got {}",
            left[9000]
        );
        assert!(comp.reduction_reader().reduction_db().abs() < 0.5);
    }

    #[test]
    fn steady_state_reduction_matches_ratio() {
        let mut comp = CompressorNode::new(SR);
        comp.set_param("threshold", -20.0, Ramp::step());
        comp.set_param("ratio", 4.0, Ramp::step());
        comp.set_param("knee", 0.0, Ramp::step());
        comp.set_param("attack", 0.003, Ramp::step());
        comp.set_param("release", 0.25, Ramp::step());

        // -6 dBFS input, 14 dB over threshold -> 10.5 dB reduction
        let (mut left, mut right) = loud_block(SR as usize, 0.5);
        comp.process(&mut left, &mut right, &RenderCtx::new(SR, 0));

        let reduction = comp.reduction_reader().reduction_db();
        assert!(
            (-12.0..=-8.0).contains(&reduction),
            "expected roughly -10.5 dB, got {reduction}"
        );
    }

    #[test]
    fn reduction_recovers_after_release() {
        let mut comp = CompressorNode::new(SR);
        comp.set_param("threshold", -20.0, Ramp::step());
        comp.set_param("release", 0.05, Ramp::step());
        comp.set_param("knee", 0.0, Ramp::step());

        let (mut left, mut right) = loud_block(24_000, 0.8);
        comp.process(&mut left, &mut right, &RenderCtx::new(SR, 0));
        let squeezed = comp.reduction_reader().reduction_db();
        assert!(squeezed < -3.0, "should be compressing: {squeezed}");

        let (mut left, mut right) = loud_block(48_000, 0.001);
        comp.process(&mut left, &mut right, &RenderCtx::new(SR, 0));
        let relaxed = comp.reduction_reader().reduction_db();
        assert!(relaxed > -0.5, "should have released: {relaxed}");
    }

    #[test]
    fn meter_reader_is_shared_not_copied() {
        let mut comp = CompressorNode::new(SR);
        let reader = comp.reduction_reader();
        comp.set_param("threshold", -30.0, Ramp::step());
        comp.set_param("knee", 0.0, Ramp::step());

        let (mut left, mut right) = loud_block(48_000, 0.9);
        comp.process(&mut left, &mut right, &RenderCtx::new(SR, 0));

        assert!(reader.reduction_db() < -5.0, "reader sees live meter");
    }
}
