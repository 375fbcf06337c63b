//! Reverb node: two detuned Schroeder cores, one per channel.
//!
//! The right core's delay set is offset by a handful of samples, which
//! decorrelates the tails and gives the stereo image its width without a
//! second topology. Parameters: size, decay, damping, mix (all 0–1).

use crate::dsp::reverb::ReverbCore;
use crate::dsp::smoother::Smoothed;
use crate::graph::node::{Ramp, RenderCtx};

/// Right-channel delay detune in samples.
const STEREO_SPREAD: usize = 23;

pub struct ReverbNode {
    left: ReverbCore,
    right: ReverbCore,
    mix: Smoothed,
}

impl ReverbNode {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            left: ReverbCore::new(sample_rate, 0),
            right: ReverbCore::new(sample_rate, STEREO_SPREAD),
            mix: Smoothed::new(0.3),
        }
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "size" => {
                self.left.set_room_size(value);
                self.right.set_room_size(value);
                true
            }
            "decay" => {
                self.left.set_decay(value);
                self.right.set_decay(value);
                true
            }
            "damping" => {
                self.left.set_damping(value);
                self.right.set_damping(value);
                true
            }
            "mix" => {
                self.mix
                    .set_target(value.clamp(0.0, 1.0), ramp.kind, ramp.samples);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mix = self.mix.next();
            let wet_l = self.left.process(*l);
            let wet_r = self.right.process(*r);
            *l = *l * (1.0 - mix) + wet_l * mix;
            *r = *r * (1.0 - mix) + wet_r * mix;
        }
    }
}
