//! Gain stage. The simplest effect and the template for the rest: smoothed
//! parameters in, in-place block processing out.

use crate::dsp::smoother::Smoothed;
use crate::graph::node::{Ramp, RenderCtx};

pub struct GainStage {
    level: Smoothed,
}

impl GainStage {
    pub fn new() -> Self {
        Self {
            level: Smoothed::new(1.0),
        }
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "gain" => {
                self.level
                    .set_target(value.clamp(0.0, 4.0), ramp.kind, ramp.samples);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let gain = self.level.next();
            *l *= gain;
            *r *= gain;
        }
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new()
    }
}
