//! Saturation node: the waveshaper with a graph parameter surface.
//!
//! Drive and wet mix are live parameters; the oversampling factor is
//! structural (it changes the processing topology) and comes in through
//! the node kind, so changing it is a `replace`.

use crate::dsp::smoother::Smoothed;
use crate::dsp::waveshaper::{Oversample, Waveshaper};
use crate::graph::node::{Ramp, RenderCtx};

pub struct SaturationNode {
    left: Waveshaper,
    right: Waveshaper,
    drive: Smoothed,
    wet: Smoothed,
}

impl SaturationNode {
    pub fn new(oversample: Oversample) -> Self {
        Self {
            left: Waveshaper::new(0.1, oversample, 1.0),
            right: Waveshaper::new(0.1, oversample, 1.0),
            drive: Smoothed::new(0.1),
            wet: Smoothed::new(1.0),
        }
    }

    pub fn oversample(&self) -> Oversample {
        self.left.oversample()
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "drive" => {
                self.drive
                    .set_target(value.clamp(0.0, 0.5), ramp.kind, ramp.samples);
                true
            }
            "wet" => {
                self.wet
                    .set_target(value.clamp(0.0, 1.0), ramp.kind, ramp.samples);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        let frames = left.len() as u32;
        let drive = self.drive.advance(frames);
        let wet = self.wet.advance(frames);
        for side in [&mut self.left, &mut self.right] {
            side.set_drive(drive);
            side.set_wet(wet);
        }
        self.left.render(left);
        self.right.render(right);
    }
}
