/*
Chorus Node
===========

The illusion of several players: the signal is delayed by ~20 ms and the
delay time is slowly modulated, detuning the copy against the dry signal.
No feedback (that would be a flanger). The right channel's LFO runs a
quarter cycle ahead of the left, widening the image.

Parameters: rate (0.05–8 Hz), depth (0–10 ms of modulation), mix (0–1).

The LFO phase derives from the render context's absolute frame counter
rather than internal state, so a live graph and an offline render of the
same spec modulate identically.
*/

use std::f32::consts::TAU;

use crate::dsp::delay_line::DelayLine;
use crate::dsp::smoother::Smoothed;
use crate::graph::node::{Ramp, RenderCtx};

/// Center delay around which the LFO swings.
const CENTER_DELAY_SECONDS: f32 = 0.02;
const MAX_DEPTH_SECONDS: f32 = 0.01;

pub struct ChorusNode {
    left: DelayLine,
    right: DelayLine,
    sample_rate: f32,
    rate_hz: Smoothed,
    depth_seconds: Smoothed,
    mix: Smoothed,
}

impl ChorusNode {
    pub fn new(sample_rate: f32) -> Self {
        let capacity = ((CENTER_DELAY_SECONDS + MAX_DEPTH_SECONDS) * sample_rate) as usize + 4;
        Self {
            left: DelayLine::new(capacity),
            right: DelayLine::new(capacity),
            sample_rate,
            rate_hz: Smoothed::new(0.8),
            depth_seconds: Smoothed::new(0.004),
            mix: Smoothed::new(0.5),
        }
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "rate" => {
                self.rate_hz
                    .set_target(value.clamp(0.05, 8.0), ramp.kind, ramp.samples);
                true
            }
            "depth" => {
                self.depth_seconds.set_target(
                    value.clamp(0.0, MAX_DEPTH_SECONDS),
                    ramp.kind,
                    ramp.samples,
                );
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

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            let rate = self.rate_hz.next();
            let depth = self.depth_seconds.next() * self.sample_rate;
            let mix = self.mix.next();
            let center = CENTER_DELAY_SECONDS * self.sample_rate;

            let t = (ctx.start_frame + i as u64) as f32 / self.sample_rate;
            let phase = TAU * rate * t;
            let delay_l = center + depth * phase.sin();
            let delay_r = center + depth * (phase + TAU * 0.25).sin();

            self.left.write(*l);
            self.right.write(*r);
            let wet_l = self.left.read_fractional(delay_l);
            let wet_r = self.right.read_fractional(delay_r);

            *l = *l * (1.0 - mix) + wet_l * mix;
            *r = *r * (1.0 - mix) + wet_r * mix;
        }
    }
}
