/*
Delay Node
==========

Feedback echo. The loop is entirely internal to the node:

    input ──(+)──→ [delay line] ──┬──→ wet
            ↑                     │
            └──── × feedback ─────┘

which is why a GraphSpec stays a DAG even though echoes repeat. Feedback
is capped at 0.95 so the loop always decays.

Parameters: time (10 ms – 2 s), feedback (0 – 0.95), mix (0 – 1).
Delay-time changes ramp the read offset, so dragging the time slider
produces tape-style pitch bends instead of crackle.
*/

use crate::dsp::delay_line::DelayLine;
use crate::dsp::smoother::Smoothed;
use crate::graph::node::{Ramp, RenderCtx};

const MAX_DELAY_SECONDS: f32 = 2.0;

pub struct DelayNode {
    left: DelayLine,
    right: DelayLine,
    sample_rate: f32,
    time_seconds: Smoothed,
    feedback: Smoothed,
    mix: Smoothed,
}

impl DelayNode {
    pub fn new(sample_rate: f32) -> Self {
        let capacity = (MAX_DELAY_SECONDS * sample_rate) as usize + 2;
        Self {
            left: DelayLine::new(capacity),
            right: DelayLine::new(capacity),
            sample_rate,
            time_seconds: Smoothed::new(0.3),
            feedback: Smoothed::new(0.35),
            mix: Smoothed::new(0.3),
        }
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "time" => {
                self.time_seconds.set_target(
                    value.clamp(0.01, MAX_DELAY_SECONDS),
                    ramp.kind,
                    ramp.samples,
                );
                true
            }
            "feedback" => {
                self.feedback
                    .set_target(value.clamp(0.0, 0.95), ramp.kind, ramp.samples);
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
            let delay_samples = self.time_seconds.next() * self.sample_rate;
            let feedback = self.feedback.next();
            let mix = self.mix.next();

            let echo_l = self.left.read_fractional(delay_samples);
            let echo_r = self.right.read_fractional(delay_samples);

            self.left.write(*l + echo_l * feedback);
            self.right.write(*r + echo_r * feedback);

            *l = *l * (1.0 - mix) + echo_l * mix;
            *r = *r * (1.0 - mix) + echo_r * mix;
        }
    }
}
