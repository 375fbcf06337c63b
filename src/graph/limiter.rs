/*
Limiter Node
============

A brickwall: a compressor with infinite ratio, a hard knee, and a short
lookahead. The signal is delayed by the lookahead while the detector runs
on the UNdelayed input, so the gain is already down by the time a peak
reaches the output — transients cannot punch through the ceiling the way
they do with a plain fast-attack compressor.

Parameters: threshold (-40..0 dB), release (1..500 ms). Attack is the
lookahead itself (fixed 5 ms).
*/

use crate::dsp::delay_line::DelayLine;
use crate::dsp::dynamics::{db_to_linear, linear_to_db, EnvelopeFollower, GainComputer};
use crate::graph::node::{Ramp, RenderCtx};

const LOOKAHEAD_SECONDS: f32 = 0.005;

pub struct LimiterNode {
    delay_left: DelayLine,
    delay_right: DelayLine,
    lookahead_samples: usize,
    follower: EnvelopeFollower,
    computer: GainComputer,
    release: f32,
}

impl LimiterNode {
    pub fn new(sample_rate: f32) -> Self {
        let lookahead_samples = (LOOKAHEAD_SECONDS * sample_rate) as usize;
        let release = 0.05;
        Self {
            delay_left: DelayLine::new(lookahead_samples + 2),
            delay_right: DelayLine::new(lookahead_samples + 2),
            lookahead_samples,
            // Attack a fraction of the lookahead so the follower is fully
            // risen by the time the delayed peak arrives.
            follower: EnvelopeFollower::new(sample_rate, LOOKAHEAD_SECONDS * 0.25, release),
            computer: GainComputer::new(-1.0, f32::INFINITY, 0.0),
            release,
        }
    }

    pub fn set_param(&mut self, name: &str, value: f32, _ramp: Ramp) -> bool {
        match name {
            "threshold" => {
                self.computer.threshold_db = value.clamp(-40.0, 0.0);
                true
            }
            "release" => {
                self.release = value.clamp(0.001, 0.5);
                self.follower
                    .set_times(LOOKAHEAD_SECONDS * 0.25, self.release);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let detected = self.follower.track(l.abs().max(r.abs()));
            let reduction_db = self.computer.gain_reduction_db(linear_to_db(detected));
            let gain = db_to_linear(reduction_db);

            let delayed_l = self.delay_left.next_sample(*l, self.lookahead_samples);
            let delayed_r = self.delay_right.next_sample(*r, self.lookahead_samples);

            // Hard safety clamp at the ceiling; the follower handles the
            // musical part, this catches single-sample overshoot.
            let ceiling = db_to_linear(self.computer.threshold_db);
            *l = (delayed_l * gain).clamp(-ceiling, ceiling);
            *r = (delayed_r * gain).clamp(-ceiling, ceiling);
        }
    }
}
