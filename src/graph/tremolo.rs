//! Tremolo node: periodic amplitude modulation.
//!
//! gain(t) = 1 - depth/2 + depth/2 * sin(2π rate t) — the classic amp
//! tremolo, swinging between full level and (1 - depth). Phase comes from
//! the absolute frame counter so renders are reproducible.

use std::f32::consts::TAU;

use crate::dsp::smoother::Smoothed;
use crate::graph::node::{Ramp, RenderCtx};

pub struct TremoloNode {
    sample_rate: f32,
    rate_hz: Smoothed,
    depth: Smoothed,
}

impl TremoloNode {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            rate_hz: Smoothed::new(4.0),
            depth: Smoothed::new(0.5),
        }
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "rate" => {
                self.rate_hz
                    .set_target(value.clamp(0.1, 20.0), ramp.kind, ramp.samples);
                true
            }
            "depth" => {
                self.depth
                    .set_target(value.clamp(0.0, 1.0), ramp.kind, ramp.samples);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        for (i, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
            let rate = self.rate_hz.next();
            let depth = self.depth.next();
            let t = (ctx.start_frame + i as u64) as f32 / self.sample_rate;
            let lfo = (TAU * rate * t).sin();
            let gain = 1.0 - depth * 0.5 + depth * 0.5 * lfo;
            *l *= gain;
            *r *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn depth_zero_is_transparent() {
        let mut node = TremoloNode::new(SR);
        node.set_param("depth", 0.0, Ramp::step());

        let mut left = vec![0.5f32; 256];
        let mut right = left.clone();
        node.process(&mut left, &mut right, &RenderCtx::new(SR, 0));
        assert!((left[128] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn gain_oscillates_at_the_configured_rate() {
        let mut node = TremoloNode::new(SR);
        node.set_param("rate", 4.0, Ramp::step());
        node.set_param("depth", 1.0, Ramp::step());

        // DC input makes the LFO directly visible
        let frames = SR as usize; // 1 second = 4 cycles
        let mut left = vec![1.0f32; frames];
        let mut right = left.clone();
        node.process(&mut left, &mut right, &RenderCtx::new(SR, 0));

        // Count maxima crossings: gain ~1.0 happens 4 times/second
        let above: Vec<bool> = left.iter().map(|&g| g > 0.95).collect();
        let rises = above.windows(2).filter(|w| !w[0] && w[1]).count();
        assert!(
            (3..=5).contains(&rises),
            "expected ~4 LFO peaks in 1 s, got {rises}"
        );
    }

    #[test]
    fn modulation_continues_across_blocks() {
        let mut node = TremoloNode::new(SR);
        node.set_param("rate", 2.0, Ramp::step());
        node.set_param("depth", 1.0, Ramp::step());

        // Two consecutive blocks vs one long block must match
        let mut one = vec![1.0f32; 1024];
        let mut one_r = one.clone();
        node.process(&mut one, &mut one_r, &RenderCtx::new(SR, 0));

        let mut node2 = TremoloNode::new(SR);
        node2.set_param("rate", 2.0, Ramp::step());
        node2.set_param("depth", 1.0, Ramp::step());
        let mut a = vec![1.0f32; 512];
        let mut a_r = a.clone();
        node2.process(&mut a, &mut a_r, &RenderCtx::new(SR, 0));
        let mut b = vec![1.0f32; 512];
        let mut b_r = b.clone();
        node2.process(&mut b, &mut b_r, &RenderCtx::new(SR, 512));

        let recombined: Vec<f32> = a.into_iter().chain(b).collect();
        for (x, y) in one.iter().zip(&recombined) {
            assert!((x - y).abs() < 1e-5, "block splits must not change phase");
        }
    }
}
