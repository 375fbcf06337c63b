/*
3-D Panner Node
===============

Spatializes a mono-folded input around a listener fixed at the origin,
facing -Z. Three mechanisms, applied per sample:

  Distance    Inverse model with reference distance 1:
              gain = 1 / (1 + rolloff * (max(d, 1) - 1)).

  Direction   Equal-power azimuth pan (the level difference between ears)
              plus an interaural time difference of up to ~0.7 ms on the
              far ear — the two cues an HRTF chiefly encodes, realized
              with a fractional delay per ear.

  Cone        The source radiates along +X. Inside the inner cone the
              gain is 1; outside the outer cone it falls to a fixed floor;
              between the two it interpolates. The default angles (360°)
              disable the effect.

Position moves through ~10 ms smoothers, so even teleporting automation
(movement-pattern switches, drag) cannot click.

Elevation (Y) participates in distance and cone math; like most non-HRTF
spatializers we fold it into the front-back axis for panning purposes.
*/

use crate::dsp::delay_line::DelayLine;
use crate::dsp::smoother::Smoothed;
use crate::graph::node::{Ramp, RenderCtx};

/// Maximum interaural delay, seconds (roughly a head's width of travel).
const ITD_MAX_SECONDS: f32 = 0.0007;
/// Gain floor outside the outer cone.
const CONE_OUTER_GAIN: f32 = 0.1;

pub struct PannerNode {
    sample_rate: f32,
    x: Smoothed,
    y: Smoothed,
    z: Smoothed,
    rolloff: Smoothed,
    cone_inner_deg: f32,
    cone_outer_deg: f32,
    ear_left: DelayLine,
    ear_right: DelayLine,
}

impl PannerNode {
    pub fn new(sample_rate: f32) -> Self {
        let itd_capacity = (ITD_MAX_SECONDS * sample_rate) as usize + 4;
        Self {
            sample_rate,
            x: Smoothed::new(0.0),
            y: Smoothed::new(0.0),
            z: Smoothed::new(-1.0),
            rolloff: Smoothed::new(1.0),
            cone_inner_deg: 360.0,
            cone_outer_deg: 360.0,
            ear_left: DelayLine::new(itd_capacity),
            ear_right: DelayLine::new(itd_capacity),
        }
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "positionX" => {
                self.x.set_target(value, ramp.kind, ramp.samples);
                true
            }
            "positionY" => {
                self.y.set_target(value, ramp.kind, ramp.samples);
                true
            }
            "positionZ" => {
                self.z.set_target(value, ramp.kind, ramp.samples);
                true
            }
            "rolloffFactor" => {
                self.rolloff
                    .set_target(value.clamp(0.0, 10.0), ramp.kind, ramp.samples);
                true
            }
            "coneInnerAngle" => {
                self.cone_inner_deg = value.clamp(0.0, 360.0);
                true
            }
            "coneOuterAngle" => {
                self.cone_outer_deg = value.clamp(self.cone_inner_deg, 360.0);
                true
            }
            _ => false,
        }
    }

    /// Cone attenuation for a source radiating along +X: the angle between
    /// the +X axis and the source→listener ray (-position) reduces to
    /// -x/distance.
    fn cone_gain(x: f32, distance: f32, inner_deg: f32, outer_deg: f32) -> f32 {
        if inner_deg >= 360.0 {
            return 1.0;
        }
        let cos_angle = (-x / distance.max(1e-6)).clamp(-1.0, 1.0);
        let angle_deg = cos_angle.acos().to_degrees();

        let half_inner = inner_deg / 2.0;
        let half_outer = (outer_deg / 2.0).max(half_inner + 1e-3);
        if angle_deg <= half_inner {
            1.0
        } else if angle_deg >= half_outer {
            CONE_OUTER_GAIN
        } else {
            let t = (angle_deg - half_inner) / (half_outer - half_inner);
            1.0 + (CONE_OUTER_GAIN - 1.0) * t
        }
    }

    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let x = self.x.next();
            let y = self.y.next();
            let z = self.z.next();
            let rolloff = self.rolloff.next();

            let distance = (x * x + y * y + z * z).sqrt().max(1e-4);

            // Inverse distance model, reference distance 1
            let distance_gain = 1.0 / (1.0 + rolloff * (distance.max(1.0) - 1.0));

            let cone_gain =
                Self::cone_gain(x, distance, self.cone_inner_deg, self.cone_outer_deg);

            // Azimuth: 0 ahead, -90° hard left, +90° hard right. Sources
            // behind the listener mirror to the matching front angle.
            let azimuth = x.atan2(-z);
            let pan = (azimuth / std::f32::consts::FRAC_PI_2).clamp(-1.0, 1.0);
            let theta = (pan + 1.0) * std::f32::consts::FRAC_PI_4;
            let gain_l = theta.cos();
            let gain_r = theta.sin();

            let mono = 0.5 * (*l + *r) * distance_gain * cone_gain;
            self.ear_left.write(mono);
            self.ear_right.write(mono);

            // Far ear arrives later
            let itd_samples = ITD_MAX_SECONDS * self.sample_rate * pan.abs();
            let (delay_l, delay_r) = if pan > 0.0 {
                (itd_samples, 0.0)
            } else {
                (0.0, itd_samples)
            };

            *l = self.ear_left.read_fractional(delay_l) * gain_l;
            *r = self.ear_right.read_fractional(delay_r) * gain_r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn rms(buffer: &[f32]) -> f32 {
        (buffer.iter().map(|x| x * x).sum::<f32>() / buffer.len() as f32).sqrt()
    }

    fn process_tone(node: &mut PannerNode, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut osc = crate::dsp::oscillator::Oscillator::sine();
        let mut left = vec![0.0f32; frames];
        osc.render(&mut left, 440.0, SR);
        let mut right = left.clone();
        node.process(&mut left, &mut right, &RenderCtx::new(SR, 0));
        (left, right)
    }

    #[test]
    fn hard_left_position_silences_the_right_ear() {
        let mut node = PannerNode::new(SR);
        node.set_param("positionX", -5.0, Ramp::step());
        node.set_param("positionZ", 0.0, Ramp::step());

        let (left, right) = process_tone(&mut node, 2048);
        let (rms_l, rms_r) = (rms(&left), rms(&right));
        assert!(
            rms_l > rms_r * 2.0,
            "hard left: L {rms_l} should dominate R {rms_r}"
        );
    }

    #[test]
    fn center_position_is_balanced() {
        let mut node = PannerNode::new(SR);
        node.set_param("positionX", 0.0, Ramp::step());
        node.set_param("positionZ", -1.0, Ramp::step());

        let (left, right) = process_tone(&mut node, 2048);
        let (rms_l, rms_r) = (rms(&left), rms(&right));
        assert!(
            (rms_l - rms_r).abs() / rms_l.max(1e-9) < 0.05,
            "center: {rms_l} vs {rms_r}"
        );
    }

    #[test]
    fn distance_attenuates_with_inverse_law() {
        let level_at = |d: f32| {
            let mut node = PannerNode::new(SR);
            node.set_param("positionZ", -d, Ramp::step());
            let (left, right) = process_tone(&mut node, 4096);
            rms(&left) + rms(&right)
        };

        let near = level_at(1.0);
        let far = level_at(9.0);
        // Inverse law with rolloff 1: gain at d=9 is 1/9 of d=1
        let ratio = near / far.max(1e-9);
        assert!(
            (6.0..=12.0).contains(&ratio),
            "expected ~9x attenuation, got {ratio}"
        );
    }

    #[test]
    fn cone_attenuates_off_axis_sources() {
        // The source radiates along +X, so at position +X the
        // source→listener ray (-X) is opposite the radiation axis
        // (off-axis); at position -X the ray is +X (on-axis).
        let mut off_axis = PannerNode::new(SR);
        off_axis.set_param("coneInnerAngle", 60.0, Ramp::step());
        off_axis.set_param("coneOuterAngle", 90.0, Ramp::step());
        off_axis.set_param("positionX", 2.0, Ramp::step());

        let mut on_axis = PannerNode::new(SR);
        on_axis.set_param("coneInnerAngle", 60.0, Ramp::step());
        on_axis.set_param("coneOuterAngle", 90.0, Ramp::step());
        on_axis.set_param("positionX", -2.0, Ramp::step());

        let (l_off, r_off) = process_tone(&mut off_axis, 4096);
        let (l_on, r_on) = process_tone(&mut on_axis, 4096);

        let off = rms(&l_off) + rms(&r_off);
        let on = rms(&l_on) + rms(&r_on);
        assert!(
            on > off * 3.0,
            "cone should favor the on-axis side: on {on}, off {off}"
        );
    }

    #[test]
    fn far_ear_is_delayed() {
        let mut node = PannerNode::new(SR);
        node.set_param("positionX", 5.0, Ramp::step()); // hard right
        node.set_param("positionZ", 0.0, Ramp::step());

        let mut left = vec![0.0f32; 256];
        left[0] = 1.0;
        let mut right = left.clone();
        node.process(&mut left, &mut right, &RenderCtx::new(SR, 0));

        let first_l = left.iter().position(|&s| s.abs() > 1e-4);
        let first_r = right.iter().position(|&s| s.abs() > 1e-4);
        match (first_l, first_r) {
            (Some(l), Some(r)) => assert!(l > r, "left (far) ear should lag: L {l}, R {r}"),
            (None, Some(_)) => {} // equal-power may null the far ear entirely
            other => panic!("unexpected onset pattern {other:?}"),
        }
    }
}
