/*
Dynamics Building Blocks
========================

The compressor and limiter nodes share two primitives:

  EnvelopeFollower   Tracks the signal's level with separate attack and
                     release time constants. One-pole smoothing:

                         env = coef * env + (1 - coef) * |x|

                     where coef = e^(-1 / (time * sample_rate)). A rising
                     signal is followed at the attack rate, a falling one
                     at the release rate.

  GainComputer       Maps an input level (dB) to a gain change (dB) from
                     threshold, ratio, and knee — the WebAudio-compatible
                     static curve. Below the knee nothing happens; above
                     it, every dB over threshold comes out as 1/ratio dB;
                     inside the knee a quadratic blends the two regimes.

The transfer curve is exposed separately (`transfer_point`) because the
dynamics widget plots the theoretical curve next to the measured meter.
*/

/// Convert linear amplitude to dB. Silence floors at -120 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

/// Convert dB to linear amplitude.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

pub struct EnvelopeFollower {
    attack_coef: f32,
    release_coef: f32,
    envelope: f32,
    sample_rate: f32,
}

impl EnvelopeFollower {
    pub fn new(sample_rate: f32, attack_seconds: f32, release_seconds: f32) -> Self {
        let mut follower = Self {
            attack_coef: 0.0,
            release_coef: 0.0,
            envelope: 0.0,
            sample_rate,
        };
        follower.set_times(attack_seconds, release_seconds);
        follower
    }

    pub fn set_times(&mut self, attack_seconds: f32, release_seconds: f32) {
        self.attack_coef = (-1.0 / (attack_seconds.max(1e-4) * self.sample_rate)).exp();
        self.release_coef = (-1.0 / (release_seconds.max(1e-3) * self.sample_rate)).exp();
    }

    /// Feed one rectified sample, get the tracked level (linear).
    #[inline]
    pub fn track(&mut self, level: f32) -> f32 {
        let coef = if level > self.envelope {
            self.attack_coef
        } else {
            self.release_coef
        };
        self.envelope = coef * self.envelope + (1.0 - coef) * level;
        self.envelope
    }

    pub fn level(&self) -> f32 {
        self.envelope
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// The static threshold/ratio/knee curve.
#[derive(Debug, Clone, Copy)]
pub struct GainComputer {
    pub threshold_db: f32,
    pub ratio: f32,
    pub knee_db: f32,
}

impl GainComputer {
    pub fn new(threshold_db: f32, ratio: f32, knee_db: f32) -> Self {
        Self {
            threshold_db: threshold_db.clamp(-60.0, 0.0),
            ratio: ratio.clamp(1.0, f32::INFINITY),
            knee_db: knee_db.clamp(0.0, 40.0),
        }
    }

    /// Gain change (≤ 0 dB) to apply at the given input level.
    #[inline]
    pub fn gain_reduction_db(&self, input_db: f32) -> f32 {
        let slope = 1.0 - 1.0 / self.ratio;

        if self.knee_db <= 0.0 {
            // Hard knee
            if input_db <= self.threshold_db {
                0.0
            } else {
                (self.threshold_db - input_db) * slope
            }
        } else {
            let half_knee = self.knee_db / 2.0;
            let knee_start = self.threshold_db - half_knee;
            let knee_end = self.threshold_db + half_knee;

            if input_db <= knee_start {
                0.0
            } else if input_db >= knee_end {
                (self.threshold_db - input_db) * slope
            } else {
                // Quadratic blend through the knee region
                let x = input_db - knee_start;
                -slope * x * x / (2.0 * self.knee_db)
            }
        }
    }

    /// Output level for a given input level: the transfer curve the
    /// dynamics widget plots.
    #[inline]
    pub fn transfer_point(&self, input_db: f32) -> f32 {
        input_db + self.gain_reduction_db(input_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_conversions_roundtrip() {
        for db in [-60.0f32, -20.0, -6.0, 0.0] {
            let back = linear_to_db(db_to_linear(db));
            assert!((back - db).abs() < 1e-3, "{db} -> {back}");
        }
        assert_eq!(linear_to_db(0.0), -120.0);
    }

    #[test]
    fn below_threshold_is_untouched() {
        let gc = GainComputer::new(-20.0, 4.0, 0.0);
        assert_eq!(gc.gain_reduction_db(-30.0), 0.0);
        assert_eq!(gc.transfer_point(-30.0), -30.0);
    }

    #[test]
    fn four_to_one_above_threshold() {
        let gc = GainComputer::new(-20.0, 4.0, 0.0);
        // 12 dB over threshold: output should rise only 3 dB -> 9 dB cut
        let reduction = gc.gain_reduction_db(-8.0);
        assert!((reduction + 9.0).abs() < 1e-4, "got {reduction}");
        assert!((gc.transfer_point(-8.0) + 17.0).abs() < 1e-4);
    }

    #[test]
    fn infinite_ratio_is_brickwall() {
        let gc = GainComputer::new(-10.0, f32::INFINITY, 0.0);
        assert!((gc.transfer_point(0.0) + 10.0).abs() < 1e-4);
        assert!((gc.transfer_point(-5.0) + 10.0).abs() < 1e-4);
    }

    #[test]
    fn soft_knee_is_continuous_at_edges() {
        let gc = GainComputer::new(-20.0, 4.0, 10.0);
        // Just below knee start: zero; just above: barely anything
        let eps = 0.01;
        let below = gc.gain_reduction_db(-25.0 - eps);
        let entering = gc.gain_reduction_db(-25.0 + eps);
        assert_eq!(below, 0.0);
        assert!(entering.abs() < 0.01, "knee entry should be gentle: {entering}");

        // At knee end the quadratic should meet the straight segment
        let at_end = gc.gain_reduction_db(-15.0);
        let straight = (-20.0f32 - -15.0) * (1.0 - 1.0 / 4.0);
        assert!((at_end - straight).abs() < 0.01, "{at_end} vs {straight}");
    }

    #[test]
    fn follower_attack_is_faster_than_release() {
        let mut follower = EnvelopeFollower::new(48_000.0, 0.001, 0.2);

        // Step up: should reach most of the way within a few ms
        for _ in 0..480 {
            follower.track(1.0);
        }
        assert!(follower.level() > 0.9, "attack too slow: {}", follower.level());

        // Step down: after the same time, still mostly up
        for _ in 0..480 {
            follower.track(0.0);
        }
        assert!(
            follower.level() > 0.5,
            "release should be slow: {}",
            follower.level()
        );
    }
}
