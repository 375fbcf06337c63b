/*
Parameter Smoothing
===================

Jumping an audio parameter between two values produces a discontinuity in
the output signal — audible as a click or, on a moving slider, "zipper"
noise. Every live-controllable parameter in the engine is therefore stored
as a `Smoothed` value that glides from its current value to a new target
over a short ramp.

Ramp kinds:

  Step          Jump immediately. Used for values the ear cannot hear move
                (step-sequencer cells, enum-like selections).

  Linear        current += increment each sample. The default for gains,
                mixes, and positions. ~15 ms is short enough to feel
                instant and long enough to avoid clicks.

  Exponential   current *= factor each sample. Frequency-like parameters
                are perceived logarithmically, so an exponential glide
                sounds constant-speed. Targets are floored away from zero
                because an exponential can never reach or cross it.
*/

/// Default ramp length for sub-audible parameter changes.
pub const DEFAULT_RAMP_SECONDS: f32 = 0.015;

/// Smallest magnitude an exponential ramp will work with.
const EXP_FLOOR: f32 = 1.0e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampKind {
    Step,
    Linear,
    Exponential,
}

/// A parameter value that approaches its target over a configured ramp.
#[derive(Debug, Clone)]
pub struct Smoothed {
    current: f32,
    target: f32,
    /// Per-sample linear increment or exponential factor.
    step: f32,
    remaining: u32,
    kind: RampKind,
}

impl Smoothed {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
            kind: RampKind::Step,
        }
    }

    /// Begin a ramp toward `target` lasting `ramp_samples` samples.
    pub fn set_target(&mut self, target: f32, kind: RampKind, ramp_samples: u32) {
        if kind == RampKind::Step || ramp_samples == 0 {
            self.jump_to(target);
            return;
        }

        self.kind = kind;
        self.remaining = ramp_samples;

        match kind {
            RampKind::Linear => {
                self.target = target;
                self.step = (target - self.current) / ramp_samples as f32;
            }
            RampKind::Exponential => {
                // An exponential ramp cannot pass through zero; clamp both
                // endpoints away from it, preserving sign.
                let sign = if target < 0.0 || (target == 0.0 && self.current < 0.0) {
                    -1.0
                } else {
                    1.0
                };
                let from = (self.current * sign).max(EXP_FLOOR);
                let to = (target * sign).max(EXP_FLOOR);
                self.current = from * sign;
                self.target = to * sign;
                self.step = (to / from).powf(1.0 / ramp_samples as f32);
            }
            RampKind::Step => unreachable!(),
        }
    }

    /// Set the value with no ramp at all.
    pub fn jump_to(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.remaining = 0;
        self.kind = RampKind::Step;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            match self.kind {
                RampKind::Linear => self.current += self.step,
                RampKind::Exponential => self.current *= self.step,
                RampKind::Step => {}
            }
            self.remaining -= 1;
            if self.remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Advance `frames` samples at once, returning the value at the end.
    ///
    /// For parameters that are read once per block rather than per sample.
    pub fn advance(&mut self, frames: u32) -> f32 {
        if self.remaining == 0 {
            return self.current;
        }
        let n = frames.min(self.remaining);
        match self.kind {
            RampKind::Linear => self.current += self.step * n as f32,
            RampKind::Exponential => self.current *= self.step.powi(n as i32),
            RampKind::Step => {}
        }
        self.remaining -= n;
        if self.remaining == 0 {
            self.current = self.target;
        }
        self.current
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }
}
