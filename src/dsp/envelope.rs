/*
ADSR Envelope
=============

The amplitude shaper for every triggered sound in the engine.

  level       Current output value (0.0 to 1.0), multiplied into the signal.
  stage       Idle, Attack, Decay, Sustain, or Release. A state machine
              governs transitions.
  gate        note_on drives the gate high (Attack); note_off drives it low
              (Release from wherever we are).

The attack segment supports two curves:

  Linear        level rises in a straight line. Punchy, predictable.
  Exponential   level rises along 1 - e^(-kt). Softer onset; matches how
                ears expect acoustic attacks to bloom.

Decay and release are always linear ramps. Release starts from the CURRENT
level rather than the sustain level, so releasing mid-attack cannot click.
The release ramp snapshots its start level and total samples at note_off
time and interpolates, guaranteeing it lands exactly on 0.0.
*/

use crate::MIN_TIME;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackCurve {
    Linear,
    Exponential,
}

/// The envelope shape, as declared by a widget.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSpec {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub attack_curve: AttackCurve,
}

impl Default for EnvelopeSpec {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
            attack_curve: AttackCurve::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Envelope {
    spec: EnvelopeSpec,
    sample_rate: f32,

    stage: Stage,
    level: f32,

    // Release bookkeeping: snapshot at note_off for exact landing.
    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new(sample_rate: f32, spec: EnvelopeSpec) -> Self {
        Self {
            spec: EnvelopeSpec {
                attack: spec.attack.max(MIN_TIME),
                decay: spec.decay.max(MIN_TIME),
                sustain: spec.sustain.clamp(0.0, 1.0),
                release: spec.release.max(MIN_TIME),
                attack_curve: spec.attack_curve,
            },
            sample_rate,
            stage: Stage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    pub fn adsr(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self::new(
            sample_rate,
            EnvelopeSpec {
                attack,
                decay,
                sustain,
                release,
                attack_curve: AttackCurve::Linear,
            },
        )
    }

    pub fn note_on(&mut self) {
        self.stage = Stage::Attack;
        // Retrigger continues from the current level; no reset to zero,
        // which would click on fast repeated notes.
    }

    pub fn note_off(&mut self) {
        if matches!(self.stage, Stage::Idle | Stage::Release) {
            return;
        }
        self.stage = Stage::Release;
        self.release_start_level = self.level;
        self.release_total_samples =
            ((self.spec.release * self.sample_rate) as u32).max(1);
        self.release_elapsed_samples = 0;
    }

    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn next_level(&mut self) -> f32 {
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                match self.spec.attack_curve {
                    AttackCurve::Linear => {
                        let increment = 1.0 / (self.spec.attack * self.sample_rate);
                        self.level += increment;
                    }
                    AttackCurve::Exponential => {
                        // One-pole toward a target slightly above 1.0 so the
                        // curve actually arrives instead of approaching forever.
                        let coef =
                            (-1.0 / (self.spec.attack * self.sample_rate * 0.3)).exp();
                        self.level = 1.05 - (1.05 - self.level) * coef;
                    }
                }
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                let increment =
                    (1.0 - self.spec.sustain) / (self.spec.decay * self.sample_rate);
                self.level -= increment;
                if self.level <= self.spec.sustain {
                    self.level = self.spec.sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {
                self.level = self.spec.sustain;
                // Zero-sustain envelopes (drum hits) end here.
                if self.spec.sustain <= 0.0 {
                    self.stage = Stage::Idle;
                }
            }
            Stage::Release => {
                self.release_elapsed_samples += 1;
                let t = self.release_elapsed_samples as f32
                    / self.release_total_samples as f32;
                self.level = self.release_start_level * (1.0 - t);
                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }

    /// Multiply the envelope into a buffer in place.
    pub fn process_multiply(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample *= self.next_level();
        }
    }
}
