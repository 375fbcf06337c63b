/*
Audio Oscillators
=================

The fundamental sound sources. Each oscillator produces one cycle-repeating
waveform at a requested frequency:

  Sine      Fundamental only. Pure, hollow. Sub-bass, test tones.
  Sawtooth  All harmonics at 1/n. Bright and buzzy. Leads, basses.
  Square    Odd harmonics at 1/n. Hollow, woody. Chiptune, sub-bass.
  Triangle  Odd harmonics at 1/n². Soft, flute-like.
  Noise     No pitch at all. Percussion, wind, texture.

Beyond the named shapes, a *partial series* oscillator sums sine harmonics
with explicit per-partial amplitudes, which is how the poly instrument
realizes "organ" style registrations.

Noise is generated from a seeded PRNG so that two oscillators constructed
the same way produce the same sample stream — offline renders depend on
this for bit-identical output.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    Noise,
}

/// What an oscillator should produce: a named shape or a partial series.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum OscSpec {
    Wave(Waveform),
    /// Relative amplitude of harmonic 1, 2, 3, ... Normalized on use.
    Partials(Vec<f32>),
}

impl Default for OscSpec {
    fn default() -> Self {
        OscSpec::Wave(Waveform::Sine)
    }
}

const NOISE_SEED: u64 = 0x746f_6e65_6c61_62; // stable across runs

pub struct Oscillator {
    spec: OscSpec,
    /// Phase in cycles, [0, 1). f64 keeps long renders from drifting.
    phase: f64,
    rng: fastrand::Rng,
    /// Precomputed 1/sum(|partials|) for the partial series.
    partial_norm: f32,
}

impl Oscillator {
    pub fn new(spec: OscSpec) -> Self {
        let partial_norm = match &spec {
            OscSpec::Partials(amps) => {
                let sum: f32 = amps.iter().map(|a| a.abs()).sum();
                if sum > 0.0 {
                    1.0 / sum
                } else {
                    0.0
                }
            }
            OscSpec::Wave(_) => 1.0,
        };

        Self {
            spec,
            phase: 0.0,
            rng: fastrand::Rng::with_seed(NOISE_SEED),
            partial_norm,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscSpec::Wave(Waveform::Sine))
    }

    pub fn spec(&self) -> &OscSpec {
        &self.spec
    }

    /// Restart the waveform from phase zero (and reseed noise).
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.rng = fastrand::Rng::with_seed(NOISE_SEED);
    }

    /// Produce the next sample at `frequency` Hz.
    #[inline]
    pub fn next(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let phase = self.phase as f32;
        let out = match &self.spec {
            OscSpec::Wave(Waveform::Sine) => (std::f32::consts::TAU * phase).sin(),
            OscSpec::Wave(Waveform::Square) => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscSpec::Wave(Waveform::Sawtooth) => 2.0 * phase - 1.0,
            OscSpec::Wave(Waveform::Triangle) => {
                // 0→1→0→-1→0 over one cycle
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            OscSpec::Wave(Waveform::Noise) => self.rng.f32() * 2.0 - 1.0,
            OscSpec::Partials(amps) => {
                let mut acc = 0.0f32;
                for (i, &amp) in amps.iter().enumerate() {
                    let harmonic = (i + 1) as f32;
                    // Skip partials above Nyquist
                    if frequency * harmonic < sample_rate * 0.5 {
                        acc += amp * (std::f32::consts::TAU * phase * harmonic).sin();
                    }
                }
                acc * self.partial_norm
            }
        };

        self.phase += (frequency / sample_rate) as f64;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        out
    }

    /// Fill a buffer, overwriting it.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next(frequency, sample_rate);
        }
    }
}
