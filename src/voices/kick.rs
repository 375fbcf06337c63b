//! Kick drum fallback voice.
//!
//! A synthesized kick for when the sample fails to load: a sine body with
//! an instant attack and a fast decay, low-passed to keep it smooth. The
//! sequencer triggers it at a low pitch (around C1) so the sine sits in
//! kick territory.

use crate::dsp::biquad::FilterShape;
use crate::dsp::envelope::{AttackCurve, EnvelopeSpec};
use crate::dsp::oscillator::{OscSpec, Waveform};

use super::FallbackVoice;

/// Synthesized kick: punchy, deep, pitch mostly fixed by the trigger note.
pub fn kick() -> FallbackVoice {
    FallbackVoice {
        osc: OscSpec::Wave(Waveform::Sine),
        envelope: EnvelopeSpec {
            attack: 0.001,
            decay: 0.15,
            sustain: 0.0,
            release: 0.05,
            attack_curve: AttackCurve::Linear,
        },
        filter: Some((FilterShape::Lowpass, 200.0, 0.707)),
        trigger_midi: 24, // C1
    }
}
