//! Snare drum fallback voice.
//!
//! Real snares are a drum head plus wire rattle; with one oscillator per
//! fallback voice we lean on the rattle: noise through a band-pass around
//! 3 kHz with a snappy envelope reads as "snare" in a pattern context.

use crate::dsp::biquad::FilterShape;
use crate::dsp::envelope::{AttackCurve, EnvelopeSpec};
use crate::dsp::oscillator::{OscSpec, Waveform};

use super::FallbackVoice;

pub fn snare() -> FallbackVoice {
    FallbackVoice {
        osc: OscSpec::Wave(Waveform::Noise),
        envelope: EnvelopeSpec {
            attack: 0.001,
            decay: 0.12,
            sustain: 0.0,
            release: 0.08,
            attack_curve: AttackCurve::Linear,
        },
        filter: Some((FilterShape::Bandpass, 3_000.0, 1.2)),
        trigger_midi: 38, // D2, the GM snare slot
    }
}
