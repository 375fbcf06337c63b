//! Closed hi-hat fallback voice: a very short burst of high-passed noise.

use crate::dsp::biquad::FilterShape;
use crate::dsp::envelope::{AttackCurve, EnvelopeSpec};
use crate::dsp::oscillator::{OscSpec, Waveform};

use super::FallbackVoice;

pub fn hihat() -> FallbackVoice {
    FallbackVoice {
        osc: OscSpec::Wave(Waveform::Noise),
        envelope: EnvelopeSpec {
            attack: 0.001,
            decay: 0.04,
            sustain: 0.0,
            release: 0.02,
            attack_curve: AttackCurve::Linear,
        },
        filter: Some((FilterShape::Highpass, 7_000.0, 0.707)),
        trigger_midi: 42, // F#2, the GM closed-hat slot
    }
}
