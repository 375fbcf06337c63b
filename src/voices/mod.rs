//! Synthesized drum fallback voices.
//!
//! The drum sequencer prefers decoded samples; when a sample's load
//! fails, the affected track falls back to one of these voices — fully,
//! never blended with a partially-loaded sample, so a given load outcome
//! always sounds the same.
//!
//! A fallback voice is declarative: an oscillator + envelope for a
//! one-voice poly instrument, optionally followed by a filter. The
//! sequencer widget expands it into graph nodes.

mod hihat;
mod kick;
mod snare;

pub use hihat::hihat;
pub use kick::kick;
pub use snare::snare;

use crate::dsp::biquad::FilterShape;
use crate::dsp::envelope::EnvelopeSpec;
use crate::dsp::oscillator::OscSpec;
use crate::graph::{GraphSpec, NodeId, NodeKind, NodeSpec};

/// A declarative drum voice: poly-instrument config plus tone filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackVoice {
    pub osc: OscSpec,
    pub envelope: EnvelopeSpec,
    /// (shape, cutoff Hz, Q) applied after the instrument, if any.
    pub filter: Option<(FilterShape, f32, f32)>,
    /// The MIDI note the sequencer should trigger this voice with.
    pub trigger_midi: u8,
}

impl FallbackVoice {
    /// Add this voice to a graph spec, returning (instrument, chain tail).
    /// The tail is what should be wired toward the destination.
    pub fn add_to(&self, spec: &mut GraphSpec) -> (NodeId, NodeId) {
        let instrument = spec.add_kind(NodeKind::SourcePolyInstrument {
            osc: self.osc.clone(),
            envelope: self.envelope,
            max_voices: 4,
        });
        match self.filter {
            Some((shape, cutoff, q)) => {
                let filter = spec.add(
                    NodeSpec::new(NodeKind::Filter { shape })
                        .with_param("frequency", cutoff)
                        .with_param("q", q),
                );
                spec.connect(instrument, filter);
                (instrument, filter)
            }
            None => (instrument, instrument),
        }
    }
}
