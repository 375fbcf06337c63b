//! Transport programs: what the scheduler plays each step.
//!
//! A program owns the musical configuration (tempo, swing, loop length)
//! plus a loop body — step grid, arpeggio, or metronome — bound to the
//! graph nodes it triggers. Programs are plain data; the scheduler holds
//! the cursor and the clock.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::sequencing::pattern::StepPattern;
use crate::transport::arpeggio::ArpeggioConfig;

/// Rhythmic grid spacing, in fractions of a quarter-note beat.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subdivision {
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl Subdivision {
    /// Length of one step at this subdivision, in beats.
    pub fn beats(self) -> f64 {
        match self {
            Subdivision::Quarter => 1.0,
            Subdivision::Eighth => 0.5,
            Subdivision::Sixteenth => 0.25,
            Subdivision::ThirtySecond => 0.125,
        }
    }
}

/// One drum-sequencer lane: the node it triggers and the pitch to send.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackTarget {
    pub node: NodeId,
    pub midi: u8,
}

/// What plays on each step of the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopBody {
    /// Step-sequencer grid; `tracks[i]` receives row `i`'s hits.
    Steps {
        pattern: StepPattern,
        tracks: Vec<TrackTarget>,
    },
    /// Arpeggiated note sequence into one instrument.
    Arpeggio {
        config: ArpeggioConfig,
        target: NodeId,
        /// Fraction of a step the note is held, (0, 1].
        gate: f32,
    },
    /// Metronome clicks: accented on the bar downbeat.
    Metronome {
        target: NodeId,
        beats_per_bar: usize,
        accent_midi: u8,
        click_midi: u8,
    },
}

impl LoopBody {
    /// Steps per loop cycle.
    pub fn step_count(&self) -> usize {
        match self {
            LoopBody::Steps { pattern, .. } => pattern.steps_per_bar(),
            LoopBody::Arpeggio { config, .. } => {
                // Length of the generated sequence without generating it:
                // regenerated sequences are cached by the scheduler.
                let classes = {
                    let mut c = config.pitch_classes.clone();
                    c.sort_by_key(|pc| pc.semitone());
                    c.dedup();
                    c.len()
                };
                let up = classes * config.octave_span.max(1) as usize;
                match config.pattern {
                    crate::transport::arpeggio::ArpPattern::UpDown if up > 2 => up * 2 - 2,
                    _ => up,
                }
            }
            LoopBody::Metronome { beats_per_bar, .. } => (*beats_per_bar).max(1),
        }
    }

    /// Whether two bodies are the same variant (program swaps between
    /// variants restart the transport; within a variant they hot-swap).
    pub fn same_variant(&self, other: &LoopBody) -> bool {
        matches!(
            (self, other),
            (LoopBody::Steps { .. }, LoopBody::Steps { .. })
                | (LoopBody::Arpeggio { .. }, LoopBody::Arpeggio { .. })
                | (LoopBody::Metronome { .. }, LoopBody::Metronome { .. })
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportProgram {
    pub bpm: f64,
    /// 0 = straight, 1 = maximum shuffle.
    pub swing: f32,
    pub swing_subdivision: Subdivision,
    /// Grid spacing of the loop body's steps.
    pub step_subdivision: Subdivision,
    pub body: LoopBody,
}

impl TransportProgram {
    pub fn new(bpm: f64, body: LoopBody) -> Self {
        Self {
            bpm: bpm.clamp(20.0, 300.0),
            swing: 0.0,
            swing_subdivision: Subdivision::Eighth,
            step_subdivision: Subdivision::Sixteenth,
            body,
        }
    }

    pub fn with_swing(mut self, amount: f32, subdivision: Subdivision) -> Self {
        self.swing = amount.clamp(0.0, 1.0);
        self.swing_subdivision = subdivision;
        self
    }

    pub fn with_step_subdivision(mut self, subdivision: Subdivision) -> Self {
        self.step_subdivision = subdivision;
        self
    }

    /// Seconds per step at this program's tempo.
    pub fn step_seconds(&self) -> f64 {
        60.0 / self.bpm * self.step_subdivision.beats()
    }

    /// Loop length in beats.
    pub fn loop_beats(&self) -> f64 {
        self.body.step_count() as f64 * self.step_subdivision.beats()
    }

    /// Swing delay applied to odd-indexed steps, in seconds: the odd step
    /// slides from the pair's midpoint toward the triplet position, i.e.
    /// swing × (step / 3) at the configured subdivision.
    pub fn swing_delay_seconds(&self) -> f64 {
        let subdivision_seconds = 60.0 / self.bpm * self.swing_subdivision.beats();
        self.swing as f64 * subdivision_seconds / 3.0
    }
}
