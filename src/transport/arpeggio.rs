/*
Arpeggio Generation
===================

Turns a pitch-class selection into the note list the transport walks:

    selected {C, E, G}, base octave 4, span 2
      up       C4 E4 G4 C5 E5 G5
      down     G5 E5 C5 G4 E4 C4
      up-down  C4 E4 G4 C5 E5 G5 E5 C5 G4 E4   (peak and floor played once)
      random   a seeded Fisher-Yates shuffle of the up list

Up-down drops both the peak (when turning around) and the floor (when the
loop wraps), so no note doubles at either seam.

Random is deterministic per seed. The widget reseeds on every
regeneration; tests and offline renders pin the seed.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sequencing::notes::{NoteName, PitchClass};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpPattern {
    Up,
    Down,
    UpDown,
    Random,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ArpeggioConfig {
    pub pitch_classes: Vec<PitchClass>,
    pub base_octave: i8,
    pub octave_span: u8,
    pub pattern: ArpPattern,
    pub seed: u64,
}

impl Default for ArpeggioConfig {
    fn default() -> Self {
        Self {
            pitch_classes: vec![PitchClass::C, PitchClass::E, PitchClass::G],
            base_octave: 4,
            octave_span: 1,
            pattern: ArpPattern::Up,
            seed: 1,
        }
    }
}

/// The generated, ordered note list the scheduler's cursor walks.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSequence {
    notes: Vec<NoteName>,
}

impl NoteSequence {
    pub fn generate(config: &ArpeggioConfig) -> Self {
        let mut classes = config.pitch_classes.clone();
        classes.sort_by_key(|class| class.semitone());
        classes.dedup();

        let span = config.octave_span.max(1);
        let mut up: Vec<NoteName> = Vec::with_capacity(classes.len() * span as usize);
        for octave_offset in 0..span {
            for &class in &classes {
                up.push(NoteName::new(class, config.base_octave + octave_offset as i8));
            }
        }

        let notes = match config.pattern {
            ArpPattern::Up => up,
            ArpPattern::Down => {
                let mut down = up;
                down.reverse();
                down
            }
            ArpPattern::UpDown => {
                if up.len() <= 2 {
                    up
                } else {
                    // Append the reverse without its endpoints: the peak
                    // already played on the way up, the floor plays again
                    // when the sequence repeats.
                    let tail: Vec<NoteName> =
                        up[1..up.len() - 1].iter().rev().copied().collect();
                    let mut combined = up;
                    combined.extend(tail);
                    combined
                }
            }
            ArpPattern::Random => {
                let mut shuffled = up;
                let mut rng = fastrand::Rng::with_seed(config.seed);
                // Fisher-Yates
                for i in (1..shuffled.len()).rev() {
                    let j = rng.usize(0..=i);
                    shuffled.swap(i, j);
                }
                shuffled
            }
        };

        Self { notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn note(&self, index: usize) -> Option<NoteName> {
        if self.notes.is_empty() {
            None
        } else {
            Some(self.notes[index % self.notes.len()])
        }
    }

    pub fn notes(&self) -> &[NoteName] {
        &self.notes
    }
}
