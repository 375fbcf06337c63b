//! Musical naming and pattern data: pitches, intervals, keyboard mapping,
//! and the step-sequencer grid.

pub mod keymap;
pub mod notes;
pub mod pattern;

pub use keymap::{note_for_key, KeyboardLayout};
pub use notes::{midi_to_freq, Interval, NoteName, PitchClass};
pub use pattern::StepPattern;
