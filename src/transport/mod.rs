//! Tempo-synchronous scheduling: programs, arpeggio generation, and the
//! look-ahead transport.

pub mod arpeggio;
pub mod program;
pub mod scheduler;

pub use arpeggio::{ArpPattern, ArpeggioConfig, NoteSequence};
pub use program::{LoopBody, Subdivision, TrackTarget, TransportProgram};
pub use scheduler::{
    Transport, TransportPosition, TransportState, VisualTick, ADVANCE_INTERVAL_SECONDS,
    LOOKAHEAD_SECONDS,
};
