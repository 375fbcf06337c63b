/*
Interval Trainer
================

Ear training: the widget plays a root note, then the note an interval
above it, and the keyboard view highlights whichever note is sounding.
The audio side is a small poly-instrument graph; the quiz logic is a pure
timeline so the whole exercise is testable without rendering audio:

    t in [0, 1)   root sounds, root highlighted
    t in [1, 2)   target sounds, target highlighted
    t >= 2.5      all highlights cleared

Highlighting is keyed by MIDI number, so enharmonic spellings of the same
pitch highlight the same key.
*/

use std::cell::Cell;

use crate::dsp::envelope::{AttackCurve, EnvelopeSpec};
use crate::dsp::oscillator::OscSpec;
use crate::graph::{EventAction, GraphSpec, NodeId, NodeKind, ScheduledEvent};
use crate::harness::{ParameterDecl, Widget};
use crate::loader::SampleLoader;
use crate::params::RampPolicy;
use crate::sequencing::notes::{Interval, NoteName};

/// Seconds each note of the pair is held.
pub const NOTE_SECONDS: f64 = 1.0;
/// Seconds after the start at which highlights clear.
pub const CLEAR_AT_SECONDS: f64 = 2.5;

/// The pure quiz timeline: which notes play when, what is highlighted.
#[derive(Debug, Clone)]
pub struct IntervalExercise {
    pub root: NoteName,
    pub interval: Interval,
}

impl IntervalExercise {
    pub fn new(root: NoteName, interval: Interval) -> Self {
        Self { root, interval }
    }

    pub fn target(&self) -> NoteName {
        self.root.transposed(self.interval.semitones() as i16)
    }

    /// The notes in playback order.
    pub fn played(&self) -> [NoteName; 2] {
        [self.root, self.target()]
    }

    /// The note highlighted at `elapsed` seconds after playback began.
    pub fn highlighted_at(&self, elapsed: f64) -> Option<NoteName> {
        if (0.0..NOTE_SECONDS).contains(&elapsed) {
            Some(self.root)
        } else if (NOTE_SECONDS..2.0 * NOTE_SECONDS).contains(&elapsed) {
            Some(self.target())
        } else {
            None
        }
    }

    /// Whether the key for `note` should light at `elapsed`. Compares by
    /// MIDI number: G#4 and Ab4 light the same key.
    pub fn is_highlighted(&self, note: NoteName, elapsed: f64) -> bool {
        if elapsed >= CLEAR_AT_SECONDS {
            return false;
        }
        self.highlighted_at(elapsed)
            .map(|current| current.midi() == note.midi())
            .unwrap_or(false)
    }

    /// Audio events for one playback starting at `start` seconds.
    pub fn events(&self, target_node: NodeId, start: f64, sample_rate: f32) -> Vec<ScheduledEvent> {
        let frame = |t: f64| ((start + t) * sample_rate as f64) as u64;
        let [root, second] = self.played();
        vec![
            ScheduledEvent {
                frame: frame(0.0),
                node: target_node,
                action: EventAction::NoteOn {
                    midi: root.midi(),
                    velocity: 1.0,
                },
            },
            ScheduledEvent {
                frame: frame(NOTE_SECONDS),
                node: target_node,
                action: EventAction::NoteOff { midi: root.midi() },
            },
            ScheduledEvent {
                frame: frame(NOTE_SECONDS),
                node: target_node,
                action: EventAction::NoteOn {
                    midi: second.midi(),
                    velocity: 1.0,
                },
            },
            ScheduledEvent {
                frame: frame(2.0 * NOTE_SECONDS),
                node: target_node,
                action: EventAction::NoteOff {
                    midi: second.midi(),
                },
            },
        ]
    }
}

pub struct IntervalTrainerWidget {
    pub exercise: IntervalExercise,
    instrument: Cell<Option<NodeId>>,
    gain: Cell<Option<NodeId>>,
}

impl IntervalTrainerWidget {
    pub fn new(exercise: IntervalExercise) -> Self {
        Self {
            exercise,
            instrument: Cell::new(None),
            gain: Cell::new(None),
        }
    }

    pub fn instrument(&self) -> Option<NodeId> {
        self.instrument.get()
    }
}

impl Widget for IntervalTrainerWidget {
    fn name(&self) -> &'static str {
        "interval-trainer"
    }

    fn graph_spec(&self, _loader: &SampleLoader) -> GraphSpec {
        let mut spec = GraphSpec::new();
        let instrument = spec.add_kind(NodeKind::SourcePolyInstrument {
            osc: OscSpec::default(),
            envelope: EnvelopeSpec {
                attack: 0.01,
                decay: 0.05,
                sustain: 0.8,
                release: 0.2,
                attack_curve: AttackCurve::Exponential,
            },
            max_voices: 4,
        });
        let gain = spec.add_kind(NodeKind::Gain);
        let dest = spec.add_kind(NodeKind::Destination);
        spec.chain(&[instrument, gain, dest]);

        self.instrument.set(Some(instrument));
        self.gain.set(Some(gain));
        spec
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        vec![ParameterDecl {
            id: "volume",
            node: self.gain.get().expect("graph built first"),
            param: "gain",
            min: 0.0,
            max: 1.0,
            default: 0.8,
            ramp: RampPolicy::Smooth,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::notes::PitchClass;

    fn perfect_fifth_from_c4() -> IntervalExercise {
        IntervalExercise::new(NoteName::new(PitchClass::C, 4), Interval::PerfectFifth)
    }

    #[test]
    fn perfect_fifth_of_c4_is_g4() {
        let exercise = perfect_fifth_from_c4();
        assert_eq!(exercise.target().to_string(), "G4");
        let played: Vec<String> = exercise.played().iter().map(|n| n.to_string()).collect();
        assert_eq!(played, ["C4", "G4"]);
    }

    #[test]
    fn highlight_timeline_follows_the_notes() {
        let exercise = perfect_fifth_from_c4();
        let c4 = NoteName::new(PitchClass::C, 4);
        let g4 = NoteName::new(PitchClass::G, 4);

        // [0, 1): root alone
        assert!(exercise.is_highlighted(c4, 0.5));
        assert!(!exercise.is_highlighted(g4, 0.5));
        // [1, 2): target alone
        assert!(!exercise.is_highlighted(c4, 1.5));
        assert!(exercise.is_highlighted(g4, 1.5));
        // At 2.5 s everything is cleared
        assert!(!exercise.is_highlighted(c4, 2.5));
        assert!(!exercise.is_highlighted(g4, 2.5));
    }

    #[test]
    fn enharmonic_spellings_highlight_together() {
        let exercise = IntervalExercise::new(
            NoteName::new(PitchClass::C, 4),
            Interval::MinorSixth, // C4 + 8 = G#4
        );
        let gs4: NoteName = "G#4".parse().unwrap();
        let ab4: NoteName = "Ab4".parse().unwrap();
        assert_eq!(
            exercise.is_highlighted(gs4, 1.5),
            exercise.is_highlighted(ab4, 1.5),
            "equal MIDI numbers highlight identically"
        );
        assert!(exercise.is_highlighted(ab4, 1.5));
    }

    #[test]
    fn events_space_the_notes_a_second_apart() {
        let exercise = perfect_fifth_from_c4();
        let events = exercise.events(NodeId(7), 0.0, 48_000.0);

        assert_eq!(events.len(), 4);
        assert_eq!(events[0].frame, 0);
        assert_eq!(events[2].frame, 48_000, "second note at 1.0 s");
        match (&events[0].action, &events[2].action) {
            (
                EventAction::NoteOn { midi: first, .. },
                EventAction::NoteOn { midi: second, .. },
            ) => {
                assert_eq!(*first, 60);
                assert_eq!(*second, 67);
            }
            other => panic!("unexpected actions {other:?}"),
        }
    }
}
