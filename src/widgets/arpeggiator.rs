/*
Arpeggiator Lab
===============

A poly instrument fed by the transport's arpeggio body, with a feedback
delay for the classic broken-chord shimmer. Changing the pitch selection,
octave span, or pattern regenerates the note sequence; the scheduler's
cursor is modulo-clamped into the new length so playback never jumps.
*/

use std::cell::Cell;

use crate::dsp::envelope::{AttackCurve, EnvelopeSpec};
use crate::dsp::oscillator::{OscSpec, Waveform};
use crate::graph::{GraphSpec, NodeId, NodeKind, NodeSpec};
use crate::harness::{ParameterDecl, Widget};
use crate::loader::SampleLoader;
use crate::params::RampPolicy;
use crate::transport::{ArpeggioConfig, LoopBody, Subdivision, TransportProgram};

pub struct ArpeggiatorWidget {
    pub bpm: f64,
    pub config: ArpeggioConfig,
    pub gate: f32,
    instrument: Cell<Option<NodeId>>,
    delay: Cell<Option<NodeId>>,
}

impl ArpeggiatorWidget {
    pub fn new() -> Self {
        Self {
            bpm: 110.0,
            config: ArpeggioConfig::default(),
            gate: 0.6,
            instrument: Cell::new(None),
            delay: Cell::new(None),
        }
    }

    pub fn instrument_node(&self) -> Option<NodeId> {
        self.instrument.get()
    }

    /// Program for the current configuration. Called again after every
    /// selection change; the harness hot-swaps it (same body variant,
    /// or immediately with cursor clamping when requested).
    pub fn current_program(&self) -> TransportProgram {
        TransportProgram::new(
            self.bpm,
            LoopBody::Arpeggio {
                config: self.config.clone(),
                target: self.instrument.get().expect("graph built first"),
                gate: self.gate,
            },
        )
        .with_step_subdivision(Subdivision::Eighth)
    }
}

impl Default for ArpeggiatorWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ArpeggiatorWidget {
    fn name(&self) -> &'static str {
        "arpeggiator"
    }

    fn graph_spec(&self, _loader: &SampleLoader) -> GraphSpec {
        let mut spec = GraphSpec::new();
        let instrument = spec.add_kind(NodeKind::SourcePolyInstrument {
            osc: OscSpec::Wave(Waveform::Triangle),
            envelope: EnvelopeSpec {
                attack: 0.005,
                decay: 0.08,
                sustain: 0.4,
                release: 0.15,
                attack_curve: AttackCurve::Linear,
            },
            max_voices: 8,
        });
        let delay = spec.add(
            NodeSpec::new(NodeKind::Delay)
                .with_param("time", 0.27)
                .with_param("feedback", 0.35)
                .with_param("mix", 0.25),
        );
        let dest = spec.add_kind(NodeKind::Destination);
        spec.chain(&[instrument, delay, dest]);

        self.instrument.set(Some(instrument));
        self.delay.set(Some(delay));
        spec
    }

    fn program(&self) -> Option<TransportProgram> {
        Some(self.current_program())
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        let delay = self.delay.get().expect("graph built first");
        vec![
            ParameterDecl {
                id: "echo",
                node: delay,
                param: "mix",
                min: 0.0,
                max: 1.0,
                default: 0.25,
                ramp: RampPolicy::Smooth,
            },
            ParameterDecl {
                id: "feedback",
                node: delay,
                param: "feedback",
                min: 0.0,
                max: 0.9,
                default: 0.35,
                ramp: RampPolicy::Smooth,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EventAction;
    use crate::harness::WidgetHarness;
    use crate::runtime::{AudioRuntime, UserGesture};
    use crate::sequencing::notes::PitchClass;
    use crate::transport::{ArpPattern, ADVANCE_INTERVAL_SECONDS};

    #[test]
    fn updown_emits_the_expected_note_cycle() {
        let runtime = AudioRuntime::new(48_000);
        let loader = SampleLoader::new();
        let mut widget = ArpeggiatorWidget::new();
        widget.config = ArpeggioConfig {
            pitch_classes: vec![PitchClass::C, PitchClass::E, PitchClass::G],
            base_octave: 4,
            octave_span: 2,
            pattern: ArpPattern::UpDown,
            seed: 1,
        };
        widget.bpm = 120.0;

        let mut harness = WidgetHarness::mount(widget, &runtime, &loader).unwrap();
        harness.play(Some(&UserGesture::from_input_event())).unwrap();

        // Collect enough scheduled note-ons for one full cycle + wrap
        let mut midis = Vec::new();
        let mut now = 0.0;
        while midis.len() < 11 && now < 10.0 {
            harness.update(now);
            for event in harness.take_due_events() {
                if let EventAction::NoteOn { midi, .. } = event.action {
                    midis.push(midi);
                }
            }
            now += ADVANCE_INTERVAL_SECONDS;
        }

        // C4 E4 G4 C5 E5 G5 E5 C5 G4 E4, then C4 again
        assert_eq!(
            &midis[..11],
            &[60, 64, 67, 72, 76, 79, 76, 72, 67, 64, 60]
        );
    }

    #[test]
    fn regeneration_clamps_the_cursor() {
        let runtime = AudioRuntime::new(48_000);
        let loader = SampleLoader::new();
        let widget = ArpeggiatorWidget::new();
        let mut harness = WidgetHarness::mount(widget, &runtime, &loader).unwrap();
        harness.play(Some(&UserGesture::from_input_event())).unwrap();

        // Walk most of a long cycle, then shrink the selection hard
        let mut now = 0.0;
        while now < 1.0 {
            harness.update(now);
            harness.take_due_events();
            now += ADVANCE_INTERVAL_SECONDS;
        }

        let short = TransportProgram::new(
            120.0,
            LoopBody::Arpeggio {
                config: ArpeggioConfig {
                    pitch_classes: vec![PitchClass::C],
                    base_octave: 4,
                    octave_span: 1,
                    pattern: ArpPattern::Up,
                    seed: 1,
                },
                target: harness.widget().instrument_node().unwrap(),
                gate: 0.5,
            },
        );
        harness.schedule_program_immediate(short);
        assert_eq!(
            harness.transport().position().step,
            0,
            "cursor clamped modulo the one-note loop"
        );
    }
}
