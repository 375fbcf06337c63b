/*
Polyphonic Instrument Node
==========================

The keyboard-facing source: a pool of voices, each an oscillator shaped by
an ADSR envelope. Voice allocation follows the classic two-pass strategy:

  1. take any free voice;
  2. otherwise steal the OLDEST voice that is already releasing.

If every voice is still held, the new note is dropped — stealing a held
note sounds worse than missing one.

Held-pitch invariant: attacking a pitch that is already held releases the
old voice first, then attacks a fresh one, so the set of sounding pitches
never contains duplicates. `release` only touches voices in the held
state; a pitch can therefore be re-attacked while its previous voice is
still ringing out.
*/

use crate::dsp::envelope::{Envelope, EnvelopeSpec};
use crate::dsp::oscillator::{OscSpec, Oscillator};
use crate::dsp::smoother::Smoothed;
use crate::graph::node::{Ramp, RenderCtx};
use crate::sequencing::notes::midi_to_freq;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceState {
    Free,
    Held,
    Releasing,
}

struct PolyVoice {
    osc: Oscillator,
    envelope: Envelope,
    midi: u8,
    velocity: f32,
    state: VoiceState,
    age: u64,
}

impl PolyVoice {
    fn new(sample_rate: f32, osc: &OscSpec, envelope: EnvelopeSpec) -> Self {
        Self {
            osc: Oscillator::new(osc.clone()),
            envelope: Envelope::new(sample_rate, envelope),
            midi: 0,
            velocity: 0.0,
            state: VoiceState::Free,
            age: 0,
        }
    }

    fn start(&mut self, midi: u8, velocity: f32, age: u64) {
        self.midi = midi;
        self.velocity = velocity;
        self.state = VoiceState::Held;
        self.age = age;
        self.osc.reset();
        self.envelope.note_on();
    }

    fn release(&mut self) {
        if self.state == VoiceState::Held {
            self.state = VoiceState::Releasing;
            self.envelope.note_off();
        }
    }

    fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }
}

pub struct PolyInstrument {
    voices: Vec<PolyVoice>,
    level: Smoothed,
    sample_rate: f32,
    clock: u64,
}

impl PolyInstrument {
    pub fn new(
        sample_rate: f32,
        osc: &OscSpec,
        envelope: EnvelopeSpec,
        max_voices: usize,
    ) -> Self {
        let voices = (0..max_voices.max(1))
            .map(|_| PolyVoice::new(sample_rate, osc, envelope))
            .collect();
        Self {
            voices,
            level: Smoothed::new(0.5),
            sample_rate,
            clock: 0,
        }
    }

    pub fn attack(&mut self, midi: u8, velocity: f32) {
        // Held pitches are a set: re-attack releases the old voice first.
        if let Some(voice) = self
            .voices
            .iter_mut()
            .find(|v| v.midi == midi && v.state == VoiceState::Held)
        {
            voice.release();
        }

        self.clock += 1;
        let age = self.clock;
        if let Some(voice) = self.allocate_voice() {
            voice.start(midi, velocity, age);
        } else {
            tracing::debug!(midi, "voice pool exhausted; note dropped");
        }
    }

    pub fn release(&mut self, midi: u8) {
        if let Some(voice) = self
            .voices
            .iter_mut()
            .find(|v| v.midi == midi && v.state == VoiceState::Held)
        {
            voice.release();
        }
    }

    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    /// Pitches currently held (not yet released), ascending.
    pub fn held_pitches(&self) -> Vec<u8> {
        let mut held: Vec<u8> = self
            .voices
            .iter()
            .filter(|v| v.state == VoiceState::Held)
            .map(|v| v.midi)
            .collect();
        held.sort_unstable();
        held
    }

    pub fn sounding_voices(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    fn allocate_voice(&mut self) -> Option<&mut PolyVoice> {
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return Some(&mut self.voices[idx]);
        }

        // Steal the oldest releasing voice
        self.voices
            .iter_mut()
            .filter(|v| v.state == VoiceState::Releasing)
            .min_by_key(|v| v.age)
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "level" => {
                self.level
                    .set_target(value.clamp(0.0, 1.0), ramp.kind, ramp.samples);
                true
            }
            _ => false,
        }
    }

    pub fn process_add(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        for voice in &mut self.voices {
            if voice.is_free() {
                continue;
            }
            let freq = midi_to_freq(voice.midi);
            let velocity_gain = voice.velocity;

            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                let env = voice.envelope.next_level();
                let sample = voice.osc.next(freq, self.sample_rate) * env * velocity_gain;
                *l += sample;
                *r += sample;
            }

            if voice.state == VoiceState::Releasing && !voice.envelope.is_active() {
                voice.state = VoiceState::Free;
            }
        }

        // Master level applied after the voice sum
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let level = self.level.next();
            *l *= level;
            *r *= level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn instrument(max_voices: usize) -> PolyInstrument {
        PolyInstrument::new(
            SR,
            &OscSpec::default(),
            EnvelopeSpec {
                attack: 0.001,
                decay: 0.05,
                sustain: 0.7,
                release: 0.05,
                attack_curve: crate::dsp::envelope::AttackCurve::Linear,
            },
            max_voices,
        )
    }

    fn run(poly: &mut PolyInstrument, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0f32; frames];
        let mut right = vec![0.0f32; frames];
        poly.process_add(&mut left, &mut right, &RenderCtx::new(SR, 0));
        (left, right)
    }

    #[test]
    fn attack_produces_sound_release_ends_it() {
        let mut poly = instrument(8);
        poly.attack(60, 1.0);

        let (left, _) = run(&mut poly, 512);
        assert!(left.iter().any(|&s| s.abs() > 0.01), "held note is audible");

        poly.release(60);
        // Render past the release tail
        run(&mut poly, 48_00);
        assert_eq!(poly.sounding_voices(), 0, "voice frees after release");
    }

    #[test]
    fn retrigger_of_held_pitch_keeps_set_semantics() {
        let mut poly = instrument(8);
        poly.attack(64, 1.0);
        poly.attack(64, 1.0);

        assert_eq!(
            poly.held_pitches(),
            vec![64],
            "a pitch can be held at most once"
        );
    }

    #[test]
    fn chord_is_polyphonic() {
        let mut poly = instrument(8);
        poly.attack(60, 1.0);
        poly.attack(64, 1.0);
        poly.attack(67, 1.0);
        assert_eq!(poly.held_pitches(), vec![60, 64, 67]);
    }

    #[test]
    fn release_all_clears_held_set() {
        let mut poly = instrument(8);
        poly.attack(60, 1.0);
        poly.attack(67, 1.0);
        poly.release_all();
        assert!(poly.held_pitches().is_empty());
    }

    #[test]
    fn stealing_prefers_oldest_releasing_voice() {
        let mut poly = instrument(2);
        poly.attack(60, 1.0);
        poly.attack(62, 1.0);
        poly.release(60); // voice 0 releasing (oldest)
        poly.release(62); // voice 1 releasing

        poly.attack(64, 1.0); // must steal the older one (midi 60)

        assert_eq!(poly.held_pitches(), vec![64]);
        let still_releasing: Vec<u8> = poly
            .voices
            .iter()
            .filter(|v| v.state == VoiceState::Releasing)
            .map(|v| v.midi)
            .collect();
        assert_eq!(still_releasing, vec![62], "newer release survives");
    }

    #[test]
    fn held_voices_are_never_stolen() {
        let mut poly = instrument(2);
        poly.attack(60, 1.0);
        poly.attack(62, 1.0);
        poly.attack(64, 1.0); // pool full of held voices; dropped

        assert_eq!(poly.held_pitches(), vec![60, 62]);
    }

    #[test]
    fn velocity_scales_output() {
        let mut quiet = instrument(1);
        let mut loud = instrument(1);
        quiet.attack(60, 0.2);
        loud.attack(60, 1.0);

        let (ql, _) = run(&mut quiet, 2048);
        let (ll, _) = run(&mut loud, 2048);

        let qpeak = ql.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        let lpeak = ll.iter().fold(0.0f32, |a, &x| a.max(x.abs()));
        assert!(lpeak > qpeak * 3.0, "velocity should scale level");
    }
}
