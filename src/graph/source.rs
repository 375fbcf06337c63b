/*
Source Nodes
============

Three of the four source kinds live here (the poly instrument has its own
module):

  BufferSource      Plays a DecodedBuffer once or looped, resampling from
                    the buffer's rate to the graph's rate with linear
                    interpolation. One-shot start semantics: starting an
                    already-started source is InvalidState, stopping a
                    never-started source is silently tolerated.

  OscillatorSource  A single oscillator with smoothed frequency and level.
                    Same start/stop contract as BufferSource.

  SamplerSource     Pitched playback of one buffer: each note_on spawns a
                    playback voice whose rate is 2^((midi - root)/12); the
                    note_off ramps that voice out over a few milliseconds
                    to avoid clicks.

All sources write the same signal to both channels (spatialization happens
downstream in the panner); stereo buffers keep their channels.
*/

use std::sync::Arc;

use crate::dsp::oscillator::{OscSpec, Oscillator};
use crate::dsp::smoother::{RampKind, Smoothed};
use crate::error::EngineError;
use crate::graph::node::{Ramp, RenderCtx};
use crate::loader::DecodedBuffer;

pub struct BufferSource {
    buffer: Arc<DecodedBuffer>,
    looped: bool,
    position: f64,
    started: bool,
    playing: bool,
    playback_rate: Smoothed,
}

impl BufferSource {
    pub fn new(buffer: Arc<DecodedBuffer>, looped: bool) -> Self {
        Self {
            buffer,
            looped,
            position: 0.0,
            started: false,
            playing: false,
            playback_rate: Smoothed::new(1.0),
        }
    }

    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.started {
            return Err(EngineError::InvalidState(
                "buffer source already started".to_string(),
            ));
        }
        self.started = true;
        self.playing = true;
        self.position = 0.0;
        Ok(())
    }

    /// Stop is tolerant: stopping a never-started or finished source is a
    /// no-op by contract.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Re-arm after stop so the same node can be started again.
    pub fn reset(&mut self) {
        self.started = false;
        self.playing = false;
        self.position = 0.0;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "playbackRate" => {
                self.playback_rate
                    .set_target(value.clamp(0.25, 4.0), ramp.kind, ramp.samples);
                true
            }
            _ => false,
        }
    }

    pub fn process_add(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        if !self.playing {
            return;
        }
        let frames = self.buffer.frame_count();
        if frames == 0 {
            self.playing = false;
            return;
        }
        let rate_ratio = self.buffer.sample_rate() as f64 / ctx.sample_rate as f64;
        let stereo = self.buffer.channel_count() > 1;

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            if self.position as usize >= frames {
                if self.looped {
                    self.position -= frames as f64;
                } else {
                    self.playing = false;
                    break;
                }
            }

            let idx = self.position as usize;
            let frac = (self.position - idx as f64) as f32;
            let next = if idx + 1 < frames {
                idx + 1
            } else if self.looped {
                0
            } else {
                idx
            };

            let ch0 = self.buffer.channel(0);
            let sample_l = ch0[idx] + (ch0[next] - ch0[idx]) * frac;
            let sample_r = if stereo {
                let ch1 = self.buffer.channel(1);
                ch1[idx] + (ch1[next] - ch1[idx]) * frac
            } else {
                sample_l
            };

            *l += sample_l;
            *r += sample_r;

            let rate = self.playback_rate.next() as f64;
            self.position += rate_ratio * rate;
        }
    }
}

pub struct OscillatorSource {
    osc: Oscillator,
    frequency: Smoothed,
    level: Smoothed,
    started: bool,
    playing: bool,
}

impl OscillatorSource {
    pub fn new(spec: OscSpec) -> Self {
        Self {
            osc: Oscillator::new(spec),
            frequency: Smoothed::new(440.0),
            level: Smoothed::new(0.5),
            started: false,
            playing: false,
        }
    }

    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.started {
            return Err(EngineError::InvalidState(
                "oscillator source already started".to_string(),
            ));
        }
        self.started = true;
        self.playing = true;
        self.osc.reset();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn reset(&mut self) {
        self.started = false;
        self.playing = false;
    }

    pub fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match name {
            "frequency" => {
                // Frequencies glide exponentially; a linear sweep sounds
                // like it decelerates as it rises.
                let kind = if ramp.kind == RampKind::Step {
                    RampKind::Step
                } else {
                    RampKind::Exponential
                };
                self.frequency
                    .set_target(value.clamp(20.0, 20_000.0), kind, ramp.samples);
                true
            }
            "level" => {
                self.level
                    .set_target(value.clamp(0.0, 1.0), ramp.kind, ramp.samples);
                true
            }
            _ => false,
        }
    }

    pub fn process_add(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        if !self.playing {
            return;
        }
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let freq = self.frequency.next();
            let sample = self.osc.next(freq, ctx.sample_rate) * self.level.next();
            *l += sample;
            *r += sample;
        }
    }
}

/// Seconds a sampler voice takes to fade after note_off.
const SAMPLER_RELEASE_SECONDS: f32 = 0.008;

struct SamplerVoice {
    midi: u8,
    position: f64,
    rate: f64,
    level: f32,
    releasing: bool,
}

pub struct SamplerSource {
    buffer: Arc<DecodedBuffer>,
    root_midi: u8,
    voices: Vec<SamplerVoice>,
}

impl SamplerSource {
    pub fn new(buffer: Arc<DecodedBuffer>, root_midi: u8) -> Self {
        Self {
            buffer,
            root_midi,
            voices: Vec::with_capacity(16),
        }
    }

    pub fn note_on(&mut self, midi: u8, _velocity: f32) {
        // Retriggering a held pitch restarts it: release the old voice
        // first so pitch state stays a set.
        self.note_off(midi);
        let rate = 2f64.powf((midi as f64 - self.root_midi as f64) / 12.0);
        self.voices.push(SamplerVoice {
            midi,
            position: 0.0,
            rate,
            level: 1.0,
            releasing: false,
        });
    }

    pub fn note_off(&mut self, midi: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.midi == midi) {
            voice.releasing = true;
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.releasing = true;
        }
    }

    pub fn set_param(&mut self, _name: &str, _value: f32, _ramp: Ramp) -> bool {
        false
    }

    pub fn process_add(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        let frames = self.buffer.frame_count();
        if frames == 0 {
            self.voices.clear();
            return;
        }
        let rate_ratio = self.buffer.sample_rate() as f64 / ctx.sample_rate as f64;
        let release_step = 1.0 / (SAMPLER_RELEASE_SECONDS * ctx.sample_rate);
        let stereo = self.buffer.channel_count() > 1;

        for voice in &mut self.voices {
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                if voice.position as usize + 1 >= frames || voice.level <= 0.0 {
                    break;
                }
                let idx = voice.position as usize;
                let frac = (voice.position - idx as f64) as f32;

                let ch0 = self.buffer.channel(0);
                let sample_l = ch0[idx] + (ch0[idx + 1] - ch0[idx]) * frac;
                let sample_r = if stereo {
                    let ch1 = self.buffer.channel(1);
                    ch1[idx] + (ch1[idx + 1] - ch1[idx]) * frac
                } else {
                    sample_l
                };

                *l += sample_l * voice.level;
                *r += sample_r * voice.level;

                voice.position += rate_ratio * voice.rate;
                if voice.releasing {
                    voice.level = (voice.level - release_step).max(0.0);
                }
            }
        }

        self.voices
            .retain(|v| (v.position as usize + 1) < frames && v.level > 0.0);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }
}
