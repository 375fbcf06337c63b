/*
Look-Ahead Transport Scheduler
==============================

The engine's clock. Timer callbacks in a UI are too jittery to trigger
audio, so the transport never plays anything directly; instead, every
~25 ms the driver calls `advance(now)` and the scheduler walks a ~100 ms
window ahead of the audio clock, emitting each step that falls inside it
as a `ScheduledEvent` with an absolute frame. The graph applies those
events sample-accurately; UI jitter only moves WHEN a step gets
scheduled, never WHERE it lands.

Each scheduled step also queues a visual tick stamped with the step's
audio time. `drain_visual(now)` releases ticks whose time has passed, so
the playhead the user sees changes on the animation frame FOLLOWING the
sound — synchronized, never early.

State machine:  stopped ──start──▶ running ◀─start/pause─▶ paused
                   ▲                  │
                   └──────stop────────┘

  start from stopped   cursor to 0; step 0 schedules immediately
  pause                cursor retained; queued visual ticks dropped
  stop                 cursor reset; queued visual ticks dropped
  schedule (running)   same body variant: swap at the next loop boundary;
                       different variant: restart
  schedule_immediate   swap now, cursor clamped modulo the new length

Swing delays odd-indexed steps by swing × step/3 at the configured
subdivision; the underlying grid stays straight, so disabling swing never
moves even steps.
*/

use std::collections::VecDeque;

use crate::graph::{EventAction, ScheduledEvent};
use crate::transport::arpeggio::NoteSequence;
use crate::transport::program::{LoopBody, TransportProgram};

/// How far ahead of the audio clock steps are scheduled, seconds.
pub const LOOKAHEAD_SECONDS: f64 = 0.1;
/// How often the driver is expected to call `advance`, seconds.
pub const ADVANCE_INTERVAL_SECONDS: f64 = 0.025;

/// Fraction of a step a drum hit is held before its note-off.
const STEP_GATE: f64 = 0.9;
/// Metronome click length, seconds.
const CLICK_SECONDS: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualTick {
    pub step_index: usize,
    pub steps_per_bar: usize,
    pub audio_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Paused,
    Running,
}

/// Bar:step readout for transport headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportPosition {
    pub bar: u64,
    pub step: usize,
    pub steps_per_bar: usize,
}

type TickListener = Box<dyn FnMut(&VisualTick) + Send>;

pub struct Transport {
    sample_rate: f32,
    state: TransportState,
    program: Option<TransportProgram>,
    /// Program waiting for the next loop boundary.
    pending_program: Option<TransportProgram>,
    arp_cache: Option<NoteSequence>,
    cursor: usize,
    bars_completed: u64,
    next_step_time: f64,
    visual_queue: VecDeque<VisualTick>,
    listeners: Vec<TickListener>,
}

impl Transport {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            state: TransportState::Stopped,
            program: None,
            pending_program: None,
            arp_cache: None,
            cursor: 0,
            bars_completed: 0,
            next_step_time: 0.0,
            visual_queue: VecDeque::new(),
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn position(&self) -> TransportPosition {
        let steps_per_bar = self.steps_per_loop().max(1);
        TransportPosition {
            bar: self.bars_completed,
            step: self.cursor,
            steps_per_bar,
        }
    }

    fn steps_per_loop(&self) -> usize {
        self.program
            .as_ref()
            .map(|p| p.body.step_count())
            .unwrap_or(0)
    }

    /// Install a program. While running, a same-variant program waits for
    /// the loop boundary; a different variant restarts the transport.
    pub fn schedule(&mut self, program: TransportProgram) {
        match (&self.program, self.state) {
            (Some(current), TransportState::Running)
                if current.body.same_variant(&program.body) =>
            {
                self.pending_program = Some(program);
            }
            (_, TransportState::Running) => {
                // Body type changed: the one case that restarts
                let resume_at = self.next_step_time;
                self.install(program);
                self.cursor = 0;
                self.bars_completed = 0;
                self.next_step_time = resume_at;
            }
            _ => self.install(program),
        }
    }

    /// Install a program now; the cursor is clamped modulo the new length.
    pub fn schedule_immediate(&mut self, program: TransportProgram) {
        let cursor = self.cursor;
        self.install(program);
        let steps = self.steps_per_loop().max(1);
        self.cursor = cursor % steps;
    }

    fn install(&mut self, program: TransportProgram) {
        self.arp_cache = match &program.body {
            LoopBody::Arpeggio { config, .. } => Some(NoteSequence::generate(config)),
            _ => None,
        };
        self.program = Some(program);
        self.pending_program = None;
    }

    /// Begin playback. From stopped the cursor resets and step 0 fires at
    /// `now`; from paused, playback resumes at the retained cursor.
    pub fn start(&mut self, now: f64) {
        match self.state {
            TransportState::Running => {}
            TransportState::Paused => {
                self.next_step_time = now;
                self.state = TransportState::Running;
            }
            TransportState::Stopped => {
                self.cursor = 0;
                self.bars_completed = 0;
                self.next_step_time = now;
                self.state = TransportState::Running;
            }
        }
    }

    /// Halt without losing the cursor. Pending visual ticks are dropped.
    pub fn pause(&mut self) {
        if self.state == TransportState::Running {
            self.state = TransportState::Paused;
            self.visual_queue.clear();
        }
    }

    /// Halt and rewind. Pending visual ticks are dropped.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.cursor = 0;
        self.bars_completed = 0;
        self.visual_queue.clear();
    }

    /// Move the cursor to a beat position within the loop.
    pub fn seek(&mut self, beats: f64) {
        let Some(program) = &self.program else {
            return;
        };
        let steps = self.steps_per_loop().max(1);
        let step = (beats / program.step_subdivision.beats()).floor().max(0.0) as usize;
        self.cursor = step % steps;
    }

    pub fn on_visual_tick(&mut self, listener: impl FnMut(&VisualTick) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Walk the look-ahead window and emit every step that starts inside
    /// it, as events stamped with absolute frames.
    pub fn advance(&mut self, now: f64) -> Vec<ScheduledEvent> {
        let mut events = Vec::new();
        if self.state != TransportState::Running {
            return events;
        }
        let Some(program) = self.program.clone() else {
            return events;
        };
        let steps = program.body.step_count().max(1);
        let horizon = now + LOOKAHEAD_SECONDS;

        while self.next_step_time < horizon {
            let swung = self.cursor % 2 == 1;
            let event_time = if swung {
                self.next_step_time + program.swing_delay_seconds()
            } else {
                self.next_step_time
            };
            let frame = (event_time * self.sample_rate as f64) as u64;

            self.emit_step(&program, self.cursor, frame, &mut events);
            self.visual_queue.push_back(VisualTick {
                step_index: self.cursor,
                steps_per_bar: steps,
                audio_time: event_time,
            });

            self.cursor += 1;
            self.next_step_time += program.step_seconds();
            if self.cursor >= steps {
                self.cursor = 0;
                self.bars_completed += 1;
                // Loop boundary: a pending same-variant program lands here
                if let Some(pending) = self.pending_program.take() {
                    self.install(pending);
                    return events; // re-enter with the new program next call
                }
            }
        }
        events
    }

    fn emit_step(
        &self,
        program: &TransportProgram,
        step: usize,
        frame: u64,
        events: &mut Vec<ScheduledEvent>,
    ) {
        let step_frames = (program.step_seconds() * self.sample_rate as f64) as u64;
        match &program.body {
            LoopBody::Steps { pattern, tracks } => {
                for (track, velocity) in pattern.hits_at(step) {
                    let Some(target) = tracks.get(track) else {
                        continue;
                    };
                    events.push(ScheduledEvent {
                        frame,
                        node: target.node,
                        action: EventAction::NoteOn {
                            midi: target.midi,
                            velocity,
                        },
                    });
                    events.push(ScheduledEvent {
                        frame: frame + (step_frames as f64 * STEP_GATE) as u64,
                        node: target.node,
                        action: EventAction::NoteOff { midi: target.midi },
                    });
                }
            }
            LoopBody::Arpeggio { target, gate, .. } => {
                let Some(note) = self.arp_cache.as_ref().and_then(|seq| seq.note(step)) else {
                    return;
                };
                let midi = note.midi();
                events.push(ScheduledEvent {
                    frame,
                    node: *target,
                    action: EventAction::NoteOn {
                        midi,
                        velocity: 1.0,
                    },
                });
                let gate_frames = (step_frames as f64 * gate.clamp(0.05, 1.0) as f64) as u64;
                events.push(ScheduledEvent {
                    frame: frame + gate_frames,
                    node: *target,
                    action: EventAction::NoteOff { midi },
                });
            }
            LoopBody::Metronome {
                target,
                accent_midi,
                click_midi,
                ..
            } => {
                let midi = if step == 0 { *accent_midi } else { *click_midi };
                events.push(ScheduledEvent {
                    frame,
                    node: *target,
                    action: EventAction::NoteOn {
                        midi,
                        velocity: if step == 0 { 1.0 } else { 0.7 },
                    },
                });
                events.push(ScheduledEvent {
                    frame: frame + (CLICK_SECONDS * self.sample_rate as f64) as u64,
                    node: *target,
                    action: EventAction::NoteOff { midi },
                });
            }
        }
    }

    /// Release visual ticks whose audio time has passed, in order, firing
    /// listeners once per tick.
    pub fn drain_visual(&mut self, now: f64) -> Vec<VisualTick> {
        let mut fired = Vec::new();
        while let Some(tick) = self.visual_queue.front() {
            if tick.audio_time > now {
                break;
            }
            let tick = self.visual_queue.pop_front().expect("front checked");
            for listener in &mut self.listeners {
                listener(&tick);
            }
            fired.push(tick);
        }
        fired
    }
}
