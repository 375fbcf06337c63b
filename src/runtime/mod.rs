/*
Audio Runtime
=============

The process-wide audio context: one per process, created lazily, never
destroyed. Browsers refuse to start audio output until a user gesture, so
the runtime begins locked and `ensure_unlocked` must be called from input
handling with a `UserGesture` token; the Play button is the only
gesture-safe entry point widgets use.

The clock is the AUDIO clock: `advance_frames` is called by the output
driver for every block actually rendered, and `current_time` divides by
the sample rate. While suspended (backgrounded tab, device switch) no
frames advance and time freezes — widgets are expected to tolerate that.

State may be mutated from exactly two places: `ensure_unlocked` (explicit,
gesture-driven) and `platform_suspended`/`platform_resumed` (the host's
state observer). Everyone else watches through `on_state_change`, which
always fires immediately with the current state on subscription.
*/

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Uninitialized,
    Suspended,
    Running,
    Closed,
}

/// Proof of a trusted user gesture.
///
/// Construct one only inside input-event handling (a key press, a pointer
/// click). Passing it to `ensure_unlocked` is what authorizes the
/// transition out of the locked states.
pub struct UserGesture(());

impl UserGesture {
    /// Assert that the caller is inside a user input handler.
    pub fn from_input_event() -> Self {
        UserGesture(())
    }
}

type StateListener = Box<dyn Fn(RuntimeState) + Send>;

pub struct AudioRuntime {
    state: Mutex<RuntimeState>,
    listeners: Mutex<Vec<(u64, StateListener)>>,
    next_listener_id: AtomicU64,
    sample_rate: AtomicU32,
    frames_rendered: AtomicU64,
}

static GLOBAL_RUNTIME: OnceLock<AudioRuntime> = OnceLock::new();

impl AudioRuntime {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: Mutex::new(RuntimeState::Uninitialized),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            sample_rate: AtomicU32::new(sample_rate),
            frames_rendered: AtomicU64::new(0),
        }
    }

    /// The process-wide runtime. Created on first use, locked.
    pub fn global() -> &'static AudioRuntime {
        GLOBAL_RUNTIME.get_or_init(|| AudioRuntime::new(48_000))
    }

    pub fn state(&self) -> RuntimeState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    /// Set by the output driver once the device is opened.
    pub fn set_sample_rate(&self, sample_rate: u32) {
        self.sample_rate.store(sample_rate, Ordering::Relaxed);
    }

    /// Seconds of audio actually rendered. Monotone; frozen while
    /// suspended.
    pub fn current_time(&self) -> f64 {
        let frames = self.frames_rendered.load(Ordering::Acquire);
        frames as f64 / self.sample_rate() as f64
    }

    /// Called by the output driver after each rendered block.
    pub fn advance_frames(&self, frames: u64) {
        self.frames_rendered.fetch_add(frames, Ordering::AcqRel);
    }

    /// Transition to running. Idempotent once running; locked states
    /// require a gesture token and fail with `GestureRequired` without
    /// one.
    pub fn ensure_unlocked(&self, gesture: Option<&UserGesture>) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            RuntimeState::Running => Ok(()),
            RuntimeState::Closed => Err(EngineError::InvalidState(
                "audio runtime is closed".to_string(),
            )),
            RuntimeState::Uninitialized | RuntimeState::Suspended => {
                if gesture.is_none() {
                    return Err(EngineError::GestureRequired);
                }
                *state = RuntimeState::Running;
                drop(state);
                tracing::debug!("audio runtime unlocked");
                self.notify(RuntimeState::Running);
                Ok(())
            }
        }
    }

    /// Host policy observer: the platform suspended output.
    pub fn platform_suspended(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == RuntimeState::Running {
            *state = RuntimeState::Suspended;
            drop(state);
            tracing::debug!("audio runtime suspended by platform");
            self.notify(RuntimeState::Suspended);
        }
    }

    /// Host policy observer: the platform resumed output on its own
    /// (allowed after a prior successful unlock).
    pub fn platform_resumed(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == RuntimeState::Suspended {
            *state = RuntimeState::Running;
            drop(state);
            self.notify(RuntimeState::Running);
        }
    }

    /// Subscribe to state transitions. Fires once immediately with the
    /// current state. Returns an id for `remove_listener`.
    pub fn on_state_change(&self, listener: impl Fn(RuntimeState) + Send + 'static) -> u64 {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let current = self.state();
        listener(current);
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|(listener_id, _)| *listener_id != id);
    }

    fn notify(&self, state: RuntimeState) {
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        for (_, listener) in listeners.iter() {
            listener(state);
        }
    }
}
