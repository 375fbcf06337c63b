/*
Analyzer Taps
=============

Analyzers are pass-through nodes that copy a mono fold of the signal into
a shared window buffer as it flows by. They are strictly feed-forward:
nothing an analyzer does can alter the audible path, and the visualizer
reads the window from the UI thread through an `AnalyzerReader`.

The window is guarded by a mutex, but the audio side only ever calls
`try_lock` — if the UI is mid-read, the audio thread skips this block's
copy rather than waiting. A skipped visual frame is invisible; a blocked
audio callback is not.

Two kinds exist with different default window lengths:

  waveform-analyzer   1024 samples, drawn directly as a polyline
  fft-analyzer        2048 samples, windowed and transformed by the
                      visualizer layer (the FFT itself runs UI-side)
*/

use std::sync::{Arc, Mutex};

use crate::graph::node::RenderCtx;

pub const WAVEFORM_WINDOW: usize = 1024;
pub const FFT_WINDOW: usize = 2048;

struct TapWindow {
    samples: Vec<f32>,
    write_pos: usize,
    /// Bumped on every block; lets readers detect staleness.
    revision: u64,
}

/// UI-side reader for one analyzer's capture window.
#[derive(Clone)]
pub struct AnalyzerReader {
    window: Arc<Mutex<TapWindow>>,
    size: usize,
}

impl AnalyzerReader {
    pub fn window_size(&self) -> usize {
        self.size
    }

    /// Copy the most recent window, oldest sample first, into `out`
    /// (which must be `window_size` long). Returns the revision, which
    /// increases whenever new audio has arrived.
    pub fn snapshot(&self, out: &mut [f32]) -> u64 {
        let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        let n = self.size.min(out.len());
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            let idx = (window.write_pos + i) % self.size;
            *slot = window.samples[idx];
        }
        window.revision
    }
}

pub struct AnalyzerNode {
    window: Arc<Mutex<TapWindow>>,
    size: usize,
}

impl AnalyzerNode {
    pub fn new(size: usize) -> Self {
        Self {
            window: Arc::new(Mutex::new(TapWindow {
                samples: vec![0.0; size],
                write_pos: 0,
                revision: 0,
            })),
            size,
        }
    }

    pub fn waveform() -> Self {
        Self::new(WAVEFORM_WINDOW)
    }

    pub fn fft() -> Self {
        Self::new(FFT_WINDOW)
    }

    pub fn reader(&self) -> AnalyzerReader {
        AnalyzerReader {
            window: self.window.clone(),
            size: self.size,
        }
    }

    /// Pass-through: captures the mono fold, leaves the audio untouched.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], _ctx: &RenderCtx) {
        let Ok(mut window) = self.window.try_lock() else {
            return; // reader holds the lock; skip this block's capture
        };
        let size = self.size;
        for (l, r) in left.iter().zip(right.iter()) {
            let pos = window.write_pos;
            window.samples[pos] = 0.5 * (l + r);
            window.write_pos = (pos + 1) % size;
        }
        window.revision += 1;
    }
}
