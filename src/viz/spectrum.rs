/*
Spectrum Pipeline
=================

Turns an FFT-analyzer tap window into log-spaced display bins:

  1. Hann-window the time-domain capture (reduces spectral leakage).
  2. Forward FFT (rustfft), power per bin.
  3. Re-bin onto log-spaced display frequencies 20 Hz → 20 kHz.
  4. Peak-hold with decay so the trace breathes instead of flickering.

The FFT runs on the UI side: the analyzer tap only captures samples, the
audio thread never transforms anything.
*/

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::viz::mapping::{FREQ_MAX, FREQ_MIN};

/// Number of log-spaced display bins.
pub const SPECTRUM_BINS: usize = 64;
/// Per-update decay applied to held peaks, dB.
const PEAK_DECAY_DB: f32 = 1.5;
const DB_SILENCE: f32 = -120.0;

pub struct SpectrumPipeline {
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Display frequency and FFT-bin index per display bin.
    bins: Vec<(f32, usize)>,
    /// Current held magnitudes, dB.
    magnitudes: Vec<f32>,
}

impl SpectrumPipeline {
    pub fn new(fft_size: usize, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Hann window
        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let denom = (fft_size.max(2) - 1) as f32;
                0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos())
            })
            .collect();

        // Log-spaced display bins 20 Hz .. min(20 kHz, Nyquist)
        let max_freq = (sample_rate / 2.0).min(FREQ_MAX);
        let ratio = max_freq / FREQ_MIN;
        let half = (fft_size / 2).max(1);
        let bins = (0..SPECTRUM_BINS)
            .map(|i| {
                let t = i as f32 / (SPECTRUM_BINS - 1) as f32;
                let freq = FREQ_MIN * ratio.powf(t);
                let index =
                    ((freq * fft_size as f32 / sample_rate).round() as usize).min(half - 1);
                (freq, index)
            })
            .collect();

        Self {
            window,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            bins,
            magnitudes: vec![DB_SILENCE; SPECTRUM_BINS],
        }
    }

    /// Feed a new capture window (must match the FFT size).
    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }

        for (slot, (&sample, &win)) in self
            .scratch
            .iter_mut()
            .zip(samples.iter().zip(&self.window))
        {
            slot.re = sample * win;
            slot.im = 0.0;
        }
        self.fft.process(&mut self.scratch);

        let scale = 2.0 / self.window.len() as f32;
        for (slot, &(_, index)) in self.magnitudes.iter_mut().zip(&self.bins) {
            let bin = self.scratch[index];
            let power = (bin.re * bin.re + bin.im * bin.im).max(1e-12);
            let db = 10.0 * power.log10() + 20.0 * scale.log10();

            // Peak hold: rise instantly, fall at the decay rate
            *slot = if db > *slot {
                db
            } else {
                (*slot - PEAK_DECAY_DB).max(db).max(DB_SILENCE)
            };
        }
    }

    /// Current display data: (frequency Hz, magnitude dB) per bin.
    pub fn data(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.bins
            .iter()
            .zip(&self.magnitudes)
            .map(|(&(freq, _), &db)| (freq, db))
    }

    /// Held magnitude at the display bin nearest `freq`, dB.
    pub fn magnitude_at(&self, freq: f32) -> f32 {
        let mut best = (f32::INFINITY, DB_SILENCE);
        for (&(bin_freq, _), &db) in self.bins.iter().zip(&self.magnitudes) {
            let dist = (bin_freq.ln() - freq.ln()).abs();
            if dist < best.0 {
                best = (dist, db);
            }
        }
        best.1
    }
}
