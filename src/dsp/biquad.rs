/*
Biquad Filter (RBJ cookbook)
============================

One second-order IIR section covering the full EQ shape family:

| shape     | passes            | gain parameter |
| --------- | ----------------- | -------------- |
| lowpass   | below cutoff      | -              |
| highpass  | above cutoff      | -              |
| bandpass  | around cutoff     | -              |
| notch     | all but cutoff    | -              |
| peaking   | all, bell at f    | boost/cut dB   |
| lowshelf  | all, shelf below  | boost/cut dB   |
| highshelf | all, shelf above  | boost/cut dB   |

Coefficients follow Robert Bristow-Johnson's Audio EQ Cookbook. The
transfer function is

    H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)

which also gives us `frequency_response` analytically — the EQ widget
overlays that curve on its FFT trace rather than measuring it.

State is kept in transposed direct form II: two delay registers, good
numerical behavior at audio rates.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::TAU;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterShape {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
    Peaking,
    Lowshelf,
    Highshelf,
}

impl FilterShape {
    /// Whether the gain parameter participates in the response.
    pub fn uses_gain(self) -> bool {
        matches!(
            self,
            FilterShape::Peaking | FilterShape::Lowshelf | FilterShape::Highshelf
        )
    }
}

pub struct Biquad {
    shape: FilterShape,
    sample_rate: f32,
    frequency: f32,
    q: f32,
    gain_db: f32,

    // Normalized coefficients (a0 divided out)
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // Transposed direct form II state
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(shape: FilterShape, sample_rate: f32, frequency: f32, q: f32, gain_db: f32) -> Self {
        let mut filter = Self {
            shape,
            sample_rate,
            frequency: frequency.clamp(20.0, 20_000.0),
            q: q.clamp(0.1, 10.0),
            gain_db,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn shape(&self) -> FilterShape {
        self.shape
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.clamp(20.0, 20_000.0);
        self.update_coefficients();
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q.clamp(0.1, 10.0);
        self.update_coefficients();
    }

    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db.clamp(-40.0, 40.0);
        self.update_coefficients();
    }

    /// Changing shape is a structural change; state is cleared so the new
    /// response starts from silence rather than the old filter's memory.
    pub fn set_shape(&mut self, shape: FilterShape) {
        self.shape = shape;
        self.reset();
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        let w0 = TAU * self.frequency / self.sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * self.q);
        let a = 10.0f32.powf(self.gain_db / 40.0); // sqrt of linear gain

        let (b0, b1, b2, a0, a1, a2) = match self.shape {
            FilterShape::Lowpass => {
                let b1 = 1.0 - cos_w0;
                let b0 = b1 / 2.0;
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterShape::Highpass => {
                let b1 = -(1.0 + cos_w0);
                let b0 = (1.0 + cos_w0) / 2.0;
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterShape::Bandpass => {
                // Constant 0 dB peak gain variant
                (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterShape::Notch => (
                1.0,
                -2.0 * cos_w0,
                1.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterShape::Peaking => (
                1.0 + alpha * a,
                -2.0 * cos_w0,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w0,
                1.0 - alpha / a,
            ),
            FilterShape::Lowshelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterShape::Highshelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Magnitude response in dB at each requested frequency.
    ///
    /// Evaluates |H(e^jw)| from the coefficients; no signal is involved.
    pub fn frequency_response(&self, frequencies: &[f32]) -> Vec<f32> {
        frequencies
            .iter()
            .map(|&freq| {
                let w = TAU * (freq / self.sample_rate).clamp(0.0, 0.5 - 1e-6);
                let (cos1, sin1) = (w.cos(), w.sin());
                let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

                // Numerator and denominator evaluated at e^{-jw}
                let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
                let num_im = -(self.b1 * sin1 + self.b2 * sin2);
                let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
                let den_im = -(self.a1 * sin1 + self.a2 * sin2);

                let num_mag = (num_re * num_re + num_im * num_im).sqrt();
                let den_mag = (den_re * den_re + den_im * den_im).sqrt();
                let mag = (num_mag / den_mag.max(1e-12)).max(1e-6);
                20.0 * mag.log10()
            })
            .collect()
    }
}

/// Log-spaced frequency grid over the audible band, for response plots.
pub fn log_frequency_grid(points: usize) -> Vec<f32> {
    let (lo, hi) = (20.0f32, 20_000.0f32);
    let ratio = hi / lo;
    (0..points)
        .map(|i| {
            let t = if points > 1 {
                i as f32 / (points - 1) as f32
            } else {
                0.0
            };
            lo * ratio.powf(t)
        })
        .collect()
}
