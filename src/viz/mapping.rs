/*
Screen-Space Mappings
=====================

Every visualizer draws through the same explicit mappings:

  frequency axis   logarithmic, 20 Hz → 20 kHz across the width
  level axis       linear in dB, -100 dB at the bottom → 0 dB at the top
  waveform         sample index → x linearly; amplitude scaled and
                   centered on the middle line

The viewport models the canvas-resize policy: the backing store is CSS
pixels × devicePixelRatio, while all drawing coordinates stay in CSS
pixels (the draw transform is reset to 1:1 each frame). Draw data
produced here is resolution-independent — the terminal front-end and a
canvas consume the same points.
*/

pub const FREQ_MIN: f32 = 20.0;
pub const FREQ_MAX: f32 = 20_000.0;
pub const DB_FLOOR: f32 = -100.0;
pub const DB_CEIL: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// CSS-pixel size of the drawing surface.
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn with_dpr(mut self, device_pixel_ratio: f32) -> Self {
        self.device_pixel_ratio = device_pixel_ratio.max(0.5);
        self
    }

    /// Physical backing-store size: CSS pixels × devicePixelRatio.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.width * self.device_pixel_ratio).round() as u32,
            (self.height * self.device_pixel_ratio).round() as u32,
        )
    }

    /// Frequency → x, logarithmic over the audible band.
    pub fn freq_to_x(&self, freq: f32) -> f32 {
        let clamped = freq.clamp(FREQ_MIN, FREQ_MAX);
        let t = (clamped / FREQ_MIN).ln() / (FREQ_MAX / FREQ_MIN).ln();
        t * self.width
    }

    /// dB → y, linear, 0 dB at the top and the floor at the bottom.
    pub fn db_to_y(&self, db: f32) -> f32 {
        let clamped = db.clamp(DB_FLOOR, DB_CEIL);
        let t = (clamped - DB_FLOOR) / (DB_CEIL - DB_FLOOR);
        (1.0 - t) * self.height
    }

    /// Sample index → x, linear across the window.
    pub fn sample_to_x(&self, index: usize, window: usize) -> f32 {
        if window <= 1 {
            return 0.0;
        }
        index as f32 / (window - 1) as f32 * self.width
    }

    /// Amplitude (−1..1) → y, centered, scaled.
    pub fn amplitude_to_y(&self, amplitude: f32, scale: f32) -> f32 {
        let centered = 0.5 * self.height;
        centered - amplitude.clamp(-1.0, 1.0) * scale * 0.5 * self.height
    }
}
