//! Low-level, realtime-safe DSP primitives.
//!
//! Everything here allocates at construction time only; the per-sample
//! paths are branch-light and free of locks, I/O, and allocation. Graph
//! nodes wrap these primitives with parameter plumbing and port wiring.

/// RBJ biquad filters with analytic frequency response.
pub mod biquad;
/// Pre-allocated integer and fractional delay lines.
pub mod delay_line;
/// Envelope followers and gain computers for the dynamics nodes.
pub mod dynamics;
/// ADSR envelope generator.
pub mod envelope;
/// Audio-band oscillators, noise, and partial series.
pub mod oscillator;
/// Schroeder reverb cores.
pub mod reverb;
/// Ramped parameter values (anti-zipper).
pub mod smoother;
/// Saturation transfer curves with oversampling.
pub mod waveshaper;
