//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::oscillator::{OscSpec, Oscillator, Waveform};

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine - transcendental per sample
        let mut osc = Oscillator::new(OscSpec::Wave(Waveform::Sine));
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SR);
            })
        });

        // Sawtooth - linear ramp
        let mut osc = Oscillator::new(OscSpec::Wave(Waveform::Sawtooth));
        group.bench_with_input(BenchmarkId::new("sawtooth", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SR);
            })
        });

        // Square - branch per sample
        let mut osc = Oscillator::new(OscSpec::Wave(Waveform::Square));
        group.bench_with_input(BenchmarkId::new("square", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SR);
            })
        });

        // Noise - seeded PRNG
        let mut osc = Oscillator::new(OscSpec::Wave(Waveform::Noise));
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SR);
            })
        });

        // Partial series - eight sines summed per sample
        let mut osc = Oscillator::new(OscSpec::Partials(vec![
            1.0, 0.5, 0.33, 0.25, 0.2, 0.17, 0.14, 0.125,
        ]));
        group.bench_with_input(BenchmarkId::new("partials_8", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(220.0), SR);
            })
        });
    }

    group.finish();
}
