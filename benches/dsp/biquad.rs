//! Benchmarks for the RBJ biquad sections.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::biquad::{log_frequency_grid, Biquad, FilterShape};

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/biquad");

    for &size in BLOCK_SIZES {
        // Test signal: sawtooth-like ramp
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut buffer = input.clone();

        for shape in [
            FilterShape::Lowpass,
            FilterShape::Highpass,
            FilterShape::Bandpass,
            FilterShape::Peaking,
        ] {
            let mut filter = Biquad::new(shape, SR, 1_000.0, 2.0, 6.0);
            let label = format!("{shape:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer));
                })
            });
        }
    }

    // The EQ overlay evaluates the analytic curve every frame
    let filter = Biquad::new(FilterShape::Peaking, SR, 1_000.0, 2.0, 12.0);
    let grid = log_frequency_grid(128);
    group.bench_function("frequency_response_128", |b| {
        b.iter(|| filter.frequency_response(black_box(&grid)))
    });

    group.finish();
}
