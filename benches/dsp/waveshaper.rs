//! Benchmarks for the saturation waveshaper at each oversample setting.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::waveshaper::{Oversample, Waveshaper};

use crate::BLOCK_SIZES;

pub fn bench_waveshaper(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/waveshaper");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| ((i as f32) * 0.11).sin() * 0.9)
            .collect();
        let mut buffer = input.clone();

        for (label, oversample) in [
            ("1x", Oversample::None),
            ("2x", Oversample::X2),
            ("4x", Oversample::X4),
        ] {
            let mut shaper = Waveshaper::new(0.3, oversample, 0.8);
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    shaper.render(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
