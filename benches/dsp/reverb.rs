//! Benchmarks for the Schroeder reverb core.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::reverb::ReverbCore;

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| ((i as f32) * 0.05).sin() * 0.5).collect();

        let mut core = ReverbCore::new(SR, 0);
        core.set_room_size(0.7);
        core.set_decay(0.6);
        core.set_damping(0.4);

        group.bench_with_input(BenchmarkId::new("core", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for &sample in &input {
                    acc += core.process(black_box(sample));
                }
                black_box(acc)
            })
        });

        // Stereo pair: the spread offset gives each channel its own core
        let mut left_core = ReverbCore::new(SR, 0);
        let mut right_core = ReverbCore::new(SR, 23);
        group.bench_with_input(BenchmarkId::new("stereo_pair", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for &sample in &input {
                    acc += left_core.process(black_box(sample));
                    acc += right_core.process(black_box(sample));
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}
