//! Benchmarks for the dynamics building blocks: envelope follower and
//! gain computer.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::dynamics::{linear_to_db, EnvelopeFollower, GainComputer};

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_dynamics(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/dynamics");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| ((i as f32) * 0.09).sin() * 0.5)
            .collect();

        let mut follower = EnvelopeFollower::new(SR, 0.003, 0.25);
        group.bench_with_input(BenchmarkId::new("follower", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for &sample in &input {
                    acc += follower.track(black_box(sample.abs()));
                }
                black_box(acc)
            })
        });

        // Full sidechain: follow, convert to dB, compute reduction -
        // the compressor's per-sample cost
        let mut follower = EnvelopeFollower::new(SR, 0.003, 0.25);
        let hard = GainComputer::new(-20.0, 4.0, 0.0);
        let soft = GainComputer::new(-20.0, 4.0, 12.0);

        group.bench_with_input(BenchmarkId::new("sidechain_hard_knee", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for &sample in &input {
                    let level = follower.track(sample.abs());
                    acc += hard.gain_reduction_db(black_box(linear_to_db(level)));
                }
                black_box(acc)
            })
        });

        group.bench_with_input(BenchmarkId::new("sidechain_soft_knee", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for &sample in &input {
                    let level = follower.track(sample.abs());
                    acc += soft.gain_reduction_db(black_box(linear_to_db(level)));
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}
