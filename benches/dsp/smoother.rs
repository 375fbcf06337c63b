//! Benchmarks for ramped parameter values.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::smoother::{RampKind, Smoothed};

use crate::BLOCK_SIZES;

pub fn bench_smoother(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/smoother");

    for &size in BLOCK_SIZES {
        for (label, kind) in [
            ("linear", RampKind::Linear),
            ("exponential", RampKind::Exponential),
        ] {
            let mut value = Smoothed::new(0.1);
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| {
                    // Re-arm the ramp so every iteration pays the moving cost
                    value.set_target(black_box(1.0), kind, size as u32);
                    let mut acc = 0.0f32;
                    for _ in 0..size {
                        acc += value.next();
                    }
                    value.jump_to(0.1);
                    black_box(acc)
                })
            });
        }

        // Settled value: the common case once a slider stops moving
        let mut settled = Smoothed::new(0.5);
        group.bench_with_input(BenchmarkId::new("settled", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for _ in 0..size {
                    acc += settled.next();
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}
