//! Benchmarks for the delay line: integer and fractional reads.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::delay_line::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay_line");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| ((i as f32) * 0.07).sin()).collect();

        // Integer read: the feedback delay's hot loop
        let mut line = DelayLine::new(48_000);
        group.bench_with_input(BenchmarkId::new("integer", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for &sample in &input {
                    acc += line.next_sample(black_box(sample), 12_000);
                }
                black_box(acc)
            })
        });

        // Fractional read: the chorus's modulated tap
        let mut line = DelayLine::new(4_800);
        group.bench_with_input(BenchmarkId::new("fractional", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for (i, &sample) in input.iter().enumerate() {
                    line.write(black_box(sample));
                    let delay = 600.0 + 300.0 * ((i as f32) * 0.01).sin();
                    acc += line.read_fractional(delay);
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}
