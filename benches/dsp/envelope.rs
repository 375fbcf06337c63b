//! Benchmarks for the ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::envelope::Envelope;

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let input = vec![0.5f32; size];
        let mut buffer = input.clone();

        // Sustain phase: the steady state a held note spends most time in
        let mut held = Envelope::adsr(SR, 0.005, 0.05, 0.7, 0.2);
        held.note_on();
        for _ in 0..(0.1 * SR) as usize {
            held.next_level();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                held.process_multiply(black_box(&mut buffer));
            })
        });

        // Retrigger storm: worst case for the stage bookkeeping
        let mut retriggered = Envelope::adsr(SR, 0.001, 0.01, 0.5, 0.05);
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                retriggered.note_on();
                buffer.copy_from_slice(&input);
                retriggered.process_multiply(black_box(&mut buffer));
                retriggered.note_off();
            })
        });
    }

    group.finish();
}
