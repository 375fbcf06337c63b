//! Benchmarks for polyphonic instrument rendering at varying voice counts.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::envelope::{AttackCurve, EnvelopeSpec};
use tonelab::dsp::oscillator::{OscSpec, Waveform};
use tonelab::graph::{Graph, GraphBuilder, GraphSpec, NodeId, NodeKind};
use tonelab::loader::SampleLoader;

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

fn poly_graph(loader: &SampleLoader, max_voices: usize) -> (Graph, NodeId) {
    let mut spec = GraphSpec::new();
    let instrument = spec.add_kind(NodeKind::SourcePolyInstrument {
        osc: OscSpec::Wave(Waveform::Sawtooth),
        envelope: EnvelopeSpec {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.6,
            release: 0.2,
            attack_curve: AttackCurve::Linear,
        },
        max_voices,
    });
    let dest = spec.add_kind(NodeKind::Destination);
    spec.connect(instrument, dest);
    let graph = GraphBuilder::new(SR, loader).build(&spec).expect("build");
    (graph, instrument)
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let loader = SampleLoader::new();

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // Single held note: baseline per-voice cost
        let (mut solo, instrument) = poly_graph(&loader, 8);
        solo.note_on(instrument, 60, 1.0);
        group.bench_with_input(BenchmarkId::new("held_1", size), &size, |b, _| {
            b.iter(|| {
                solo.process_block(&[], black_box(&mut left), black_box(&mut right));
            })
        });

        // Full eight-voice chord: what key-mashing costs
        let (mut chord, instrument) = poly_graph(&loader, 8);
        for midi in [48, 52, 55, 60, 64, 67, 72, 76] {
            chord.note_on(instrument, midi, 0.8);
        }
        group.bench_with_input(BenchmarkId::new("held_8", size), &size, |b, _| {
            b.iter(|| {
                chord.process_block(&[], black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
