//! Benchmarks for complete widget graphs rendered block by block.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use tonelab::dsp::biquad::FilterShape;
use tonelab::dsp::oscillator::{OscSpec, Waveform};
use tonelab::graph::{Graph, GraphBuilder, GraphSpec, NodeKind, NodeSpec};
use tonelab::loader::SampleLoader;

use crate::BLOCK_SIZES;

const SR: f32 = 48_000.0;

/// The EQ explorer's chain: noise → peaking filter → FFT tap.
fn eq_graph(loader: &SampleLoader) -> Graph {
    let mut spec = GraphSpec::new();
    let noise = spec.add(
        NodeSpec::new(NodeKind::SourceOscillator {
            osc: OscSpec::Wave(Waveform::Noise),
        })
        .with_param("level", 0.4),
    );
    let filter = spec.add(
        NodeSpec::new(NodeKind::Filter {
            shape: FilterShape::Peaking,
        })
        .with_param("frequency", 1_000.0)
        .with_param("q", 2.0)
        .with_param("gain", 12.0),
    );
    let analyzer = spec.add_kind(NodeKind::FftAnalyzer);
    let dest = spec.add_kind(NodeKind::Destination);
    spec.chain(&[noise, filter, analyzer, dest]);
    spec.tap(analyzer);

    let mut graph = GraphBuilder::new(SR, loader).build(&spec).expect("build");
    graph.start_source(noise).expect("start noise");
    graph
}

/// A mix-bus shaped chain: noise through every serial effect the labs use.
fn effect_stack_graph(loader: &SampleLoader) -> Graph {
    let mut spec = GraphSpec::new();
    let noise = spec.add(
        NodeSpec::new(NodeKind::SourceOscillator {
            osc: OscSpec::Wave(Waveform::Noise),
        })
        .with_param("level", 0.5),
    );
    let filter = spec.add(
        NodeSpec::new(NodeKind::Filter {
            shape: FilterShape::Lowpass,
        })
        .with_param("frequency", 4_000.0),
    );
    let compressor = spec.add(
        NodeSpec::new(NodeKind::Compressor)
            .with_param("threshold", -20.0)
            .with_param("ratio", 4.0),
    );
    let delay = spec.add(
        NodeSpec::new(NodeKind::Delay)
            .with_param("time", 0.25)
            .with_param("feedback", 0.3)
            .with_param("mix", 0.2),
    );
    let reverb = spec.add(NodeSpec::new(NodeKind::Reverb).with_param("mix", 0.2));
    let limiter = spec.add(NodeSpec::new(NodeKind::Limiter).with_param("threshold", -1.0));
    let dest = spec.add_kind(NodeKind::Destination);
    spec.chain(&[noise, filter, compressor, delay, reverb, limiter, dest]);

    let mut graph = GraphBuilder::new(SR, loader).build(&spec).expect("build");
    graph.start_source(noise).expect("start noise");
    graph
}

pub fn bench_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/graphs");
    let loader = SampleLoader::new();

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        let mut eq = eq_graph(&loader);
        group.bench_with_input(BenchmarkId::new("eq_lab", size), &size, |b, _| {
            b.iter(|| {
                eq.process_block(&[], black_box(&mut left), black_box(&mut right));
            })
        });

        let mut stack = effect_stack_graph(&loader);
        group.bench_with_input(BenchmarkId::new("effect_stack", size), &size, |b, _| {
            b.iter(|| {
                stack.process_block(&[], black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
