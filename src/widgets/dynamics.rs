/*
Dynamics Explorer
=================

White noise at a controllable level through a compressor, then a safety
limiter, with a waveform analyzer on the output. The view plots the
theoretical transfer curve from (threshold, ratio, knee) and a meter fed
by the compressor's read-only reduction signal — the point of the widget
is watching the measured meter track the static curve.
*/

use std::cell::Cell;

use crate::dsp::oscillator::{OscSpec, Waveform};
use crate::graph::{GraphSpec, NodeId, NodeKind, NodeSpec};
use crate::harness::{ParameterDecl, Widget};
use crate::loader::SampleLoader;
use crate::params::RampPolicy;

pub struct DynamicsLabWidget {
    noise: Cell<Option<NodeId>>,
    compressor: Cell<Option<NodeId>>,
    limiter: Cell<Option<NodeId>>,
    analyzer: Cell<Option<NodeId>>,
}

impl DynamicsLabWidget {
    pub fn new() -> Self {
        Self {
            noise: Cell::new(None),
            compressor: Cell::new(None),
            limiter: Cell::new(None),
            analyzer: Cell::new(None),
        }
    }

    pub fn compressor_node(&self) -> Option<NodeId> {
        self.compressor.get()
    }

    pub fn limiter_node(&self) -> Option<NodeId> {
        self.limiter.get()
    }

    pub fn analyzer_node(&self) -> Option<NodeId> {
        self.analyzer.get()
    }
}

impl Default for DynamicsLabWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for DynamicsLabWidget {
    fn name(&self) -> &'static str {
        "dynamics-lab"
    }

    fn graph_spec(&self, _loader: &SampleLoader) -> GraphSpec {
        let mut spec = GraphSpec::new();
        let noise = spec.add(
            NodeSpec::new(NodeKind::SourceOscillator {
                osc: OscSpec::Wave(Waveform::Noise),
            })
            // -6 dBFS noise into the detector
            .with_param("level", 0.5),
        );
        let compressor = spec.add(
            NodeSpec::new(NodeKind::Compressor)
                .with_param("threshold", -20.0)
                .with_param("ratio", 4.0)
                .with_param("knee", 0.0)
                .with_param("attack", 0.003)
                .with_param("release", 0.25),
        );
        let limiter = spec.add(NodeSpec::new(NodeKind::Limiter).with_param("threshold", -1.0));
        let analyzer = spec.add_kind(NodeKind::WaveformAnalyzer);
        let dest = spec.add_kind(NodeKind::Destination);
        spec.chain(&[noise, compressor, limiter, analyzer, dest]);
        spec.tap(analyzer);

        self.noise.set(Some(noise));
        self.compressor.set(Some(compressor));
        self.limiter.set(Some(limiter));
        self.analyzer.set(Some(analyzer));
        spec
    }

    fn autostart_sources(&self) -> Vec<NodeId> {
        self.noise.get().into_iter().collect()
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        let compressor = self.compressor.get().expect("graph built first");
        let noise = self.noise.get().expect("graph built first");
        vec![
            ParameterDecl {
                id: "input",
                node: noise,
                param: "level",
                min: 0.0,
                max: 1.0,
                default: 0.5,
                ramp: RampPolicy::Smooth,
            },
            ParameterDecl {
                id: "threshold",
                node: compressor,
                param: "threshold",
                min: -60.0,
                max: 0.0,
                default: -20.0,
                ramp: RampPolicy::Step,
            },
            ParameterDecl {
                id: "ratio",
                node: compressor,
                param: "ratio",
                min: 1.0,
                max: 20.0,
                default: 4.0,
                ramp: RampPolicy::Step,
            },
            ParameterDecl {
                id: "knee",
                node: compressor,
                param: "knee",
                min: 0.0,
                max: 40.0,
                default: 0.0,
                ramp: RampPolicy::Step,
            },
            ParameterDecl {
                id: "attack",
                node: compressor,
                param: "attack",
                min: 0.001,
                max: 1.0,
                default: 0.003,
                ramp: RampPolicy::Step,
            },
            ParameterDecl {
                id: "release",
                node: compressor,
                param: "release",
                min: 0.01,
                max: 1.0,
                default: 0.25,
                ramp: RampPolicy::Step,
            },
        ]
    }
}
