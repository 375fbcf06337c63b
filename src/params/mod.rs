/*
Parameter Binding
=================

The one road from UI values to audio-graph parameters. The binder enforces
the engine's central rule:

    update parameters, never rebuild the graph.

`set` writes a value with an anti-zipper ramp; repeated writes within one
frame coalesce so only the last value per (node, parameter) reaches the
graph — dragging a slider stages dozens of values but commits one. The
graph is only restructured through `replace`, which rebuilds exactly one
node and re-uses its wiring; switching a filter's shape or an oscillator's
waveform goes through there.

The binder shares the graph with the audio driver behind a mutex. Writes
take the lock briefly once per flush; they never allocate inside it.
*/

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::dsp::smoother::{RampKind, DEFAULT_RAMP_SECONDS};
use crate::error::EngineError;
use crate::graph::{Graph, NodeId, NodeSpec, Ramp};
use crate::loader::SampleLoader;

/// How a bound parameter should move when written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampPolicy {
    /// Jump immediately (enum-like values, step cells).
    Step,
    /// Default ~15 ms linear glide.
    Smooth,
    /// Linear glide over a custom duration in seconds.
    Glide(f32),
    /// Exponential glide (frequency-like parameters).
    Exponential(f32),
}

impl RampPolicy {
    fn to_ramp(self, sample_rate: f32) -> Ramp {
        match self {
            RampPolicy::Step => Ramp::step(),
            RampPolicy::Smooth => Ramp::linear((DEFAULT_RAMP_SECONDS * sample_rate) as u32),
            RampPolicy::Glide(seconds) => {
                Ramp::linear((seconds.max(0.0) * sample_rate) as u32)
            }
            RampPolicy::Exponential(seconds) => {
                Ramp::exponential((seconds.max(0.0) * sample_rate) as u32)
            }
        }
    }
}

pub struct ParameterBinder {
    graph: Arc<Mutex<Graph>>,
    sample_rate: f32,
    /// Staged writes, last value per key wins at flush time.
    pending: BTreeMap<(NodeId, String), (f32, RampPolicy)>,
}

impl ParameterBinder {
    pub fn new(graph: Arc<Mutex<Graph>>, sample_rate: f32) -> Self {
        Self {
            graph,
            sample_rate,
            pending: BTreeMap::new(),
        }
    }

    /// Stage a parameter write. Idempotent: staging the same value twice
    /// is indistinguishable from staging it once.
    pub fn set(&mut self, node: NodeId, param: &str, value: f32, policy: Option<RampPolicy>) {
        let policy = policy.unwrap_or(RampPolicy::Smooth);
        self.pending
            .insert((node, param.to_string()), (value, policy));
    }

    /// Stage with an explicit ramp kind, mapped onto the default duration.
    pub fn set_with_kind(&mut self, node: NodeId, param: &str, value: f32, kind: RampKind) {
        let policy = match kind {
            RampKind::Step => RampPolicy::Step,
            RampKind::Linear => RampPolicy::Smooth,
            RampKind::Exponential => RampPolicy::Exponential(DEFAULT_RAMP_SECONDS),
        };
        self.set(node, param, value, Some(policy));
    }

    /// Number of writes waiting for the next flush.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Commit all staged writes to the graph. Called once per UI frame.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
        for ((node, param), (value, policy)) in std::mem::take(&mut self.pending) {
            graph.set_param(node, &param, value, policy.to_ramp(self.sample_rate));
        }
    }

    /// Write-through convenience for callers without a frame loop.
    pub fn set_now(&mut self, node: NodeId, param: &str, value: f32, policy: Option<RampPolicy>) {
        self.set(node, param, value, policy);
        self.flush();
    }

    /// Structural change: rebuild one node from a new spec, keeping its
    /// edges. This is the ONLY sanctioned way to change a node's kind or
    /// its kind-level configuration.
    pub fn replace(
        &mut self,
        node: NodeId,
        new_spec: &NodeSpec,
        loader: &SampleLoader,
    ) -> Result<(), EngineError> {
        // Drop staged writes for the node being replaced; they addressed
        // the old processor.
        self.pending.retain(|(id, _), _| *id != node);

        let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
        graph.replace_node(node, new_spec, loader)
    }
}
