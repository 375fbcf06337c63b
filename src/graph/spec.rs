/*
Graph Specifications
====================

A `GraphSpec` is the declarative description of an audio graph: which
nodes exist (by kind), how they are wired, and which of them feed
analyzers. The same spec is materialized by the live engine and, for
exports, by the offline renderer — which is what guarantees the export
sounds like the page.

Node kinds form a CLOSED set. Adding an effect to the engine means adding
one variant here and one processor; nothing is duck-typed.

Validation happens before any node is constructed:

  - every edge references existing nodes and in-range ports,
  - exactly one destination exists and nothing feeds out of it,
  - the graph is a DAG (effects with internal feedback — delay, reverb,
    chorus — encapsulate it; spec-level cycles are rejected).
*/

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::envelope::EnvelopeSpec;
use crate::dsp::oscillator::OscSpec;
use crate::dsp::waveshaper::Oversample;
use crate::error::GraphError;
use crate::graph::node::NodeTag;

/// Identifier of a node within one graph spec.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of node kinds, with their structural configuration.
///
/// Anything listed inside a variant is *structural*: changing it requires
/// `ParameterBinder::replace`, not a parameter write.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Plays a decoded sample buffer, optionally looped.
    SourceBuffer { url: String, looped: bool },
    /// Single oscillator at a controllable frequency.
    SourceOscillator { osc: OscSpec },
    /// Polyphonic instrument: envelope + oscillator per voice.
    SourcePolyInstrument {
        osc: OscSpec,
        envelope: EnvelopeSpec,
        max_voices: usize,
    },
    /// Pitched playback of a sample, repitched from its root note.
    SourceSampler { url: String, root_midi: u8 },
    Gain,
    Filter { shape: crate::dsp::biquad::FilterShape },
    Compressor,
    Limiter,
    Saturation { oversample: Oversample },
    Delay,
    Reverb,
    Chorus,
    Tremolo,
    Panner3d,
    WaveformAnalyzer,
    FftAnalyzer,
    Destination,
}

impl NodeKind {
    /// Flat tag for handles, logs, and dispatch tables.
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::SourceBuffer { .. } => NodeTag::SourceBuffer,
            NodeKind::SourceOscillator { .. } => NodeTag::SourceOscillator,
            NodeKind::SourcePolyInstrument { .. } => NodeTag::SourcePolyInstrument,
            NodeKind::SourceSampler { .. } => NodeTag::SourceSampler,
            NodeKind::Gain => NodeTag::Gain,
            NodeKind::Filter { .. } => NodeTag::Filter,
            NodeKind::Compressor => NodeTag::Compressor,
            NodeKind::Limiter => NodeTag::Limiter,
            NodeKind::Saturation { .. } => NodeTag::Saturation,
            NodeKind::Delay => NodeTag::Delay,
            NodeKind::Reverb => NodeTag::Reverb,
            NodeKind::Chorus => NodeTag::Chorus,
            NodeKind::Tremolo => NodeTag::Tremolo,
            NodeKind::Panner3d => NodeTag::Panner3d,
            NodeKind::WaveformAnalyzer => NodeTag::WaveformAnalyzer,
            NodeKind::FftAnalyzer => NodeTag::FftAnalyzer,
            NodeKind::Destination => NodeTag::Destination,
        }
    }

    pub fn input_ports(&self) -> usize {
        match self.tag() {
            NodeTag::SourceBuffer
            | NodeTag::SourceOscillator
            | NodeTag::SourcePolyInstrument
            | NodeTag::SourceSampler => 0,
            _ => 1,
        }
    }

    pub fn output_ports(&self) -> usize {
        match self.tag() {
            NodeTag::Destination => 0,
            _ => 1,
        }
    }
}

/// One node entry: kind plus initial scalar parameters by name.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub initial_params: BTreeMap<String, f32>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            initial_params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: f32) -> Self {
        self.initial_params.insert(name.to_string(), value);
        self
    }
}

/// A directed connection between two node ports.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSpec {
    pub from: NodeId,
    pub from_port: usize,
    pub to: NodeId,
    pub to_port: usize,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSpec {
    pub nodes: BTreeMap<NodeId, NodeSpec>,
    pub edges: Vec<EdgeSpec>,
    pub analyzer_taps: BTreeSet<NodeId>,
    next_id: u32,
}

impl GraphSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its id.
    pub fn add(&mut self, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, spec);
        id
    }

    pub fn add_kind(&mut self, kind: NodeKind) -> NodeId {
        self.add(NodeSpec::new(kind))
    }

    /// Connect default ports of `from` → `to`.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.edges.push(EdgeSpec {
            from,
            from_port: 0,
            to,
            to_port: 0,
        });
    }

    /// Connect a series of nodes in a chain.
    pub fn chain(&mut self, ids: &[NodeId]) {
        for pair in ids.windows(2) {
            self.connect(pair[0], pair[1]);
        }
    }

    /// Mark a node for analyzer access.
    pub fn tap(&mut self, id: NodeId) {
        self.analyzer_taps.insert(id);
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, spec)| spec.kind.tag() == NodeTag::Destination)
            .map(|(id, _)| *id)
    }

    /// Check structural invariants; returns a topological order on success.
    pub fn validate(&self) -> Result<Vec<NodeId>, GraphError> {
        let destinations = self
            .nodes
            .values()
            .filter(|spec| spec.kind.tag() == NodeTag::Destination)
            .count();
        if destinations != 1 {
            return Err(GraphError::DestinationCount(destinations));
        }

        for edge in &self.edges {
            let from = self
                .nodes
                .get(&edge.from)
                .ok_or(GraphError::UnknownNode(edge.from))?;
            let to = self
                .nodes
                .get(&edge.to)
                .ok_or(GraphError::UnknownNode(edge.to))?;
            if edge.from_port >= from.kind.output_ports() {
                return Err(GraphError::BadPort {
                    node: edge.from,
                    port: edge.from_port,
                });
            }
            if edge.to_port >= to.kind.input_ports() {
                return Err(GraphError::BadPort {
                    node: edge.to,
                    port: edge.to_port,
                });
            }
        }

        self.topological_order()
    }

    /// Kahn's algorithm; fails if a cycle remains.
    fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut in_degree: BTreeMap<NodeId, usize> =
            self.nodes.keys().map(|&id| (id, 0)).collect();
        for edge in &self.edges {
            *in_degree.entry(edge.to).or_insert(0) += 1;
        }

        let mut ready: Vec<NodeId> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = ready.pop() {
            order.push(id);
            for edge in self.edges.iter().filter(|e| e.from == id) {
                let deg = in_degree.get_mut(&edge.to).expect("validated above");
                *deg -= 1;
                if *deg == 0 {
                    ready.push(edge.to);
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err(GraphError::CycleDetected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::biquad::FilterShape;
    use crate::dsp::oscillator::{OscSpec, Waveform};

    fn osc_kind() -> NodeKind {
        NodeKind::SourceOscillator {
            osc: OscSpec::Wave(Waveform::Sine),
        }
    }

    #[test]
    fn simple_chain_validates() {
        let mut spec = GraphSpec::new();
        let osc = spec.add_kind(osc_kind());
        let filter = spec.add_kind(NodeKind::Filter {
            shape: FilterShape::Lowpass,
        });
        let dest = spec.add_kind(NodeKind::Destination);
        spec.chain(&[osc, filter, dest]);

        let order = spec.validate().expect("valid chain");
        let osc_pos = order.iter().position(|&id| id == osc).unwrap();
        let dest_pos = order.iter().position(|&id| id == dest).unwrap();
        assert!(osc_pos < dest_pos, "sources sort before the destination");
    }

    #[test]
    fn missing_destination_is_rejected() {
        let mut spec = GraphSpec::new();
        spec.add_kind(osc_kind());
        assert_eq!(spec.validate(), Err(GraphError::DestinationCount(0)));
    }

    #[test]
    fn two_destinations_are_rejected() {
        let mut spec = GraphSpec::new();
        spec.add_kind(NodeKind::Destination);
        spec.add_kind(NodeKind::Destination);
        assert_eq!(spec.validate(), Err(GraphError::DestinationCount(2)));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut spec = GraphSpec::new();
        let a = spec.add_kind(NodeKind::Gain);
        let b = spec.add_kind(NodeKind::Gain);
        let dest = spec.add_kind(NodeKind::Destination);
        spec.connect(a, b);
        spec.connect(b, a);
        spec.connect(b, dest);

        assert_eq!(spec.validate(), Err(GraphError::CycleDetected));
    }

    #[test]
    fn edge_into_a_source_is_rejected() {
        let mut spec = GraphSpec::new();
        let gain = spec.add_kind(NodeKind::Gain);
        let osc = spec.add_kind(osc_kind());
        let dest = spec.add_kind(NodeKind::Destination);
        spec.connect(gain, osc); // sources have no inputs
        spec.connect(osc, dest);

        assert!(matches!(
            spec.validate(),
            Err(GraphError::BadPort { port: 0, .. })
        ));
    }

    #[test]
    fn edge_to_unknown_node_is_rejected() {
        let mut spec = GraphSpec::new();
        let osc = spec.add_kind(osc_kind());
        spec.add_kind(NodeKind::Destination);
        spec.edges.push(EdgeSpec {
            from: osc,
            from_port: 0,
            to: NodeId(999),
            to_port: 0,
        });
        assert_eq!(spec.validate(), Err(GraphError::UnknownNode(NodeId(999))));
    }

    #[test]
    fn fan_in_and_fan_out_validate() {
        let mut spec = GraphSpec::new();
        let a = spec.add_kind(osc_kind());
        let b = spec.add_kind(osc_kind());
        let mix = spec.add_kind(NodeKind::Gain);
        let dest = spec.add_kind(NodeKind::Destination);
        spec.connect(a, mix);
        spec.connect(b, mix);
        spec.connect(mix, dest);

        assert!(spec.validate().is_ok());
    }
}
