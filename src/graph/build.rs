/*
Graph Materialization
=====================

`GraphBuilder::build` turns a validated `GraphSpec` into a running `Graph`:

  - nodes are stored in TOPOLOGICAL order, so every node's inputs sit at
    smaller indices — the render loop can split the slice and read input
    buffers while writing the current node's, with no copies and no locks;
  - each node owns a stereo scratch pair sized to `MAX_BLOCK_SIZE`;
  - construction is transactional: any failure drops the half-built state
    on the way out (RAII), leaving nothing allocated or audible.

Rendering walks the order once per segment. A block is split into
segments at every scheduled event frame, which is how "sample-accurate"
is implemented: an event lands exactly between two segments, never
quantized to a block boundary.

Disposal flips a flag shared with every `NodeHandle`, clears the node
table in reverse topological order, and turns every subsequent operation
into a logged no-op. UI callbacks racing a disposed graph are expected
and harmless.
*/

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::dsp::dynamics::GainComputer;
use crate::error::{EngineError, GraphError};
use crate::graph::analyzer::{AnalyzerNode, AnalyzerReader};
use crate::graph::chorus::ChorusNode;
use crate::graph::compressor::{CompressorNode, ReductionReader};
use crate::graph::delay::DelayNode;
use crate::graph::filter::FilterSection;
use crate::graph::gain::GainStage;
use crate::graph::limiter::LimiterNode;
use crate::graph::node::{NodeHandle, NodeTag, Ramp, RenderCtx};
use crate::graph::panner::PannerNode;
use crate::graph::poly::PolyInstrument;
use crate::graph::reverb::ReverbNode;
use crate::graph::saturation::SaturationNode;
use crate::graph::source::{BufferSource, OscillatorSource, SamplerSource};
use crate::graph::spec::{GraphSpec, NodeId, NodeKind, NodeSpec};
use crate::graph::tremolo::TremoloNode;
use crate::loader::SampleLoader;
use crate::MAX_BLOCK_SIZE;

/// One variant per node kind: the closed dispatch table.
pub enum Processor {
    SourceBuffer(BufferSource),
    SourceOscillator(OscillatorSource),
    SourcePolyInstrument(PolyInstrument),
    SourceSampler(SamplerSource),
    Gain(GainStage),
    Filter(FilterSection),
    Compressor(CompressorNode),
    Limiter(LimiterNode),
    Saturation(SaturationNode),
    Delay(DelayNode),
    Reverb(ReverbNode),
    Chorus(ChorusNode),
    Tremolo(TremoloNode),
    Panner3d(PannerNode),
    Analyzer(AnalyzerNode),
    Destination,
}

impl Processor {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        match self {
            Processor::SourceBuffer(p) => p.process_add(left, right, ctx),
            Processor::SourceOscillator(p) => p.process_add(left, right, ctx),
            Processor::SourcePolyInstrument(p) => p.process_add(left, right, ctx),
            Processor::SourceSampler(p) => p.process_add(left, right, ctx),
            Processor::Gain(p) => p.process(left, right, ctx),
            Processor::Filter(p) => p.process(left, right, ctx),
            Processor::Compressor(p) => p.process(left, right, ctx),
            Processor::Limiter(p) => p.process(left, right, ctx),
            Processor::Saturation(p) => p.process(left, right, ctx),
            Processor::Delay(p) => p.process(left, right, ctx),
            Processor::Reverb(p) => p.process(left, right, ctx),
            Processor::Chorus(p) => p.process(left, right, ctx),
            Processor::Tremolo(p) => p.process(left, right, ctx),
            Processor::Panner3d(p) => p.process(left, right, ctx),
            Processor::Analyzer(p) => p.process(left, right, ctx),
            Processor::Destination => {}
        }
    }

    fn set_param(&mut self, name: &str, value: f32, ramp: Ramp) -> bool {
        match self {
            Processor::SourceBuffer(p) => p.set_param(name, value, ramp),
            Processor::SourceOscillator(p) => p.set_param(name, value, ramp),
            Processor::SourcePolyInstrument(p) => p.set_param(name, value, ramp),
            Processor::SourceSampler(p) => p.set_param(name, value, ramp),
            Processor::Gain(p) => p.set_param(name, value, ramp),
            Processor::Filter(p) => p.set_param(name, value, ramp),
            Processor::Compressor(p) => p.set_param(name, value, ramp),
            Processor::Limiter(p) => p.set_param(name, value, ramp),
            Processor::Saturation(p) => p.set_param(name, value, ramp),
            Processor::Delay(p) => p.set_param(name, value, ramp),
            Processor::Reverb(p) => p.set_param(name, value, ramp),
            Processor::Chorus(p) => p.set_param(name, value, ramp),
            Processor::Tremolo(p) => p.set_param(name, value, ramp),
            Processor::Panner3d(p) => p.set_param(name, value, ramp),
            Processor::Analyzer(_) | Processor::Destination => false,
        }
    }
}

/// A source lifecycle or note event at an absolute frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    Start,
    Stop,
    NoteOn { midi: u8, velocity: f32 },
    NoteOff { midi: u8 },
    AllNotesOff,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub frame: u64,
    pub node: NodeId,
    pub action: EventAction,
}

struct NodeEntry {
    id: NodeId,
    tag: NodeTag,
    processor: Processor,
    out_l: Vec<f32>,
    out_r: Vec<f32>,
}

pub struct GraphBuilder<'a> {
    sample_rate: f32,
    loader: &'a SampleLoader,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(sample_rate: f32, loader: &'a SampleLoader) -> Self {
        Self {
            sample_rate,
            loader,
        }
    }

    pub fn build(&self, spec: &GraphSpec) -> Result<Graph, EngineError> {
        let order = spec.validate()?;

        let mut entries = Vec::with_capacity(order.len());
        let mut index_of: BTreeMap<NodeId, usize> = BTreeMap::new();

        for &id in &order {
            let node_spec = &spec.nodes[&id];
            let mut processor = self.construct(node_spec)?;
            for (name, &value) in &node_spec.initial_params {
                if !processor.set_param(name, value, Ramp::step()) {
                    return Err(GraphError::BadParam {
                        node: id,
                        param: name.clone(),
                    }
                    .into());
                }
            }
            index_of.insert(id, entries.len());
            entries.push(NodeEntry {
                id,
                tag: node_spec.kind.tag(),
                processor,
                out_l: vec![0.0; MAX_BLOCK_SIZE],
                out_r: vec![0.0; MAX_BLOCK_SIZE],
            });
        }

        // Input lists by topological index; inputs always precede readers.
        let mut inputs: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
        for edge in &spec.edges {
            let from = index_of[&edge.from];
            let to = index_of[&edge.to];
            debug_assert!(from < to, "topological order violated");
            inputs[to].push(from);
        }

        let destination = spec
            .destination()
            .expect("validate() guarantees a destination");

        tracing::debug!(
            nodes = entries.len(),
            edges = spec.edges.len(),
            "graph built"
        );

        Ok(Graph {
            sample_rate: self.sample_rate,
            entries,
            inputs,
            index_of,
            destination,
            disposed: Arc::new(AtomicBool::new(false)),
            clock: 0,
        })
    }

    fn construct(&self, node_spec: &NodeSpec) -> Result<Processor, EngineError> {
        Ok(match &node_spec.kind {
            NodeKind::SourceBuffer { url, looped } => {
                let buffer = self.loader.get(url).ok_or(EngineError::NotLoaded)?;
                Processor::SourceBuffer(BufferSource::new(buffer, *looped))
            }
            NodeKind::SourceOscillator { osc } => {
                Processor::SourceOscillator(OscillatorSource::new(osc.clone()))
            }
            NodeKind::SourcePolyInstrument {
                osc,
                envelope,
                max_voices,
            } => Processor::SourcePolyInstrument(PolyInstrument::new(
                self.sample_rate,
                osc,
                *envelope,
                *max_voices,
            )),
            NodeKind::SourceSampler { url, root_midi } => {
                let buffer = self.loader.get(url).ok_or(EngineError::NotLoaded)?;
                Processor::SourceSampler(SamplerSource::new(buffer, *root_midi))
            }
            NodeKind::Gain => Processor::Gain(GainStage::new()),
            NodeKind::Filter { shape } => {
                Processor::Filter(FilterSection::new(*shape, self.sample_rate))
            }
            NodeKind::Compressor => Processor::Compressor(CompressorNode::new(self.sample_rate)),
            NodeKind::Limiter => Processor::Limiter(LimiterNode::new(self.sample_rate)),
            NodeKind::Saturation { oversample } => {
                Processor::Saturation(SaturationNode::new(*oversample))
            }
            NodeKind::Delay => Processor::Delay(DelayNode::new(self.sample_rate)),
            NodeKind::Reverb => Processor::Reverb(ReverbNode::new(self.sample_rate)),
            NodeKind::Chorus => Processor::Chorus(ChorusNode::new(self.sample_rate)),
            NodeKind::Tremolo => Processor::Tremolo(TremoloNode::new(self.sample_rate)),
            NodeKind::Panner3d => Processor::Panner3d(PannerNode::new(self.sample_rate)),
            NodeKind::WaveformAnalyzer => Processor::Analyzer(AnalyzerNode::waveform()),
            NodeKind::FftAnalyzer => Processor::Analyzer(AnalyzerNode::fft()),
            NodeKind::Destination => Processor::Destination,
        })
    }
}

pub struct Graph {
    sample_rate: f32,
    entries: Vec<NodeEntry>,
    inputs: Vec<Vec<usize>>,
    index_of: BTreeMap<NodeId, usize>,
    destination: NodeId,
    disposed: Arc<AtomicBool>,
    clock: u64,
}

impl Graph {
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered so far (the graph's audio clock).
    pub fn current_frame(&self) -> u64 {
        self.clock
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Ids of every live node, in topological order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    pub fn handle(&self, id: NodeId) -> Option<NodeHandle> {
        let idx = *self.index_of.get(&id)?;
        let entry = self.entries.get(idx)?;
        let (inputs, outputs) = match entry.tag {
            NodeTag::SourceBuffer
            | NodeTag::SourceOscillator
            | NodeTag::SourcePolyInstrument
            | NodeTag::SourceSampler => (0, 1),
            NodeTag::Destination => (1, 0),
            _ => (1, 1),
        };
        Some(NodeHandle::new(
            id,
            entry.tag,
            inputs,
            outputs,
            self.disposed.clone(),
        ))
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        if self.is_disposed() {
            return None;
        }
        let idx = *self.index_of.get(&id)?;
        self.entries.get_mut(idx)
    }

    /// Write a parameter. Never fails: bad targets log and no-op, which is
    /// what lets animation-frame callbacks race widget teardown safely.
    pub fn set_param(&mut self, id: NodeId, name: &str, value: f32, ramp: Ramp) {
        if self.is_disposed() {
            tracing::warn!(node = %id, param = name, "write to disposed graph ignored");
            return;
        }
        match self.entry_mut(id) {
            Some(entry) => {
                if !entry.processor.set_param(name, value, ramp) {
                    tracing::warn!(node = %id, param = name, "unknown parameter ignored");
                }
            }
            None => tracing::warn!(node = %id, param = name, "unknown node ignored"),
        }
    }

    /// Analyzer window reader, if `id` is an analyzer.
    pub fn tap(&self, id: NodeId) -> Option<AnalyzerReader> {
        let idx = *self.index_of.get(&id)?;
        match &self.entries.get(idx)?.processor {
            Processor::Analyzer(node) => Some(node.reader()),
            _ => None,
        }
    }

    /// The live filter curve, if `id` is a filter.
    pub fn frequency_response(&self, id: NodeId, frequencies: &[f32]) -> Option<Vec<f32>> {
        let idx = *self.index_of.get(&id)?;
        match &self.entries.get(idx)?.processor {
            Processor::Filter(section) => Some(section.frequency_response(frequencies)),
            _ => None,
        }
    }

    /// Lock-free reduction meter, if `id` is a compressor.
    pub fn reduction_reader(&self, id: NodeId) -> Option<ReductionReader> {
        let idx = *self.index_of.get(&id)?;
        match &self.entries.get(idx)?.processor {
            Processor::Compressor(node) => Some(node.reduction_reader()),
            _ => None,
        }
    }

    /// Static-curve parameters, if `id` is a compressor.
    pub fn transfer_params(&self, id: NodeId) -> Option<GainComputer> {
        let idx = *self.index_of.get(&id)?;
        match &self.entries.get(idx)?.processor {
            Processor::Compressor(node) => Some(node.transfer_params()),
            _ => None,
        }
    }

    pub fn start_source(&mut self, id: NodeId) -> Result<(), EngineError> {
        if self.is_disposed() {
            return Err(EngineError::DisposedHandle { node: id });
        }
        match self.entry_mut(id).map(|e| &mut e.processor) {
            Some(Processor::SourceBuffer(source)) => source.start(),
            Some(Processor::SourceOscillator(source)) => source.start(),
            Some(_) => Err(EngineError::InvalidState(format!(
                "node {id} is not a startable source"
            ))),
            None => Err(EngineError::InvalidState(format!("unknown node {id}"))),
        }
    }

    /// Stop a source. Double-stop and stop-before-start are tolerated.
    pub fn stop_source(&mut self, id: NodeId) {
        match self.entry_mut(id).map(|e| &mut e.processor) {
            Some(Processor::SourceBuffer(source)) => source.stop(),
            Some(Processor::SourceOscillator(source)) => source.stop(),
            _ => {}
        }
    }

    /// Re-arm a stopped one-shot source so it may start again.
    pub fn reset_source(&mut self, id: NodeId) {
        match self.entry_mut(id).map(|e| &mut e.processor) {
            Some(Processor::SourceBuffer(source)) => source.reset(),
            Some(Processor::SourceOscillator(source)) => source.reset(),
            _ => {}
        }
    }

    pub fn note_on(&mut self, id: NodeId, midi: u8, velocity: f32) {
        match self.entry_mut(id).map(|e| &mut e.processor) {
            Some(Processor::SourcePolyInstrument(poly)) => poly.attack(midi, velocity),
            Some(Processor::SourceSampler(sampler)) => sampler.note_on(midi, velocity),
            _ => tracing::warn!(node = %id, "note_on to a non-instrument ignored"),
        }
    }

    pub fn note_off(&mut self, id: NodeId, midi: u8) {
        match self.entry_mut(id).map(|e| &mut e.processor) {
            Some(Processor::SourcePolyInstrument(poly)) => poly.release(midi),
            Some(Processor::SourceSampler(sampler)) => sampler.note_off(midi),
            _ => {}
        }
    }

    pub fn all_notes_off(&mut self) {
        if self.is_disposed() {
            return;
        }
        for entry in &mut self.entries {
            match &mut entry.processor {
                Processor::SourcePolyInstrument(poly) => poly.release_all(),
                Processor::SourceSampler(sampler) => sampler.all_notes_off(),
                _ => {}
            }
        }
    }

    /// Held pitches of a poly instrument (for the piano highlight).
    pub fn held_pitches(&self, id: NodeId) -> Vec<u8> {
        let Some(&idx) = self.index_of.get(&id) else {
            return Vec::new();
        };
        match &self.entries[idx].processor {
            Processor::SourcePolyInstrument(poly) => poly.held_pitches(),
            _ => Vec::new(),
        }
    }

    fn apply_event(&mut self, event: &ScheduledEvent) {
        let result = match &event.action {
            EventAction::Start => self.start_source(event.node),
            EventAction::Stop => {
                self.stop_source(event.node);
                Ok(())
            }
            EventAction::NoteOn { midi, velocity } => {
                self.note_on(event.node, *midi, *velocity);
                Ok(())
            }
            EventAction::NoteOff { midi } => {
                self.note_off(event.node, *midi);
                Ok(())
            }
            EventAction::AllNotesOff => {
                self.all_notes_off();
                Ok(())
            }
        };
        if let Err(error) = result {
            tracing::warn!(node = %event.node, %error, "scheduled event dropped");
        }
    }

    /// Render one block. `events` must be sorted by frame; events before
    /// the block are applied immediately, events beyond it are ignored.
    pub fn process_block(
        &mut self,
        events: &[ScheduledEvent],
        out_left: &mut [f32],
        out_right: &mut [f32],
    ) {
        let frames = out_left.len().min(out_right.len()).min(MAX_BLOCK_SIZE);
        if self.is_disposed() {
            out_left[..frames].fill(0.0);
            out_right[..frames].fill(0.0);
            return;
        }

        let block_start = self.clock;
        let block_end = block_start + frames as u64;
        let mut event_idx = 0;
        let mut segment_start = 0usize;

        while segment_start < frames {
            // Apply everything due at or before the segment boundary
            while event_idx < events.len()
                && events[event_idx].frame <= block_start + segment_start as u64
            {
                let event = events[event_idx].clone();
                self.apply_event(&event);
                event_idx += 1;
            }

            // Next split point: the earliest future event inside the block
            let segment_end = events[event_idx..]
                .iter()
                .map(|e| e.frame)
                .find(|&f| f < block_end)
                .map(|f| (f - block_start) as usize)
                .unwrap_or(frames);

            let ctx = RenderCtx::new(self.sample_rate, block_start + segment_start as u64);
            self.process_segment(segment_start, segment_end, &ctx);
            segment_start = segment_end;
        }

        // Copy the destination's input mix out
        let dest_idx = self.index_of[&self.destination];
        // The destination node never writes its buffers itself; its inputs
        // were summed into them by process_segment.
        out_left[..frames].copy_from_slice(&self.entries[dest_idx].out_l[..frames]);
        out_right[..frames].copy_from_slice(&self.entries[dest_idx].out_r[..frames]);

        self.clock = block_end;
    }

    fn process_segment(&mut self, start: usize, end: usize, ctx: &RenderCtx) {
        if start >= end {
            return;
        }
        for i in 0..self.entries.len() {
            let (before, rest) = self.entries.split_at_mut(i);
            let entry = &mut rest[0];

            let left = &mut entry.out_l[start..end];
            let right = &mut entry.out_r[start..end];
            left.fill(0.0);
            right.fill(0.0);

            for &input_idx in &self.inputs[i] {
                let input = &before[input_idx];
                for (dst, src) in left.iter_mut().zip(&input.out_l[start..end]) {
                    *dst += *src;
                }
                for (dst, src) in right.iter_mut().zip(&input.out_r[start..end]) {
                    *dst += *src;
                }
            }

            entry.processor.process(left, right, ctx);
        }
    }

    /// Rebuild one node in place, keeping its edges. This is the
    /// structural-change path behind `ParameterBinder::replace`.
    pub fn replace_node(
        &mut self,
        id: NodeId,
        new_spec: &NodeSpec,
        loader: &SampleLoader,
    ) -> Result<(), EngineError> {
        if self.is_disposed() {
            return Err(EngineError::DisposedHandle { node: id });
        }
        let idx = *self
            .index_of
            .get(&id)
            .ok_or_else(|| EngineError::InvalidState(format!("unknown node {id}")))?;

        let old_tag = self.entries[idx].tag;
        let new_tag = new_spec.kind.tag();
        let port_shape = |tag: NodeTag| match tag {
            NodeTag::SourceBuffer
            | NodeTag::SourceOscillator
            | NodeTag::SourcePolyInstrument
            | NodeTag::SourceSampler => (0usize, 1usize),
            NodeTag::Destination => (1, 0),
            _ => (1, 1),
        };
        if port_shape(old_tag) != port_shape(new_tag) {
            return Err(EngineError::InvalidState(format!(
                "replace of {id} would change port shape ({old_tag} -> {new_tag})"
            )));
        }

        let builder = GraphBuilder::new(self.sample_rate, loader);
        let mut processor = builder.construct(new_spec)?;
        for (name, &value) in &new_spec.initial_params {
            if !processor.set_param(name, value, Ramp::step()) {
                return Err(GraphError::BadParam {
                    node: id,
                    param: name.clone(),
                }
                .into());
            }
        }

        tracing::debug!(node = %id, from = %old_tag, to = %new_tag, "node replaced");
        self.entries[idx].processor = processor;
        self.entries[idx].tag = new_tag;
        Ok(())
    }

    /// Tear the graph down. Idempotent; afterwards every operation routed
    /// through the graph or its handles is a logged no-op.
    pub fn dispose(&mut self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        // Release in reverse topological order: downstream consumers go
        // before the sources that feed them.
        while let Some(entry) = self.entries.pop() {
            drop(entry);
        }
        self.inputs.clear();
        self.index_of.clear();
        tracing::debug!("graph disposed");
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        self.dispose();
    }
}
