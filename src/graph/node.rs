//! Node identity: tags, handles, and the render context.
//!
//! A `NodeHandle` is the only thing a widget holds onto after building a
//! graph. It is deliberately dumb — an id, a tag, port counts, and a
//! disposed flag shared with the graph. Once the graph is disposed every
//! operation routed through a handle logs and becomes a no-op; nothing
//! ever throws at a widget racing its own teardown.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::dsp::smoother::RampKind;
use crate::graph::spec::NodeId;

/// Flat kind tag: the closed set from the data model, used in logs and
/// dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    SourceBuffer,
    SourceOscillator,
    SourcePolyInstrument,
    SourceSampler,
    Gain,
    Filter,
    Compressor,
    Limiter,
    Saturation,
    Delay,
    Reverb,
    Chorus,
    Tremolo,
    Panner3d,
    WaveformAnalyzer,
    FftAnalyzer,
    Destination,
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeTag::SourceBuffer => "source-buffer",
            NodeTag::SourceOscillator => "source-oscillator",
            NodeTag::SourcePolyInstrument => "source-polyinstrument",
            NodeTag::SourceSampler => "source-sampler",
            NodeTag::Gain => "gain",
            NodeTag::Filter => "filter",
            NodeTag::Compressor => "compressor",
            NodeTag::Limiter => "limiter",
            NodeTag::Saturation => "saturation",
            NodeTag::Delay => "delay",
            NodeTag::Reverb => "reverb",
            NodeTag::Chorus => "chorus",
            NodeTag::Tremolo => "tremolo",
            NodeTag::Panner3d => "panner3d",
            NodeTag::WaveformAnalyzer => "waveform-analyzer",
            NodeTag::FftAnalyzer => "fft-analyzer",
            NodeTag::Destination => "destination",
        };
        f.write_str(name)
    }
}

/// Opaque reference to a built node.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    id: NodeId,
    tag: NodeTag,
    input_ports: usize,
    output_ports: usize,
    disposed: Arc<AtomicBool>,
}

impl NodeHandle {
    pub(crate) fn new(
        id: NodeId,
        tag: NodeTag,
        input_ports: usize,
        output_ports: usize,
        disposed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            tag,
            input_ports,
            output_ports,
            disposed,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> NodeTag {
        self.tag
    }

    pub fn input_ports(&self) -> usize {
        self.input_ports
    }

    pub fn output_ports(&self) -> usize {
        self.output_ports
    }

    /// True once the owning graph has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// A ramp request attached to a parameter write, in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    pub kind: RampKind,
    pub samples: u32,
}

impl Ramp {
    pub fn step() -> Self {
        Self {
            kind: RampKind::Step,
            samples: 0,
        }
    }

    pub fn linear(samples: u32) -> Self {
        Self {
            kind: RampKind::Linear,
            samples,
        }
    }

    pub fn exponential(samples: u32) -> Self {
        Self {
            kind: RampKind::Exponential,
            samples,
        }
    }
}

/// Per-block render context passed to every processor.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    /// Absolute frame index of the first sample in the current slice.
    /// Time-dependent effects (tremolo, chorus LFOs) derive their phase
    /// from this so live and offline renders line up.
    pub start_frame: u64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, start_frame: u64) -> Self {
        Self {
            sample_rate,
            start_frame,
        }
    }

    pub fn time_seconds(&self) -> f64 {
        self.start_frame as f64 / self.sample_rate as f64
    }
}
