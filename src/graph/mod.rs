//! The audio-graph layer: declarative specs, typed node constructors, and
//! the block-based render engine.
//!
//! Widgets describe a graph once (`spec`), build it (`build`), then only
//! ever write parameters or send events — the no-rebuild rule. Analyzer
//! taps hang off the graph feed-forward; disposal is a single explicit
//! teardown that every handle observes.

/// Feed-forward analyzer taps and their UI-side readers.
pub mod analyzer;
/// Graph materialization and the render loop.
pub mod build;
/// Modulated-delay chorus effect.
pub mod chorus;
/// Dynamics compressor with a lock-free reduction meter.
pub mod compressor;
/// Feedback delay effect.
pub mod delay;
/// Filter/EQ sections over RBJ biquads.
pub mod filter;
/// Smoothed gain stage.
pub mod gain;
/// Lookahead brickwall limiter.
pub mod limiter;
/// Handles, tags, ramps, and the render context.
pub mod node;
/// 3-D spatial panner.
pub mod panner;
/// Polyphonic instrument with voice stealing.
pub mod poly;
/// Stereo Schroeder reverb.
pub mod reverb;
/// Drive/oversample saturation.
pub mod saturation;
/// Buffer, oscillator, and sampler sources.
pub mod source;
/// Declarative graph descriptions and validation.
pub mod spec;
/// Amplitude-modulation tremolo.
pub mod tremolo;

pub use build::{EventAction, Graph, GraphBuilder, Processor, ScheduledEvent};
pub use node::{NodeHandle, NodeTag, Ramp, RenderCtx};
pub use spec::{EdgeSpec, GraphSpec, NodeId, NodeKind, NodeSpec};
