//! Analyzer-to-draw-data pipelines.
//!
//! Everything here is UI-side and allocation-tolerant: it reads analyzer
//! taps, transport ticks, or node curves and produces screen-space data.
//! Nothing in this module touches the audio path.

pub mod curves;
pub mod mapping;
pub mod scene;
pub mod scope;
pub mod spectrum;
pub mod stepgrid;

pub use mapping::Viewport;
pub use scene::{MovementPattern, Position3, Scene3D};
pub use spectrum::SpectrumPipeline;
pub use stepgrid::StepGridView;
