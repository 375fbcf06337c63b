//! The lab widgets: declarative page definitions over the engine.
//!
//! Each widget is a `Widget` implementation the harness can mount; all
//! audio behavior flows through graph specs, parameter declarations, and
//! transport programs — widgets never touch nodes directly.

pub mod arpeggiator;
pub mod dynamics;
pub mod eq;
pub mod interval;
pub mod spatial;
pub mod steps;

pub use arpeggiator::ArpeggiatorWidget;
pub use dynamics::DynamicsLabWidget;
pub use eq::EqLabWidget;
pub use interval::{IntervalExercise, IntervalTrainerWidget};
pub use spatial::SpatialStudioWidget;
pub use steps::DrumLabWidget;
