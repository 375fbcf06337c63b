//! Widget-shaped scenario benchmarks.
//!
//! These render the graphs the lab widgets actually build, block by
//! block, the way the audio callback does.

mod graphs;
mod voices;

pub use graphs::bench_graphs;
pub use voices::bench_voices;
