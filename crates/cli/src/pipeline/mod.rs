//! Live pipeline: simulated source → engine → hub → sinks.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
