//! # Engine
//!
//! Periodic activity classification.
//!
//! `ActivityEngine` owns one classifier behind a mutex, runs the
//! fixed-interval tick on the tokio runtime and publishes label changes
//! through an `ActivitySubscriptionHub`. `replay` runs the same pipeline
//! offline over recorded readings.

mod clock;
mod engine;
mod error;
mod replay;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{ActivityEngine, EngineBuilder, EngineState};
pub use error::EngineError;
pub use replay::{replay, ReplaySummary};
