//! # Ingestion
//!
//! Sensor reading sources for the activity engine.
//!
//! Responsibilities:
//! - Synthesize motion (`MotionProfile`, `MotionScript`, `SimulatedMotionSource`)
//! - Stream readings over a tokio channel, optionally paced in real time
//! - Read and write JSON-lines recordings
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{MotionScript, SimulatedMotionSource, SimulatedSourceConfig};
//!
//! let script = MotionScript::parse("walking:20,running:20")?;
//! let source = SimulatedMotionSource::new(script, SimulatedSourceConfig::default())?;
//! let mut rx = source.start(256, None)?;
//! while let Some(reading) = rx.recv().await {
//!     engine.push_reading(&reading);
//! }
//! ```

mod config;
mod error;
mod profile;
pub mod recording;
mod script;
mod source;

pub use config::{IngestionMetrics, MetricsSnapshot, SimulatedSourceConfig};
pub use contracts::SensorReading;
pub use error::{IngestionError, Result};
pub use profile::MotionProfile;
pub use script::{MotionScript, MotionSegment};
pub use source::{MotionGenerator, SimulatedMotionSource};
