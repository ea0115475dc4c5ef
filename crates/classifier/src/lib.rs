//! # Classifier
//!
//! Sliding-window activity classification.
//!
//! Pipeline per tick:
//! - `SampleBuffer`: bounded FIFO of joined accelerometer/gyroscope samples
//! - `features::extract`: window -> `FeatureVector`
//! - `ActivityScorer`: fixed rule table -> winning label and confidence
//! - `ClassifierState`: edge-triggered label transitions
//!
//! Everything here is synchronous and allocation-light; the engine crate
//! owns timing and locking.

mod buffer;
pub mod features;
mod scorer;
mod state;

pub use buffer::SampleBuffer;
pub use features::extract;
pub use scorer::{
    classify, ActivityScorer, DEFAULT_CONFIDENCE_FLOOR, DEFAULT_MIN_SAMPLES,
    LOW_CONFIDENCE_FALLBACK, SPARSE_FALLBACK,
};
pub use state::ClassifierState;
