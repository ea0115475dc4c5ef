//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate for cross-module types;
//! reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All timestamps are unsigned milliseconds (`u64`) supplied by the producer
//! - Ordering within the sample buffer follows arrival order; timestamps are
//!   required to be non-decreasing

mod activity;
mod config;
mod error;
mod listener;
mod sensor;
mod sink;

pub use activity::*;
pub use config::*;
pub use error::*;
pub use listener::{ActivityCallback, ActivityListener, FnListener};
pub use sensor::*;
pub use sink::*;
