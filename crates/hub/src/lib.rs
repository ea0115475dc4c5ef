//! # Hub
//!
//! Fan-out of activity state changes.
//!
//! Responsibilities:
//! - Keep the ordered listener registry (`ActivitySubscriptionHub`)
//! - Isolate listener failures and panics from each other and the engine
//! - Run slow consumers (`ActivitySink`) behind bounded worker queues

pub mod error;
pub mod factory;
pub mod handle;
pub mod hub;
pub mod sink_metrics;
pub mod sinks;

pub use contracts::{ActivityChanged, ActivityListener, ActivitySink};
pub use error::HubError;
pub use factory::{create_sink_handle, create_sink_handles, shutdown_handles};
pub use handle::{SinkHandle, SinkListener};
pub use hub::{ActivitySubscriptionHub, NotifyReport, SubscriptionToken};
pub use sink_metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, HistoryRecord, LogSink};
