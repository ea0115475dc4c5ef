//! ActivityListener trait - subscription hub fan-out unit
//!
//! Listeners are invoked synchronously, in subscription order, on the task
//! that produced the tick. Implementations must stay short and non-blocking;
//! anything slow belongs behind an [`ActivitySink`](crate::ActivitySink)
//! worker.

use std::sync::Arc;

use crate::{ActivityChanged, ContractError};

/// Receiver of activity state changes
///
/// # Example
///
/// ```ignore
/// struct Printer;
///
/// impl ActivityListener for Printer {
///     fn name(&self) -> &str { "printer" }
///     fn on_activity_changed(&self, event: &ActivityChanged) -> Result<(), ContractError> {
///         println!("now {}", event.label);
///         Ok(())
///     }
/// }
/// ```
pub trait ActivityListener: Send + Sync {
    /// Listener name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Handle one state change
    ///
    /// # Errors
    /// A returned error is logged by the hub; it never reaches other listeners.
    fn on_activity_changed(&self, event: &ActivityChanged) -> Result<(), ContractError>;
}

/// Callback type wrapped by [`FnListener`]
pub type ActivityCallback = Arc<dyn Fn(&ActivityChanged) -> Result<(), ContractError> + Send + Sync>;

/// Adapts a closure into an [`ActivityListener`]
pub struct FnListener {
    name: String,
    callback: ActivityCallback,
}

impl FnListener {
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&ActivityChanged) -> Result<(), ContractError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Arc::new(callback),
        }
    }
}

impl ActivityListener for FnListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_activity_changed(&self, event: &ActivityChanged) -> Result<(), ContractError> {
        (self.callback)(event)
    }
}
