//! ActivitySink trait - collaborator output interface
//!
//! Storage, notification and UI collaborators implement this trait and run
//! on their own worker task behind the hub.

use crate::{ActivityChanged, ContractError};

/// Asynchronous event consumer
#[trait_variant::make(ActivitySink: Send)]
pub trait LocalActivitySink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Consume one state change
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, event: &ActivityChanged) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
