//! LogSink - logs each state change via tracing

use contracts::{ActivityChanged, ActivitySink, ContractError};
use tracing::{info, instrument};

/// Sink that logs state changes
pub struct LogSink {
    name: String,
    events: u64,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: 0,
        }
    }
}

impl ActivitySink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, event),
        fields(sink = %self.name, label = %event.label)
    )]
    async fn write(&mut self, event: &ActivityChanged) -> Result<(), ContractError> {
        self.events += 1;
        info!(
            sink = %self.name,
            label = %event.label,
            confidence = event.confidence,
            timestamp_ms = event.timestamp_ms,
            active = event.label.is_active(),
            "Activity changed"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, events = self.events, "LogSink closed");
        Ok(())
    }
}
