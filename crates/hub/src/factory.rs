//! Building sink handles from configuration

use contracts::{SinkConfig, SinkType};
use tracing::{info, instrument};

use crate::error::HubError;
use crate::handle::SinkHandle;
use crate::sinks::{FileSink, LogSink};

/// Create and spawn a SinkHandle from configuration
#[instrument(
    name = "hub_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, HubError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| HubError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Create every configured sink, in order
#[instrument(name = "hub_create_sink_handles", skip(configs), fields(sink_count = configs.len()))]
pub fn create_sink_handles(configs: &[SinkConfig]) -> Result<Vec<SinkHandle>, HubError> {
    let mut handles = Vec::with_capacity(configs.len());
    for config in configs {
        handles.push(create_sink_handle(config)?);
    }
    info!(sinks = handles.len(), "Sink handles created");
    Ok(handles)
}

/// Drain and close every handle
pub async fn shutdown_handles(handles: Vec<SinkHandle>) {
    for handle in handles {
        handle.shutdown().await;
    }
}
