//! Ingestion error types

use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Malformed motion script
    #[error("invalid motion script '{script}': {message}")]
    InvalidScript { script: String, message: String },

    /// Sample rate must be positive and finite
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// A reading line could not be decoded
    #[error("line {line}: {message}")]
    ParseFailed { line: usize, message: String },

    /// Source is already streaming
    #[error("simulated source is already running")]
    AlreadyRunning,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestionError {
    pub fn invalid_script(script: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidScript {
            script: script.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
