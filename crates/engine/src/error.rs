//! Engine error types

use contracts::ContractError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// `start()` needs a tokio runtime to drive the periodic tick
    #[error("no tokio runtime available to drive the classification timer")]
    NoRuntime,

    /// Rejected engine configuration
    #[error("invalid engine config: {0}")]
    Config(#[from] ContractError),
}
