//! Command implementations.

mod info;
mod replay;
mod run;
mod validate;

pub use info::run_info;
pub use replay::run_replay;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::MonitorConfig;
use tracing::info;

/// Load the configuration file, or the built-in defaults when none is given
pub(crate) fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Ok(MonitorConfig::default());
    };

    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
