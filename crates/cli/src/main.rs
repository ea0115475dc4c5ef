//! # Activity Monitor CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration loading and validation
//! - Live runs against simulated motion, offline replay of recordings
//! - Graceful shutdown handling

mod cli;
mod commands;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use config_loader::ConfigLoader;
use contracts::ObservabilitySettings;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_replay, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Activity monitor starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Replay(args) => run_replay(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging. Explicit flags win over `[observability]` in the
/// command's config file. Logs go to stderr so that `--json` output on
/// stdout stays machine-readable.
fn init_logging(cli: &Cli) -> Result<()> {
    let settings = logging_settings(cli, file_observability(&cli.command));

    // the metrics endpoint is started by `run` once the config is known
    observability::init_with_settings(&settings)
}

/// `[observability]` of the config the command will load, if any.
/// A broken file is reported by the command itself.
fn file_observability(command: &Commands) -> ObservabilitySettings {
    let path = match command {
        Commands::Run(args) => args.config.as_deref(),
        Commands::Replay(args) => args.config.as_deref(),
        Commands::Info(args) => args.config.as_deref(),
        Commands::Validate(_) => None,
    };

    path.and_then(|path| ConfigLoader::load_from_path(path).ok())
        .map(|config| config.observability)
        .unwrap_or_default()
}

fn logging_settings(cli: &Cli, file: ObservabilitySettings) -> ObservabilitySettings {
    let default_log_level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => file.default_log_level,
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    ObservabilitySettings {
        log_format: cli.log_format.unwrap_or(file.log_format),
        metrics_port: None,
        default_log_level,
    }
}
