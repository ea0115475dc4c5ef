//! CLI argument definitions using clap.

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};
use contracts::LogFormat;
use std::path::PathBuf;

/// Activity Monitor - motion-based activity classification
#[derive(Parser, Debug)]
#[command(
    name = "activity-monitor",
    author,
    version,
    about = "Classify user activity from accelerometer and gyroscope samples",
    long_about = "Buffers motion samples, classifies the recent window on a fixed tick \n\
                  and publishes activity changes to configured sinks.\n\n\
                  `run` drives the engine from a simulated motion script, `replay` \n\
                  classifies a recorded JSON-lines file offline."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ACTIVITY_MONITOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format [default: `[observability].log_format`, else pretty]
    #[arg(
        long,
        value_parser = log_format_parser(),
        global = true,
        env = "ACTIVITY_MONITOR_LOG_FORMAT"
    )]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the live engine against a simulated motion script
    Run(RunArgs),

    /// Classify a recorded readings file offline
    Replay(ReplayArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "ACTIVITY_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Motion script: comma-separated `activity:seconds` segments
    #[arg(long, default_value = "walking:20,running:20", env = "ACTIVITY_MONITOR_SCRIPT")]
    pub script: String,

    /// Simulated sensor rate (Hz)
    #[arg(long, default_value = "10", env = "ACTIVITY_MONITOR_SAMPLE_RATE_HZ")]
    pub sample_rate_hz: f64,

    /// Uniform noise amplitude added to every simulated axis
    #[arg(long, default_value = "0")]
    pub noise: f64,

    /// Noise seed (random when omitted)
    #[arg(long, env = "ACTIVITY_MONITOR_SEED")]
    pub seed: Option<u64>,

    /// Also emit a cumulative step count once per second
    #[arg(long)]
    pub step_counts: bool,

    /// Write every simulated reading to this JSON-lines file
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Channel buffer size between source and engine
    #[arg(long, default_value = "256", env = "ACTIVITY_MONITOR_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled; overrides the config file)
    #[arg(long, env = "ACTIVITY_MONITOR_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Validate configuration and script, then exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `replay` command
#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    /// JSON-lines file with one sensor reading per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long, env = "ACTIVITY_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip malformed lines instead of failing
    #[arg(long)]
    pub lenient: bool,

    /// Deliver events to the sinks of the configuration file
    #[arg(long)]
    pub sinks: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "monitor.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration as TOML
    #[arg(long, conflicts_with = "json")]
    pub toml: bool,
}

fn log_format_parser() -> impl TypedValueParser<Value = LogFormat> {
    PossibleValuesParser::new(LogFormat::NAMES).try_map(|name| name.parse::<LogFormat>())
}
