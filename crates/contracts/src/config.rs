//! MonitorConfig - Config Loader output
//!
//! Engine tuning, sink routing and observability settings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use validator::Validate;

use crate::error::ContractError;

/// Recognised engine options.
///
/// Scoring thresholds are fixed constants and deliberately absent here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// Samples considered per tick
    #[validate(range(min = 1))]
    pub window_size: usize,

    /// Classification period (ms)
    #[validate(range(min = 1))]
    pub tick_interval_ms: u64,

    /// Sample buffer capacity
    #[validate(range(min = 1))]
    pub buffer_capacity: usize,

    /// Below this many samples the result is `Idle` at 0.5
    #[validate(range(min = 1))]
    pub min_samples_for_classification: usize,

    /// Winning scores below this fall back to `Idle` at 0.6
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_floor: f64,

    /// Max accelerometer/gyroscope timestamp distance for a join (ms)
    pub join_window_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            tick_interval_ms: 2000,
            buffer_capacity: 50,
            min_samples_for_classification: 10,
            confidence_floor: 0.3,
            join_window_ms: 50,
        }
    }
}

/// Complete configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Classification engine
    #[serde(default)]
    pub engine: EngineConfig,

    /// Event sinks
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,

    /// Logging / metrics
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Structured log output
    Log,
    /// JSON-lines history file
    File,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable
    #[default]
    Pretty,
    /// Compact single line
    Compact,
}

impl LogFormat {
    pub const NAMES: [&'static str; 3] = ["json", "pretty", "compact"];
}

impl FromStr for LogFormat {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(ContractError::config_parse(format!(
                "unknown log format '{other}' (expected one of {})",
                Self::NAMES.join(", ")
            ))),
        }
    }
}

/// Logging and metrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus port (None = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,

    #[serde(default = "default_log_level")]
    pub default_log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            metrics_port: None,
            default_log_level: default_log_level(),
        }
    }
}
