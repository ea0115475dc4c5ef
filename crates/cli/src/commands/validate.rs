//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{MonitorConfig, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Winning scores never drop below this, so lower floors never fire
const MIN_EFFECTIVE_CONFIDENCE_FLOOR: f64 = 0.3;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    tick_interval_ms: u64,
    window_size: usize,
    buffer_capacity: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    tick_interval_ms: config.engine.tick_interval_ms,
                    window_size: config.engine.window_size,
                    buffer_capacity: config.engine.buffer_capacity,
                    sink_count: config.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &MonitorConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let engine = &config.engine;

    if config.sinks.is_empty() {
        warnings.push("No sinks configured - activity changes will not be recorded".to_string());
    }

    if engine.confidence_floor <= MIN_EFFECTIVE_CONFIDENCE_FLOOR {
        warnings.push(format!(
            "engine.confidence_floor ({}) is at or below {} - the low-confidence fallback never applies",
            engine.confidence_floor, MIN_EFFECTIVE_CONFIDENCE_FLOOR
        ));
    }

    if engine.join_window_ms == 0 {
        warnings.push(
            "engine.join_window_ms is 0 - only gyroscope readings with identical timestamps are joined"
                .to_string(),
        );
    }

    let file_sinks = config
        .sinks
        .iter()
        .filter(|s| s.sink_type == SinkType::File)
        .filter_map(|s| s.params.get("path"))
        .collect::<Vec<_>>();
    for (i, path) in file_sinks.iter().enumerate() {
        if file_sinks[..i].contains(path) {
            warnings.push(format!("Several file sinks write to '{}'", path));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Tick interval: {} ms", summary.tick_interval_ms);
            println!("  Window size: {}", summary.window_size);
            println!("  Buffer capacity: {}", summary.buffer_capacity);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
