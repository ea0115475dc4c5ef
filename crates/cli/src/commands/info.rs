//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{ActivityLabel, EngineConfig, MonitorConfig};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    engine: EngineConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    observability: ObservabilityInfo,
    labels: Vec<LabelInfo>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

#[derive(Serialize)]
struct ObservabilityInfo {
    log_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
    default_log_level: String,
}

#[derive(Serialize)]
struct LabelInfo {
    label: ActivityLabel,
    active: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = ?args.config, "Loading configuration info");

    let config = load_config(args.config.as_deref())?;

    if args.toml {
        let toml = config_loader::ConfigLoader::to_toml(&config)
            .context("Failed to serialize configuration")?;
        print!("{}", toml);
    } else if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn build_config_info(config: &MonitorConfig) -> ConfigInfo {
    let sinks = config
        .sinks
        .iter()
        .map(|s| SinkInfo {
            name: s.name.clone(),
            sink_type: format!("{:?}", s.sink_type),
            queue_capacity: s.queue_capacity,
            params: s.params.clone(),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", config.version),
        engine: config.engine,
        sinks,
        observability: ObservabilityInfo {
            log_format: format!("{:?}", config.observability.log_format),
            metrics_port: config.observability.metrics_port,
            default_log_level: config.observability.default_log_level.clone(),
        },
        labels: ActivityLabel::ALL
            .into_iter()
            .map(|label| LabelInfo {
                label,
                active: label.is_active(),
            })
            .collect(),
    }
}

fn print_config_info(config: &MonitorConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Activity Monitor Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let engine = &config.engine;
    println!("⚙️  Engine");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Tick interval: {} ms", engine.tick_interval_ms);
    println!("   ├─ Window size: {} samples", engine.window_size);
    println!("   ├─ Buffer capacity: {} samples", engine.buffer_capacity);
    println!(
        "   ├─ Min samples for classification: {}",
        engine.min_samples_for_classification
    );
    println!("   ├─ Confidence floor: {}", engine.confidence_floor);
    println!("   └─ Join window: {} ms", engine.join_window_ms);

    println!("\n🏷  Labels (tie-break order)");
    for (i, label) in ActivityLabel::ALL.iter().enumerate() {
        let prefix = if i == ActivityLabel::ALL.len() - 1 { "└─" } else { "├─" };
        let kind = if label.is_active() { "active" } else { "inactive" };
        println!("   {} {} ({})", prefix, label, kind);
    }

    if !config.sinks.is_empty() {
        println!("\n📤 Sinks ({})", config.sinks.len());
        for (i, sink) in config.sinks.iter().enumerate() {
            let prefix = if i == config.sinks.len() - 1 { "└─" } else { "├─" };
            match sink.params.get("path") {
                Some(path) => println!("   {} {} ({:?}) → {}", prefix, sink.name, sink.sink_type, path),
                None => println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type),
            }
        }
    }

    let observability = &config.observability;
    println!("\n📈 Observability");
    println!("   ├─ Log format: {:?}", observability.log_format);
    println!("   ├─ Log level: {}", observability.default_log_level);
    match observability.metrics_port {
        Some(port) => println!("   └─ Metrics: 0.0.0.0:{}", port),
        None => println!("   └─ Metrics: disabled"),
    }

    println!();
}
