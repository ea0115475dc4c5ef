//! `replay` command implementation.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::{ActivityChanged, ActivityLabel, SensorReading};
use engine::ReplaySummary;
use hub::ActivitySubscriptionHub;
use ingestion::IngestionMetrics;
use observability::{ActivityMetricsAggregator, SessionSummary};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::ReplayArgs;

/// Replay result for JSON output
#[derive(Serialize)]
struct ReplayReport {
    input: String,
    readings: u64,
    ticks: u64,
    out_of_order: u64,
    unjoined_gyro: u64,
    #[serde(skip_serializing_if = "is_zero")]
    skipped_lines: u64,
    final_activity: ActivityLabel,
    events: Vec<ActivityChanged>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// Execute the `replay` command
pub async fn run_replay(args: &ReplayArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let parse_metrics = IngestionMetrics::new();
    let readings = load_readings(&args.input, args.lenient, &parse_metrics)?;
    let skipped_lines = parse_metrics.snapshot().parse_errors;

    info!(
        input = %args.input.display(),
        readings = readings.len(),
        skipped_lines,
        "Recording loaded"
    );

    let hub = ActivitySubscriptionHub::new();
    let sinks = if args.sinks {
        hub::create_sink_handles(&config.sinks).context("Failed to create sinks")?
    } else {
        Vec::new()
    };
    for handle in &sinks {
        hub.subscribe_sink(handle);
    }

    let span = timeline(&readings);
    let summary = engine::replay(config.engine, readings, &hub).context("Replay failed")?;
    hub::shutdown_handles(sinks).await;

    let report = ReplayReport {
        input: args.input.display().to_string(),
        readings: summary.readings,
        ticks: summary.ticks,
        out_of_order: summary.out_of_order,
        unjoined_gyro: summary.unjoined_gyro,
        skipped_lines,
        final_activity: summary
            .events
            .last()
            .map(|e| e.label)
            .unwrap_or(ActivityLabel::Idle),
        events: summary.events.clone(),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize replay result")?;
        println!("{}", json);
    } else {
        let session = session_summary(&summary, span);
        print_replay(&report, &session);
    }

    Ok(())
}

fn load_readings(
    path: &Path,
    lenient: bool,
    metrics: &IngestionMetrics,
) -> Result<Vec<SensorReading>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let readings = if lenient {
        ingestion::recording::read_readings_lenient(reader, metrics)
    } else {
        ingestion::recording::read_readings(reader)
    };
    readings.with_context(|| format!("Failed to read recording {}", path.display()))
}

/// First and last reading timestamps
fn timeline(readings: &[SensorReading]) -> Option<(u64, u64)> {
    let first = readings.first()?.timestamp_ms;
    let last = readings.iter().map(|r| r.timestamp_ms).max()?;
    Some((first, last))
}

/// Fold replayed events into a session summary covering the recording
fn session_summary(summary: &ReplaySummary, span: Option<(u64, u64)>) -> SessionSummary {
    let mut aggregator = ActivityMetricsAggregator::new();
    let Some((first, last)) = span else {
        return aggregator.summary();
    };

    aggregator.start(ActivityLabel::Idle, first);
    for event in &summary.events {
        aggregator.update(event);
    }
    // the final replay tick can land after the last reading
    let end = summary
        .events
        .last()
        .map_or(last, |e| e.timestamp_ms.max(last));
    aggregator.finish(end);
    aggregator.summary()
}

fn print_replay(report: &ReplayReport, session: &SessionSummary) {
    println!("\n=== Replay: {} ===\n", report.input);
    println!("  Readings: {}", report.readings);
    println!("  Ticks: {}", report.ticks);
    if report.out_of_order > 0 {
        println!("  Out-of-order samples dropped: {}", report.out_of_order);
    }
    if report.unjoined_gyro > 0 {
        println!("  Unjoined gyroscope readings: {}", report.unjoined_gyro);
    }
    if report.skipped_lines > 0 {
        println!("  Malformed lines skipped: {}", report.skipped_lines);
    }

    if report.events.is_empty() {
        println!("\n  No activity changes (stayed {})", report.final_activity);
    } else {
        println!("\nActivity changes:");
        for event in &report.events {
            println!(
                "  {:>12} ms  {:<9} confidence={:.2}",
                event.timestamp_ms,
                event.label.as_str(),
                event.confidence
            );
        }
    }

    println!();
    print!("{}", session);
    println!();
}
