//! `run` command implementation.

use anyhow::{Context, Result};
use ingestion::{MotionScript, SimulatedSourceConfig};
use tracing::info;

use super::load_config;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let monitor = load_config(args.config.as_deref())?;

    let script = MotionScript::parse(&args.script)
        .with_context(|| format!("Invalid motion script '{}'", args.script))?;

    let source = SimulatedSourceConfig {
        sample_rate_hz: args.sample_rate_hz,
        noise_amplitude: args.noise,
        seed: args.seed,
        emit_step_counts: args.step_counts,
        ..Default::default()
    };
    source.validate().context("Invalid simulated source settings")?;

    // CLI port wins over the config file; 0 disables the endpoint
    let metrics_port = match args.metrics_port {
        Some(0) => None,
        Some(port) => Some(port),
        None => monitor.observability.metrics_port,
    };

    info!(
        script = %script,
        sample_rate_hz = source.sample_rate_hz,
        tick_interval_ms = monitor.engine.tick_interval_ms,
        sinks = monitor.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_run_summary(&monitor, &script, &source);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        monitor,
        script,
        source,
        buffer_size: args.buffer_size,
        metrics_port,
        record_path: args.record.clone(),
    });

    info!("Starting pipeline...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        readings = stats.readings_received,
        ticks = stats.ticks,
        changes = stats.session.total_events,
        final_activity = %stats.final_label,
        "Pipeline completed"
    );
    stats.print_summary();

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print run plan for dry-run mode
fn print_run_summary(
    monitor: &contracts::MonitorConfig,
    script: &MotionScript,
    source: &SimulatedSourceConfig,
) {
    println!("\n=== Run Plan ===\n");
    println!("Script ({:.1}s):", script.total_duration_s());
    for segment in script.segments() {
        println!("  - {} for {}s", segment.profile, segment.duration_s);
    }

    println!("\nSource:");
    println!("  Sample rate: {} Hz", source.sample_rate_hz);
    println!("  Noise: {}", source.noise_amplitude);
    match source.seed {
        Some(seed) => println!("  Seed: {}", seed),
        None => println!("  Seed: random"),
    }

    let engine = &monitor.engine;
    println!("\nEngine:");
    println!("  Tick interval: {} ms", engine.tick_interval_ms);
    println!("  Window: {} samples", engine.window_size);
    println!("  Buffer capacity: {}", engine.buffer_capacity);

    if !monitor.sinks.is_empty() {
        println!("\nSinks ({}):", monitor.sinks.len());
        for sink in &monitor.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
