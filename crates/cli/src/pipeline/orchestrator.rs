//! Pipeline orchestrator - coordinates all components.
//!
//! Wires a simulated motion source into the activity engine, fans changes
//! out to the configured sinks and folds them into a session summary.

use std::fs::File;
use std::future::Future;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ActivityLabel, MonitorConfig, SensorReading};
use engine::{ActivityEngine, Clock, SystemClock};
use hub::ActivitySubscriptionHub;
use ingestion::{IngestionMetrics, MotionScript, SimulatedMotionSource, SimulatedSourceConfig};
use observability::{record_activity_changed, record_reading_received, ActivityMetricsAggregator};
use tracing::{info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded monitor configuration
    pub monitor: MonitorConfig,

    /// Motion to simulate
    pub script: MotionScript,

    /// Simulated sensor settings
    pub source: SimulatedSourceConfig,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Where to record the simulated readings
    pub record_path: Option<PathBuf>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the script ends or `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let clock = SystemClock;
        let monitor = &self.config.monitor;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup Hub and Sinks
        let hub = Arc::new(ActivitySubscriptionHub::new());
        if monitor.sinks.is_empty() {
            warn!("No sinks configured - activity changes only reach the session summary");
        }
        let sinks = hub::create_sink_handles(&monitor.sinks).context("Failed to create sinks")?;
        let sink_metrics: Vec<_> = sinks
            .iter()
            .map(|handle| (handle.name().to_string(), Arc::clone(handle.metrics())))
            .collect();
        for handle in &sinks {
            hub.subscribe_sink(handle);
        }

        let aggregator = Arc::new(Mutex::new(ActivityMetricsAggregator::new()));
        let session = Arc::clone(&aggregator);
        hub.subscribe_fn("session-metrics", move |event| {
            record_activity_changed(event);
            lock(&session).update(event);
            Ok(())
        });

        // Setup Engine
        let engine = ActivityEngine::builder(monitor.engine)
            .hub(Arc::clone(&hub))
            .build()
            .context("Failed to build activity engine")?;
        engine.start().context("Failed to start activity engine")?;

        let started_ms = clock.now_ms();
        lock(&aggregator).start(ActivityLabel::Idle, started_ms);

        info!(
            tick_interval_ms = monitor.engine.tick_interval_ms,
            window_size = monitor.engine.window_size,
            sinks = sinks.len(),
            "Activity engine running"
        );

        // Start Source
        let source_config = SimulatedSourceConfig {
            start_timestamp_ms: started_ms,
            ..self.config.source.clone()
        };
        let source = SimulatedMotionSource::new(self.config.script.clone(), source_config)
            .context("Failed to create simulated source")?;
        let ingestion_metrics = Arc::new(IngestionMetrics::new());
        let mut rx = source
            .start(self.config.buffer_size, Some(Arc::clone(&ingestion_metrics)))
            .context("Failed to start simulated source")?;

        info!(
            script = %self.config.script,
            duration_s = self.config.script.total_duration_s(),
            "Simulated source streaming"
        );

        let mut stats = PipelineStats::default();
        let mut recorded: Option<Vec<SensorReading>> =
            self.config.record_path.as_ref().map(|_| Vec::new());

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                reading = rx.recv() => match reading {
                    Some(reading) => {
                        record_reading_received(reading.kind);
                        engine.push_reading(&reading);
                        stats.readings_received += 1;
                        if let Some(recorded) = recorded.as_mut() {
                            recorded.push(reading);
                        }
                    }
                    None => {
                        info!("Motion script finished");
                        // classify the tail since the last scheduled tick
                        engine.tick_now();
                        break;
                    }
                },
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping pipeline...");
                    stats.interrupted = true;
                    break;
                }
            }
        }

        // Shutdown
        info!("Shutting down pipeline...");
        source.stop();
        stats.ticks = engine.tick_count();
        stats.final_label = engine.current_label();
        engine.stop();
        hub.clear();
        hub::shutdown_handles(sinks).await;

        lock(&aggregator).finish(clock.now_ms());
        stats.session = lock(&aggregator).summary();
        stats.sinks = sink_metrics
            .into_iter()
            .map(|(name, metrics)| {
                (
                    name,
                    metrics.write_count(),
                    metrics.failure_count(),
                    metrics.dropped_count(),
                )
            })
            .collect();
        stats.duration = start_time.elapsed();

        if let (Some(path), Some(readings)) = (&self.config.record_path, recorded) {
            write_recording(path, &readings)?;
        }

        let ingestion = ingestion_metrics.snapshot();
        info!(
            readings_emitted = ingestion.readings_emitted,
            readings_dropped = ingestion.readings_dropped,
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

fn lock(aggregator: &Mutex<ActivityMetricsAggregator>) -> MutexGuard<'_, ActivityMetricsAggregator> {
    aggregator.lock().unwrap_or_else(PoisonError::into_inner)
}

fn write_recording(path: &Path, readings: &[SensorReading]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create recording {}", path.display()))?;
    let count = ingestion::recording::write_readings(BufWriter::new(file), readings)
        .with_context(|| format!("Failed to write recording {}", path.display()))?;
    info!(path = %path.display(), readings = count, "Recording written");
    Ok(())
}
