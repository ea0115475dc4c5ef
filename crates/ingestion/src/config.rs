//! Simulated source configuration and metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{IngestionError, Result};

/// Simulated source configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedSourceConfig {
    /// Accelerometer/gyroscope rate (Hz)
    pub sample_rate_hz: f64,

    /// Uniform noise amplitude added to every axis (0 disables noise)
    pub noise_amplitude: f64,

    /// Noise seed; a random seed is drawn when unset
    pub seed: Option<u64>,

    /// Timestamp of the first sample
    pub start_timestamp_ms: u64,

    /// Gyroscope lag behind its accelerometer sample
    pub gyro_offset_ms: u64,

    /// Emit a cumulative pedometer reading once per second
    pub emit_step_counts: bool,

    /// Pace output in real time; otherwise emit as fast as the channel allows
    pub realtime: bool,
}

impl Default for SimulatedSourceConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 10.0,
            noise_amplitude: 0.0,
            seed: None,
            start_timestamp_ms: 0,
            gyro_offset_ms: 5,
            emit_step_counts: false,
            realtime: true,
        }
    }
}

impl SimulatedSourceConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(IngestionError::InvalidSampleRate(self.sample_rate_hz));
        }
        Ok(())
    }

    /// Milliseconds between consecutive samples (at least 1)
    pub fn sample_period_ms(&self) -> u64 {
        ((1000.0 / self.sample_rate_hz).round() as u64).max(1)
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Readings handed to the channel
    pub readings_emitted: AtomicU64,

    /// Readings lost because the receiver was gone
    pub readings_dropped: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,

    /// Lines that failed to decode
    pub parse_errors: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_emitted(&self) {
        self.readings_emitted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ingestion_readings_total").increment(1);
    }

    pub fn record_dropped(&self) {
        self.readings_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ingestion_readings_dropped_total").increment(1);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            readings_emitted: self.readings_emitted.load(Ordering::Relaxed),
            readings_dropped: self.readings_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub readings_emitted: u64,
    pub readings_dropped: u64,
    pub queue_len: usize,
    pub parse_errors: u64,
}
