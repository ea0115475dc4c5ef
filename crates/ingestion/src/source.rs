//! Simulated motion source
//!
//! Replaces real phone sensors: plays a [`MotionScript`] as a stream of
//! accelerometer, gyroscope and optional pedometer readings.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ReadingKind, SensorReading, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::config::{IngestionMetrics, SimulatedSourceConfig};
use crate::error::{IngestionError, Result};
use crate::script::MotionScript;

/// Deterministic reading generator (for a fixed seed)
pub struct MotionGenerator {
    script: MotionScript,
    config: SimulatedSourceConfig,
    rng: StdRng,
    period_ms: u64,
    index: u64,
    total_samples: u64,
    pending: VecDeque<SensorReading>,
    steps: f64,
    next_step_report_ms: u64,
}

impl MotionGenerator {
    pub fn new(script: MotionScript, config: SimulatedSourceConfig) -> Result<Self> {
        config.validate()?;

        let period_ms = config.sample_period_ms();
        let total_samples = (script.total_duration_s() * 1000.0 / period_ms as f64).round() as u64;
        let seed = config.seed.unwrap_or_else(rand::random);

        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            next_step_report_ms: config.start_timestamp_ms + 1000,
            script,
            config,
            period_ms,
            index: 0,
            total_samples,
            pending: VecDeque::with_capacity(3),
            steps: 0.0,
        })
    }

    /// Number of accelerometer samples the script produces
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    fn noisy(&mut self, v: Vector3) -> Vector3 {
        let a = self.config.noise_amplitude;
        if a <= 0.0 {
            return v;
        }
        Vector3::new(
            v.x + self.rng.random_range(-a..=a),
            v.y + self.rng.random_range(-a..=a),
            v.z + self.rng.random_range(-a..=a),
        )
    }

    fn generate_sample(&mut self) {
        let offset_ms = self.index * self.period_ms;
        let t_s = offset_ms as f64 / 1000.0;
        let ts = self.config.start_timestamp_ms + offset_ms;

        let profile = self
            .script
            .profile_at(t_s)
            .or_else(|| self.script.segments().last().map(|s| s.profile));
        let Some(profile) = profile else {
            return;
        };

        let (accel, gyro) = profile.sample(self.index, t_s);
        let (accel, gyro) = (self.noisy(accel), self.noisy(gyro));

        self.pending
            .push_back(SensorReading::accelerometer(accel.x, accel.y, accel.z, ts));
        self.pending.push_back(SensorReading::gyroscope(
            gyro.x,
            gyro.y,
            gyro.z,
            ts + self.config.gyro_offset_ms,
        ));

        self.steps += profile.cadence_hz() * self.period_ms as f64 / 1000.0;
        if self.config.emit_step_counts && ts >= self.next_step_report_ms {
            self.pending
                .push_back(SensorReading::step_count(self.steps.floor(), ts));
            self.next_step_report_ms += 1000;
        }

        self.index += 1;
    }
}

impl Iterator for MotionGenerator {
    type Item = SensorReading;

    fn next(&mut self) -> Option<SensorReading> {
        if self.pending.is_empty() && self.index < self.total_samples {
            self.generate_sample();
        }
        self.pending.pop_front()
    }
}

/// Streams a motion script over a tokio channel
pub struct SimulatedMotionSource {
    script: MotionScript,
    config: SimulatedSourceConfig,
    running: Arc<AtomicBool>,
}

impl SimulatedMotionSource {
    pub fn new(script: MotionScript, config: SimulatedSourceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            script,
            config,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &SimulatedSourceConfig {
        &self.config
    }

    pub fn script(&self) -> &MotionScript {
        &self.script
    }

    /// Fresh generator over the whole script
    pub fn generator(&self) -> Result<MotionGenerator> {
        MotionGenerator::new(self.script.clone(), self.config.clone())
    }

    /// Every reading of the script, without pacing
    pub fn readings(&self) -> Result<Vec<SensorReading>> {
        Ok(self.generator()?.collect())
    }

    /// Start streaming; the channel closes when the script ends or on `stop()`
    pub fn start(
        &self,
        channel_capacity: usize,
        metrics: Option<Arc<IngestionMetrics>>,
    ) -> Result<mpsc::Receiver<SensorReading>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyRunning);
        }

        let generator = match self.generator() {
            Ok(generator) => generator,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        let running = Arc::clone(&self.running);
        let metrics = metrics.unwrap_or_else(|| Arc::new(IngestionMetrics::new()));
        let realtime = self.config.realtime;
        let period = Duration::from_millis(self.config.sample_period_ms());

        debug!(
            samples = generator.total_samples(),
            sample_rate_hz = self.config.sample_rate_hz,
            realtime,
            "simulated motion source started"
        );

        tokio::spawn(async move {
            let mut started = false;

            for reading in generator {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                if reading.kind == ReadingKind::Accelerometer {
                    if realtime && started {
                        tokio::time::sleep(period).await;
                    }
                    started = true;
                }

                let timestamp_ms = reading.timestamp_ms;
                if tx.send(reading).await.is_err() {
                    metrics.record_dropped();
                    debug!("simulated source channel closed");
                    break;
                }
                metrics.record_emitted();
                metrics.update_queue_len(tx.max_capacity() - tx.capacity());
                trace!(timestamp_ms, "reading sent");
            }

            running.store(false, Ordering::SeqCst);
            debug!("simulated motion source stopped");
        });

        Ok(rx)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
