//! Classifier state: buffer, current label, edge-triggered transitions.

use contracts::{
    ActivityChanged, ActivityLabel, ClassificationResult, EngineConfig, JoinedSample,
    ReadingKind, SensorReading, Vector3,
};
use metrics::{counter, gauge, histogram};
use tracing::{debug, instrument, trace};

use crate::buffer::SampleBuffer;
use crate::features;
use crate::scorer::ActivityScorer;

/// Owns the sample buffer and the current label of one engine.
///
/// Not synchronized; callers serialize pushes and ticks.
#[derive(Debug)]
pub struct ClassifierState {
    config: EngineConfig,
    buffer: SampleBuffer,
    scorer: ActivityScorer,
    current_label: ActivityLabel,
    last_emitted_timestamp: Option<u64>,
    /// Most recent gyroscope reading, offered to the next accelerometer sample
    latest_gyro: Option<(Vector3, u64)>,
    ticks: u64,
    dropped_gyro: u64,
}

impl ClassifierState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            buffer: SampleBuffer::new(config.buffer_capacity),
            scorer: ActivityScorer::from_config(&config),
            config,
            current_label: ActivityLabel::Idle,
            last_emitted_timestamp: None,
            latest_gyro: None,
            ticks: 0,
            dropped_gyro: 0,
        }
    }

    /// Append an accelerometer-origin sample.
    ///
    /// Picks up the last gyroscope reading when it falls inside the join
    /// window. Returns false if the sample went back in time.
    pub fn push_accelerometer(&mut self, accel: Vector3, timestamp_ms: u64) -> bool {
        let mut sample = JoinedSample::from_accel(accel, timestamp_ms);
        if let Some((gyro, gyro_ts)) = self.latest_gyro {
            if gyro_ts.abs_diff(timestamp_ms) <= self.config.join_window_ms {
                sample.gyro = gyro;
            }
        }

        let stored = self.buffer.push(sample);
        if !stored {
            counter!("classifier_samples_out_of_order_total").increment(1);
            trace!(timestamp_ms, "out-of-order accelerometer sample dropped");
        }
        gauge!("classifier_buffer_len").set(self.buffer.len() as f64);
        stored
    }

    /// Merge a gyroscope reading into the newest sample. Never adds an entry.
    pub fn push_gyroscope(&mut self, gyro: Vector3, timestamp_ms: u64) -> bool {
        self.latest_gyro = Some((gyro, timestamp_ms));

        let merged = self
            .buffer
            .merge_gyroscope(gyro, timestamp_ms, self.config.join_window_ms);
        if !merged {
            self.dropped_gyro += 1;
            counter!("classifier_gyro_unjoined_total").increment(1);
        }
        merged
    }

    /// Attach a pedometer reading to the newest sample
    pub fn push_step_count(&mut self, count: f64, timestamp_ms: u64) -> bool {
        self.buffer
            .attach_step_count(count, timestamp_ms, self.config.join_window_ms)
    }

    /// Route a raw reading by kind
    pub fn push_reading(&mut self, reading: &SensorReading) -> bool {
        match reading.kind {
            ReadingKind::Accelerometer => {
                self.push_accelerometer(reading.vector(), reading.timestamp_ms)
            }
            ReadingKind::Gyroscope => self.push_gyroscope(reading.vector(), reading.timestamp_ms),
            ReadingKind::StepCount => self.push_step_count(reading.x, reading.timestamp_ms),
        }
    }

    /// Classify the current window without touching the label
    pub fn evaluate(&self) -> ClassificationResult {
        let window = self.window();
        let features = features::extract(&window);
        self.scorer.classify(&features, window.len())
    }

    /// The window a tick would classify
    pub fn window(&self) -> Vec<JoinedSample> {
        self.buffer.window(self.config.window_size)
    }

    /// Apply a classification result. Emits only when the label changes.
    pub fn observe(
        &mut self,
        result: ClassificationResult,
        timestamp_ms: u64,
    ) -> Option<ActivityChanged> {
        if result.label == self.current_label {
            return None;
        }

        debug!(
            from = %self.current_label,
            to = %result.label,
            confidence = result.confidence,
            "activity changed"
        );
        self.current_label = result.label;
        self.last_emitted_timestamp = Some(timestamp_ms);
        counter!("classifier_transitions_total", "label" => result.label.as_str()).increment(1);

        Some(ActivityChanged {
            label: result.label,
            confidence: result.confidence,
            timestamp_ms,
        })
    }

    /// One classification pass: evaluate then observe
    #[instrument(level = "trace", skip(self), fields(current = %self.current_label))]
    pub fn tick(&mut self, now_ms: u64) -> Option<ActivityChanged> {
        self.ticks += 1;
        let result = self.evaluate();
        trace!(
            tick = self.ticks,
            label = %result.label,
            confidence = result.confidence,
            samples = self.buffer.len(),
            "classification tick"
        );
        counter!("classifier_ticks_total").increment(1);
        counter!("classifier_classifications_total", "label" => result.label.as_str()).increment(1);
        histogram!("classifier_confidence").record(result.confidence);
        self.observe(result, now_ms)
    }

    /// Back to a fresh `Idle` state with an empty buffer
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.current_label = ActivityLabel::Idle;
        self.last_emitted_timestamp = None;
        self.latest_gyro = None;
        gauge!("classifier_buffer_len").set(0.0);
    }

    pub fn current_label(&self) -> ActivityLabel {
        self.current_label
    }

    pub fn last_emitted_timestamp(&self) -> Option<u64> {
        self.last_emitted_timestamp
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Gyroscope readings that found no sample to join
    pub fn dropped_gyro_count(&self) -> u64 {
        self.dropped_gyro
    }
}
