//! Activity metrics
//!
//! Prometheus-facing recorders plus an in-memory session aggregator.

use std::collections::BTreeMap;

use contracts::{ActivityChanged, ActivityLabel, ReadingKind};
use metrics::{counter, gauge};

/// Record a published state change
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_activity_changed;
///
/// if let Some(event) = state.tick(now_ms) {
///     record_activity_changed(&event);
/// }
/// ```
pub fn record_activity_changed(event: &ActivityChanged) {
    counter!("activity_changes_total", "label" => event.label.as_str()).increment(1);
    gauge!("activity_current_confidence").set(event.confidence);
    gauge!("activity_last_change_timestamp_ms").set(event.timestamp_ms as f64);

    for label in ActivityLabel::ALL {
        let current = if label == event.label { 1.0 } else { 0.0 };
        gauge!("activity_current", "label" => label.as_str()).set(current);
    }
}

/// Record a reading entering the engine
pub fn record_reading_received(kind: ReadingKind) {
    let kind = match kind {
        ReadingKind::Accelerometer => "accelerometer",
        ReadingKind::Gyroscope => "gyroscope",
        ReadingKind::StepCount => "step_count",
    };
    counter!("activity_readings_received_total", "kind" => kind).increment(1);
}

/// Per-label session statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelStats {
    /// Times this label was entered
    pub entries: u64,
    /// Time spent in this label (ms)
    pub dwell_ms: u64,
}

/// Activity session aggregator
///
/// Folds the stream of state changes into dwell times and confidence stats.
#[derive(Debug, Clone, Default)]
pub struct ActivityMetricsAggregator {
    pub total_events: u64,
    pub confidence_stats: RunningStats,
    pub labels: BTreeMap<ActivityLabel, LabelStats>,
    /// Label in force and when it started
    current: Option<(ActivityLabel, u64)>,
    first_timestamp_ms: Option<u64>,
    last_timestamp_ms: Option<u64>,
}

impl ActivityMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the session in `label` (the engine starts in `Idle`)
    pub fn start(&mut self, label: ActivityLabel, timestamp_ms: u64) {
        self.current = Some((label, timestamp_ms));
        self.first_timestamp_ms.get_or_insert(timestamp_ms);
        self.last_timestamp_ms = Some(timestamp_ms);
    }

    /// Fold one state change
    pub fn update(&mut self, event: &ActivityChanged) {
        self.total_events += 1;
        self.confidence_stats.push(event.confidence);
        self.close_current(event.timestamp_ms);

        self.labels.entry(event.label).or_default().entries += 1;
        self.current = Some((event.label, event.timestamp_ms));
        self.first_timestamp_ms.get_or_insert(event.timestamp_ms);
        self.last_timestamp_ms = Some(event.timestamp_ms);
    }

    /// Close the open interval at `end_ms`
    pub fn finish(&mut self, end_ms: u64) {
        self.close_current(end_ms);
        self.last_timestamp_ms = Some(end_ms.max(self.last_timestamp_ms.unwrap_or(end_ms)));
    }

    fn close_current(&mut self, end_ms: u64) {
        if let Some((label, since)) = self.current.take() {
            self.labels.entry(label).or_default().dwell_ms += end_ms.saturating_sub(since);
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let tracked_ms: u64 = self.labels.values().map(|s| s.dwell_ms).sum();
        let active_ms: u64 = self
            .labels
            .iter()
            .filter(|(label, _)| label.is_active())
            .map(|(_, s)| s.dwell_ms)
            .sum();

        SessionSummary {
            total_events: self.total_events,
            tracked_ms,
            active_fraction: if tracked_ms > 0 {
                active_ms as f64 / tracked_ms as f64
            } else {
                0.0
            },
            confidence: StatsSummary::from(&self.confidence_stats),
            labels: self.labels.clone(),
        }
    }
}

/// Session summary
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub total_events: u64,
    /// Time covered by closed intervals (ms)
    pub tracked_ms: u64,
    /// Share of tracked time spent walking, running or cycling
    pub active_fraction: f64,
    pub confidence: StatsSummary,
    pub labels: BTreeMap<ActivityLabel, LabelStats>,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Activity Session Summary ===")?;
        writeln!(f, "Activity changes: {}", self.total_events)?;
        writeln!(f, "Tracked time: {:.1}s", self.tracked_ms as f64 / 1000.0)?;
        writeln!(f, "Active time: {:.1}%", self.active_fraction * 100.0)?;
        writeln!(f, "Confidence: {}", self.confidence)?;

        if !self.labels.is_empty() {
            writeln!(f, "Per activity:")?;
            for (label, stats) in &self.labels {
                writeln!(
                    f,
                    "  {:<9} entries={} time={:.1}s",
                    label.as_str(),
                    stats.entries,
                    stats.dwell_ms as f64 / 1000.0
                )?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
