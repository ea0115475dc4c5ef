//! Rule-based activity scoring
//!
//! Every label gets an independent score built from fixed-weight threshold
//! predicates over the feature vector. Thresholds and weights are constants;
//! only the sparse-data gate and the confidence floor come from config.

use contracts::{
    ActivityLabel, ActivityScores, ClassificationResult, EngineConfig, FeatureVector,
};

/// Result returned when the window holds too few samples
pub const SPARSE_FALLBACK: ClassificationResult = ClassificationResult::new(ActivityLabel::Idle, 0.5);

/// Result returned when no label clears the confidence floor
pub const LOW_CONFIDENCE_FALLBACK: ClassificationResult =
    ClassificationResult::new(ActivityLabel::Idle, 0.6);

pub const DEFAULT_MIN_SAMPLES: usize = 10;
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.3;

/// Scores feature vectors against the fixed rule table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityScorer {
    min_samples: usize,
    confidence_floor: f64,
}

impl Default for ActivityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SAMPLES, DEFAULT_CONFIDENCE_FLOOR)
    }
}

impl ActivityScorer {
    pub fn new(min_samples: usize, confidence_floor: f64) -> Self {
        Self {
            min_samples,
            confidence_floor,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.min_samples_for_classification, config.confidence_floor)
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn confidence_floor(&self) -> f64 {
        self.confidence_floor
    }

    /// Clamped score of every label, ordered like [`ActivityLabel::ALL`]
    pub fn score_all(&self, features: &FeatureVector) -> ActivityScores {
        let scores = ActivityLabel::ALL.map(|label| score_label(label, features).clamp(0.0, 1.0));
        ActivityScores::from_ordered(scores)
    }

    /// Pick the winning label for a window of `sample_count` samples
    pub fn classify(&self, features: &FeatureVector, sample_count: usize) -> ClassificationResult {
        if sample_count < self.min_samples {
            return SPARSE_FALLBACK;
        }

        let (label, score) = self.score_all(features).best();
        if score < self.confidence_floor {
            return LOW_CONFIDENCE_FALLBACK;
        }

        ClassificationResult::new(label, score)
    }
}

/// Classify with the default gate (10 samples) and floor (0.3)
pub fn classify(features: &FeatureVector, sample_count: usize) -> ClassificationResult {
    ActivityScorer::default().classify(features, sample_count)
}

fn score_label(label: ActivityLabel, f: &FeatureVector) -> f64 {
    match label {
        ActivityLabel::Idle => idle_score(f),
        ActivityLabel::Walking => walking_score(f),
        ActivityLabel::Running => running_score(f),
        ActivityLabel::Cycling => cycling_score(f),
        ActivityLabel::Driving => driving_score(f),
        ActivityLabel::Sleeping => sleeping_score(f),
    }
}

#[inline]
fn weight(condition: bool, weight: f64) -> f64 {
    if condition {
        weight
    } else {
        0.0
    }
}

fn walking_score(f: &FeatureVector) -> f64 {
    weight(f.step_frequency_hz > 0.5 && f.step_frequency_hz < 3.0, 0.4)
        + weight(f.accel_variance > 0.3 && f.accel_variance < 2.0, 0.3)
        + weight(f.vertical_movement > 0.2, 0.3)
}

fn running_score(f: &FeatureVector) -> f64 {
    weight(f.step_frequency_hz > 2.5, 0.5)
        + weight(f.accel_variance > 1.5, 0.3)
        + weight(f.movement_intensity > 1.0, 0.2)
}

fn cycling_score(f: &FeatureVector) -> f64 {
    weight(f.gyro_variance > 0.5 && f.accel_variance < 1.5, 0.4)
        + weight(f.horizontal_movement > 0.3, 0.3)
        + weight(f.step_frequency_hz < 0.5, 0.3)
}

fn driving_score(f: &FeatureVector) -> f64 {
    weight(f.accel_variance > 0.8 && f.gyro_variance < 0.5, 0.4)
        + weight(f.step_frequency_hz < 0.2, 0.3)
        + weight(f.movement_intensity > 0.5 && f.movement_intensity < 1.5, 0.3)
}

fn sleeping_score(f: &FeatureVector) -> f64 {
    weight(f.movement_intensity < 0.2, 0.5)
        + weight(f.mean_accel_mag < 0.1, 0.3)
        + weight(f.step_frequency_hz < 0.1, 0.2)
}

fn idle_score(f: &FeatureVector) -> f64 {
    weight(f.movement_intensity < 0.5 && f.step_frequency_hz < 0.3, 0.4)
        + weight(f.accel_variance < 0.5, 0.3)
        + weight(f.gyro_variance < 0.3, 0.3)
}
