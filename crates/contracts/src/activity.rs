//! Classification output types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete activity label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLabel {
    #[default]
    Idle,
    Walking,
    Running,
    Cycling,
    Sleeping,
    Driving,
}

impl ActivityLabel {
    /// All labels in scoring order; the first label holding the maximal
    /// score wins a tie.
    pub const ALL: [ActivityLabel; 6] = [
        ActivityLabel::Idle,
        ActivityLabel::Walking,
        ActivityLabel::Running,
        ActivityLabel::Cycling,
        ActivityLabel::Driving,
        ActivityLabel::Sleeping,
    ];

    /// Lowercase name, as used in logs, metrics and config files
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLabel::Idle => "idle",
            ActivityLabel::Walking => "walking",
            ActivityLabel::Running => "running",
            ActivityLabel::Cycling => "cycling",
            ActivityLabel::Sleeping => "sleeping",
            ActivityLabel::Driving => "driving",
        }
    }

    /// Parse a lowercase label name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(name))
    }

    /// Whether the user is physically active (used by inactivity reminders)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ActivityLabel::Walking | ActivityLabel::Running | ActivityLabel::Cycling
        )
    }
}

impl fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window statistics fed to the scorer.
///
/// All fields are zero for an empty window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub mean_accel_mag: f64,
    pub accel_variance: f64,
    pub mean_gyro_mag: f64,
    pub gyro_variance: f64,
    pub step_frequency_hz: f64,
    pub movement_intensity: f64,
    pub vertical_movement: f64,
    pub horizontal_movement: f64,
}

/// Result of one classification tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: ActivityLabel,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
}

impl ClassificationResult {
    pub const fn new(label: ActivityLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Per-label scores of one evaluation, in [`ActivityLabel::ALL`] order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivityScores {
    scores: [f64; 6],
}

impl ActivityScores {
    /// Build from scores ordered like [`ActivityLabel::ALL`]
    pub fn from_ordered(scores: [f64; 6]) -> Self {
        Self { scores }
    }

    pub fn get(&self, label: ActivityLabel) -> f64 {
        let idx = ActivityLabel::ALL
            .iter()
            .position(|l| *l == label)
            .unwrap_or(0);
        self.scores[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActivityLabel, f64)> + '_ {
        ActivityLabel::ALL.into_iter().zip(self.scores.iter().copied())
    }

    /// First label holding the maximal score
    pub fn best(&self) -> (ActivityLabel, f64) {
        self.iter().fold(
            (ActivityLabel::ALL[0], f64::NEG_INFINITY),
            |best, (label, score)| {
                if score > best.1 {
                    (label, score)
                } else {
                    best
                }
            },
        )
    }
}

/// State-change event delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityChanged {
    pub label: ActivityLabel,
    pub confidence: f64,
    pub timestamp_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_names_round_trip() {
        for label in ActivityLabel::ALL {
            assert_eq!(ActivityLabel::from_name(label.as_str()), Some(label));
        }
        assert_eq!(ActivityLabel::from_name("WALKING"), Some(ActivityLabel::Walking));
        assert_eq!(ActivityLabel::from_name("swimming"), None);
    }

    #[test]
    fn test_is_active() {
        assert!(ActivityLabel::Running.is_active());
        assert!(ActivityLabel::Cycling.is_active());
        assert!(!ActivityLabel::Driving.is_active());
        assert!(!ActivityLabel::Sleeping.is_active());
    }

    #[test]
    fn test_best_prefers_first_on_tie() {
        let scores = ActivityScores::from_ordered([0.7, 0.3, 0.0, 0.0, 0.2, 0.7]);
        assert_eq!(scores.best(), (ActivityLabel::Idle, 0.7));

        let scores = ActivityScores::from_ordered([0.3, 0.3, 0.9, 0.0, 0.0, 0.0]);
        assert_eq!(scores.best(), (ActivityLabel::Running, 0.9));
        assert_eq!(scores.get(ActivityLabel::Walking), 0.3);
    }

    #[test]
    fn test_event_serializes_snake_case_label() {
        let event = ActivityChanged {
            label: ActivityLabel::Walking,
            confidence: 1.0,
            timestamp_ms: 2000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""label":"walking""#), "got: {json}");
    }
}
