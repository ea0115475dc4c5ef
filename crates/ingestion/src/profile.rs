//! Synthetic motion waveforms, one per activity.
//!
//! Each profile is a deterministic function of the sample index and time.
//! Tuned at 10 Hz so that any 20-sample window classifies as its label.

use std::f64::consts::TAU;

use contracts::{ActivityLabel, Vector3};

/// Motion pattern to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionProfile {
    /// Device lying still
    Idle,
    /// Motionless accel with a twitching gyro (restless sleep)
    Sleeping,
    /// ~1.5 Hz vertical bounce
    Walking,
    /// ~3.2 Hz, high-variance bounce
    Running,
    /// Steady accel, strongly oscillating gyro
    Cycling,
    /// Horizontal surges, quiet gyro
    Driving,
}

impl MotionProfile {
    pub const ALL: [MotionProfile; 6] = [
        MotionProfile::Idle,
        MotionProfile::Sleeping,
        MotionProfile::Walking,
        MotionProfile::Running,
        MotionProfile::Cycling,
        MotionProfile::Driving,
    ];

    /// Label a classifier should produce for this profile
    pub fn expected_label(&self) -> ActivityLabel {
        match self {
            MotionProfile::Idle => ActivityLabel::Idle,
            MotionProfile::Sleeping => ActivityLabel::Sleeping,
            MotionProfile::Walking => ActivityLabel::Walking,
            MotionProfile::Running => ActivityLabel::Running,
            MotionProfile::Cycling => ActivityLabel::Cycling,
            MotionProfile::Driving => ActivityLabel::Driving,
        }
    }

    pub fn from_label(label: ActivityLabel) -> Self {
        match label {
            ActivityLabel::Idle => MotionProfile::Idle,
            ActivityLabel::Sleeping => MotionProfile::Sleeping,
            ActivityLabel::Walking => MotionProfile::Walking,
            ActivityLabel::Running => MotionProfile::Running,
            ActivityLabel::Cycling => MotionProfile::Cycling,
            ActivityLabel::Driving => MotionProfile::Driving,
        }
    }

    /// Step cadence in steps per second (0 for step-free activities)
    pub fn cadence_hz(&self) -> f64 {
        match self {
            MotionProfile::Walking => 1.5,
            MotionProfile::Running => 3.2,
            _ => 0.0,
        }
    }

    /// Accelerometer and gyroscope vectors of sample `index` at `t_s` seconds
    pub fn sample(&self, index: u64, t_s: f64) -> (Vector3, Vector3) {
        match self {
            MotionProfile::Idle => (Vector3::new(0.0, 0.0, 0.15), Vector3::ZERO),
            MotionProfile::Sleeping => {
                let twitch = if index % 2 == 1 { 1.2 } else { 0.0 };
                (Vector3::new(0.0, 0.0, 0.05), Vector3::new(twitch, 0.0, 0.0))
            }
            MotionProfile::Walking => {
                let phase = TAU * 1.5 * t_s;
                (
                    Vector3::new(0.5, 0.5, 1.0 + 1.2 * phase.sin()),
                    Vector3::new(0.2, 0.2 * phase.cos(), 0.1),
                )
            }
            MotionProfile::Running => {
                let phase = TAU * 3.2 * t_s;
                (
                    Vector3::new(1.0, 1.0, 2.0 + 4.0 * phase.sin()),
                    Vector3::new(0.5 * phase.sin(), 0.5, 0.3),
                )
            }
            MotionProfile::Cycling => (
                Vector3::new(0.6, 0.6, 0.2),
                Vector3::new(1.0 + 1.5 * (TAU * 1.2 * t_s).sin(), 0.2, 0.1),
            ),
            MotionProfile::Driving => (
                Vector3::new(2.0 + 1.7 * (TAU * t_s).sin(), 0.3, 0.1),
                Vector3::new(0.05, 0.05 * (TAU * 0.5 * t_s).sin(), 0.02),
            ),
        }
    }
}

impl std::str::FromStr for MotionProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityLabel::from_name(s)
            .map(Self::from_label)
            .ok_or_else(|| format!("unknown motion profile '{s}'"))
    }
}

impl std::fmt::Display for MotionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.expected_label().as_str())
    }
}
