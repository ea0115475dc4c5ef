//! Inbound sensor data: raw readings and joined samples.

use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Zero vector
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude `sqrt(x² + y² + z²)`
    #[inline]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Magnitude of the x/y components only
    #[inline]
    pub fn horizontal_magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// One accelerometer reading joined with the nearest gyroscope reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JoinedSample {
    /// Accelerometer (m/s²)
    pub accel: Vector3,

    /// Gyroscope (rad/s), zero when no reading fell inside the join window
    pub gyro: Vector3,

    /// Cumulative step count reported by the platform pedometer, if any
    pub step_count_hint: Option<f64>,

    /// Accelerometer timestamp (ms)
    pub timestamp_ms: u64,
}

impl JoinedSample {
    /// Create a sample with no gyroscope data yet
    pub fn from_accel(accel: Vector3, timestamp_ms: u64) -> Self {
        Self {
            accel,
            gyro: Vector3::ZERO,
            step_count_hint: None,
            timestamp_ms,
        }
    }
}

/// Origin of a raw reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingKind {
    Accelerometer,
    Gyroscope,
    /// Pedometer step count, carried in `x`
    StepCount,
}

/// A single raw reading as delivered by the acquisition collaborator.
///
/// This is also the line format of recorded JSON-lines files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub kind: ReadingKind,
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    pub timestamp_ms: u64,
}

impl SensorReading {
    pub fn accelerometer(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            kind: ReadingKind::Accelerometer,
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    pub fn gyroscope(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self {
            kind: ReadingKind::Gyroscope,
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    pub fn step_count(count: f64, timestamp_ms: u64) -> Self {
        Self {
            kind: ReadingKind::StepCount,
            x: count,
            y: 0.0,
            z: 0.0,
            timestamp_ms,
        }
    }

    /// The reading's axes as a vector
    pub fn vector(&self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}
