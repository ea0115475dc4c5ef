//! Window feature extraction
//!
//! Pure functions: the same window always yields the same vector.

use contracts::{FeatureVector, JoinedSample};

/// Vertical acceleration a peak must exceed to count as a step
pub const STEP_PEAK_THRESHOLD: f64 = 0.5;

/// Fewest samples that can contain an interior peak
const MIN_PEAK_WINDOW: usize = 3;

/// Compute the feature vector of a chronological window.
///
/// An empty window yields the all-zero vector.
pub fn extract(samples: &[JoinedSample]) -> FeatureVector {
    if samples.is_empty() {
        return FeatureVector::default();
    }

    let (mean_accel_mag, accel_variance) =
        mean_and_variance(samples.iter().map(|s| s.accel.magnitude()));
    let (mean_gyro_mag, gyro_variance) =
        mean_and_variance(samples.iter().map(|s| s.gyro.magnitude()));

    let count = samples.len() as f64;
    let vertical_movement = samples.iter().map(|s| s.accel.z.abs()).sum::<f64>() / count;
    let horizontal_movement = samples
        .iter()
        .map(|s| s.accel.horizontal_magnitude())
        .sum::<f64>()
        / count;

    FeatureVector {
        mean_accel_mag,
        accel_variance,
        mean_gyro_mag,
        gyro_variance,
        step_frequency_hz: step_frequency_hz(samples),
        movement_intensity: (accel_variance + gyro_variance) / 2.0,
        vertical_movement,
        horizontal_movement,
    }
}

/// Mean and population variance (two-pass)
fn mean_and_variance(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let (sum, count) = values.clone().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return (0.0, 0.0);
    }

    let mean = sum / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    (mean, variance)
}

/// Interior peaks of `accel.z` above the threshold, per second of window span
fn step_frequency_hz(samples: &[JoinedSample]) -> f64 {
    if samples.len() < MIN_PEAK_WINDOW {
        return 0.0;
    }

    let first = samples[0].timestamp_ms;
    let last = samples[samples.len() - 1].timestamp_ms;
    let span_s = last.saturating_sub(first) as f64 / 1000.0;
    if span_s == 0.0 {
        return 0.0;
    }

    let peaks = samples
        .windows(3)
        .filter(|w| {
            let (prev, cur, next) = (w[0].accel.z, w[1].accel.z, w[2].accel.z);
            cur > STEP_PEAK_THRESHOLD && cur > prev && cur > next
        })
        .count();

    peaks as f64 / span_s
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;

    fn accel_only(values: &[(f64, f64, f64)], step_ms: u64) -> Vec<JoinedSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| JoinedSample::from_accel(Vector3::new(x, y, z), i as u64 * step_ms))
            .collect()
    }

    fn vertical(series: &[f64], step_ms: u64) -> Vec<JoinedSample> {
        let values: Vec<_> = series.iter().map(|&z| (0.0, 0.0, z)).collect();
        accel_only(&values, step_ms)
    }

    #[test]
    fn test_empty_window_is_zero() {
        assert_eq!(extract(&[]), FeatureVector::default());
    }

    #[test]
    fn test_magnitude_statistics() {
        // magnitudes 5 and 0 -> mean 2.5, population variance 6.25
        let samples = accel_only(&[(3.0, 4.0, 0.0), (0.0, 0.0, 0.0)], 100);
        let f = extract(&samples);

        assert!((f.mean_accel_mag - 2.5).abs() < 1e-12);
        assert!((f.accel_variance - 6.25).abs() < 1e-12);
        assert!((f.horizontal_movement - 2.5).abs() < 1e-12);
        assert_eq!(f.vertical_movement, 0.0);
        assert_eq!(f.mean_gyro_mag, 0.0);
        assert_eq!(f.movement_intensity, 3.125);
    }

    #[test]
    fn test_vertical_movement_uses_absolute_value() {
        let samples = vertical(&[-1.0, 1.0, -3.0, 3.0], 100);
        let f = extract(&samples);
        assert!((f.vertical_movement - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_peak_count_over_span() {
        // Two interior peaks (1.0 at i=1, 2.0 at i=3) across 400 ms
        let samples = vertical(&[0.0, 1.0, 0.0, 2.0, 0.0], 100);
        let f = extract(&samples);
        assert!((f.step_frequency_hz - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_peaks_below_threshold_ignored() {
        let samples = vertical(&[0.0, 0.4, 0.0, 0.5, 0.0], 100);
        assert_eq!(extract(&samples).step_frequency_hz, 0.0);
    }

    #[test]
    fn test_boundary_and_plateau_not_peaks() {
        // first/last are never eligible; a plateau is not strictly higher
        let samples = vertical(&[5.0, 1.0, 2.0, 2.0, 1.0, 5.0], 100);
        assert_eq!(extract(&samples).step_frequency_hz, 0.0);
    }

    #[test]
    fn test_short_window_has_no_steps() {
        let samples = vertical(&[0.0, 9.0], 100);
        assert_eq!(extract(&samples).step_frequency_hz, 0.0);
    }

    #[test]
    fn test_zero_span_has_no_steps() {
        let samples = vertical(&[0.0, 1.0, 0.0], 0);
        assert_eq!(extract(&samples).step_frequency_hz, 0.0);
    }

    #[test]
    fn test_gyro_statistics() {
        let mut samples = accel_only(&[(0.0, 0.0, 0.0); 4], 100);
        for (i, s) in samples.iter_mut().enumerate() {
            s.gyro = Vector3::new(if i % 2 == 1 { 1.2 } else { 0.0 }, 0.0, 0.0);
        }
        let f = extract(&samples);
        assert!((f.mean_gyro_mag - 0.6).abs() < 1e-12);
        assert!((f.gyro_variance - 0.36).abs() < 1e-12);
        assert!((f.movement_intensity - 0.18).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let samples: Vec<_> = (0..20)
            .map(|i| {
                let t = i as f64 * 0.1;
                JoinedSample {
                    accel: Vector3::new(t.sin(), t.cos(), 1.0 + (3.0 * t).sin()),
                    gyro: Vector3::new(0.1 * t, 0.2, (2.0 * t).cos()),
                    step_count_hint: None,
                    timestamp_ms: i * 100,
                }
            })
            .collect();

        let a = extract(&samples);
        let b = extract(&samples);
        assert_eq!(a.mean_accel_mag.to_bits(), b.mean_accel_mag.to_bits());
        assert_eq!(a.accel_variance.to_bits(), b.accel_variance.to_bits());
        assert_eq!(a.gyro_variance.to_bits(), b.gyro_variance.to_bits());
        assert_eq!(a.step_frequency_hz.to_bits(), b.step_frequency_hz.to_bits());
    }
}
