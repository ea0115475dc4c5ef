//! Fixed-capacity FIFO of joined samples.
//!
//! Backed by a heap ring buffer: once full, every push overwrites the oldest
//! sample. Gyroscope and pedometer readings never create entries; they patch
//! the newest sample when close enough in time.

use std::fmt;

use contracts::{JoinedSample, Vector3};
use ringbuf::{traits::*, HeapRb};

/// Chronological sample buffer
pub struct SampleBuffer {
    samples: HeapRb<JoinedSample>,
    capacity: usize,
    evicted_count: u64,
    out_of_order_count: u64,
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("len", &self.samples.occupied_len())
            .field("capacity", &self.capacity)
            .field("evicted", &self.evicted_count)
            .finish()
    }
}

impl SampleBuffer {
    /// Create a buffer holding at most `capacity` samples (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: HeapRb::new(capacity),
            capacity,
            evicted_count: 0,
            out_of_order_count: 0,
        }
    }

    /// Append a sample, evicting the oldest when full.
    ///
    /// A sample older than the newest buffered one is rejected and counted,
    /// so timestamps stay non-decreasing. Returns whether it was stored.
    #[inline]
    pub fn push(&mut self, sample: JoinedSample) -> bool {
        if let Some(last) = self.latest() {
            if sample.timestamp_ms < last.timestamp_ms {
                self.out_of_order_count += 1;
                return false;
            }
        }

        if self.samples.push_overwrite(sample).is_some() {
            self.evicted_count += 1;
        }
        true
    }

    /// The most recent `min(n, len)` samples, oldest first
    #[inline]
    pub fn window(&self, n: usize) -> Vec<JoinedSample> {
        let skip = self.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    /// Newest sample, if any
    #[inline]
    pub fn latest(&self) -> Option<&JoinedSample> {
        self.samples.iter().last()
    }

    /// Overwrite the newest sample's gyroscope vector when `timestamp_ms`
    /// lies within `join_window_ms` of it. Returns whether it merged.
    pub fn merge_gyroscope(&mut self, gyro: Vector3, timestamp_ms: u64, join_window_ms: u64) -> bool {
        match self.latest_within(timestamp_ms, join_window_ms) {
            Some(sample) => {
                sample.gyro = gyro;
                true
            }
            None => false,
        }
    }

    /// Attach a pedometer count to the newest sample, same rule as gyroscope
    pub fn attach_step_count(&mut self, count: f64, timestamp_ms: u64, join_window_ms: u64) -> bool {
        match self.latest_within(timestamp_ms, join_window_ms) {
            Some(sample) => {
                sample.step_count_hint = Some(count);
                true
            }
            None => false,
        }
    }

    fn latest_within(&mut self, timestamp_ms: u64, join_window_ms: u64) -> Option<&mut JoinedSample> {
        self.samples
            .iter_mut()
            .last()
            .filter(|sample| sample.timestamp_ms.abs_diff(timestamp_ms) <= join_window_ms)
    }

    /// Drop every sample (counters are kept)
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples overwritten by FIFO eviction
    pub fn evicted_count(&self) -> u64 {
        self.evicted_count
    }

    /// Samples rejected for going back in time
    pub fn out_of_order_count(&self) -> u64 {
        self.out_of_order_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp_ms: u64) -> JoinedSample {
        JoinedSample::from_accel(Vector3::new(0.0, 0.0, timestamp_ms as f64), timestamp_ms)
    }

    fn timestamps(samples: &[JoinedSample]) -> Vec<u64> {
        samples.iter().map(|s| s.timestamp_ms).collect()
    }

    #[test]
    fn test_buffer_capacity_evicts_oldest() {
        let mut buffer = SampleBuffer::new(3);

        for t in 1..=5 {
            buffer.push(sample(t));
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.evicted_count(), 2);
        assert_eq!(timestamps(&buffer.window(10)), vec![3, 4, 5]);
    }

    #[test]
    fn test_bound_holds_for_long_sequences() {
        let mut buffer = SampleBuffer::new(50);

        for t in 0..1000 {
            buffer.push(sample(t));
            assert!(buffer.len() <= 50);
        }

        let window = buffer.window(50);
        assert_eq!(window.first().unwrap().timestamp_ms, 950);
        assert_eq!(window.last().unwrap().timestamp_ms, 999);
        assert!(window.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
    }

    #[test]
    fn test_window_returns_most_recent_in_order() {
        let mut buffer = SampleBuffer::new(10);
        for t in [10, 20, 30, 40] {
            buffer.push(sample(t));
        }

        assert_eq!(timestamps(&buffer.window(2)), vec![30, 40]);
        assert_eq!(timestamps(&buffer.window(0)), Vec::<u64>::new());
        assert_eq!(buffer.window(100).len(), 4);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut buffer = SampleBuffer::new(10);

        assert!(buffer.push(sample(100)));
        assert!(!buffer.push(sample(50)));
        assert!(buffer.push(sample(100)));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.out_of_order_count(), 1);
    }

    #[test]
    fn test_merge_gyroscope_within_window() {
        let mut buffer = SampleBuffer::new(10);
        buffer.push(sample(1000));

        let gyro = Vector3::new(0.1, 0.2, 0.3);
        assert!(buffer.merge_gyroscope(gyro, 1030, 50));
        assert_eq!(buffer.latest().unwrap().gyro, gyro);

        assert!(!buffer.merge_gyroscope(Vector3::new(9.0, 9.0, 9.0), 1100, 50));
        assert_eq!(buffer.latest().unwrap().gyro, gyro);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_merge_gyroscope_on_empty_buffer() {
        let mut buffer = SampleBuffer::new(10);
        assert!(!buffer.merge_gyroscope(Vector3::new(1.0, 0.0, 0.0), 0, 50));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_attach_step_count() {
        let mut buffer = SampleBuffer::new(4);
        buffer.push(sample(500));

        assert!(buffer.attach_step_count(120.0, 520, 50));
        assert_eq!(buffer.latest().unwrap().step_count_hint, Some(120.0));
        assert!(!buffer.attach_step_count(121.0, 900, 50));
    }

    #[test]
    fn test_clear() {
        let mut buffer = SampleBuffer::new(4);
        buffer.push(sample(1));
        buffer.push(sample(2));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
        // Timestamps may restart after a reset
        assert!(buffer.push(sample(0)));
    }
}
