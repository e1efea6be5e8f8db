//! Sliding window of recent sensor samples
//!
//! ## Overview
//!
//! The predictor works on the last fraction-of-a-second of sensor data,
//! not on individual readings. This module provides that working set: a
//! ring buffer that keeps the most recent samples in arrival order and
//! silently evicts the oldest on overflow. Feature extraction iterates it
//! oldest to newest, so identical window contents always produce
//! identical feature vectors.
//!
//! ## Design Rationale
//!
//! The window is an index-wrapped array rather than a growable deque:
//!
//! - O(1) insertion with automatic eviction; appending can never fail and
//!   never allocates, which keeps the predictor's hot loop flat
//! - the backing array is sized at compile time (`N`), while the
//!   *effective* capacity is a runtime value, because window length is a
//!   config tunable and rebuilding generic code per config value is not
//! - `Option` slots instead of `MaybeUninit` keep the crate free of
//!   `unsafe`
//!
//! ```text
//! SlidingWindow<8> with effective capacity 5, after 7 pushes:
//!
//! Physical:  [ s5  s6  s2  s3  s4 | --  --  -- ]
//!              0   1   2   3   4    5   6   7
//!                      ^ write_pos = 2      ^ slots beyond capacity unused
//!
//! Logical:   [ s2  s3  s4  s5  s6 ]   (oldest -> newest)
//! ```
//!
//! ## Invariants
//!
//! - `len <= capacity <= N` at all times
//! - after any sequence of pushes the window holds exactly
//!   `min(pushes, capacity)` samples, and they are the most recent ones
//!   in arrival order
//! - the window is owned by one predictor thread; it is not `Sync`-safe
//!   shared state and never needs to be

use crate::events::{SensorKind, SensorSample};

/// Ring buffer of the most recent sensor samples.
///
/// `N` is the backing capacity; the effective capacity is set at
/// construction and clamped into `1..=N`. See the module docs for the
/// layout and invariants.
#[derive(Clone)]
pub struct SlidingWindow<const N: usize> {
    data: [Option<SensorSample>; N],
    /// Physical index of the next write, always `< capacity`.
    write_pos: usize,
    /// Number of valid samples, `<= capacity`.
    len: usize,
    /// Effective capacity, `1..=N`.
    capacity: usize,
}

impl<const N: usize> SlidingWindow<N> {
    /// Empty window using the full backing capacity.
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            write_pos: 0,
            len: 0,
            capacity: N,
        }
    }

    /// Empty window with a runtime effective capacity, clamped into
    /// `1..=N`. Callers validate their configuration before this point;
    /// the clamp is the type's own floor, not an error channel.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut window = Self::new();
        window.capacity = capacity.clamp(1, N);
        window
    }

    /// Append a sample, evicting the oldest if the window is full.
    pub fn push(&mut self, sample: SensorSample) {
        self.data[self.write_pos] = Some(sample);
        self.write_pos = (self.write_pos + 1) % self.capacity;

        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the window has reached its effective capacity.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Effective capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently pushed sample.
    pub fn last(&self) -> Option<&SensorSample> {
        if self.is_empty() {
            return None;
        }

        let idx = if self.write_pos == 0 {
            self.capacity - 1
        } else {
            self.write_pos - 1
        };

        self.data[idx].as_ref()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> WindowIter<'_, N> {
        WindowIter {
            window: self,
            index: 0,
        }
    }

    /// Iterate oldest to newest over samples of one sensor kind.
    ///
    /// Feature extraction calls this once per kind and axis; the filter
    /// preserves arrival order, so the per-kind series is deterministic.
    pub fn iter_kind(&self, kind: SensorKind) -> impl Iterator<Item = &SensorSample> + '_ {
        self.iter().filter(move |sample| sample.kind == kind)
    }

    /// Drop all samples. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    /// Sample by logical index: 0 is the oldest, `len - 1` the newest.
    ///
    /// While the window is filling, logical and physical indices match.
    /// Once full, the oldest sample sits at `write_pos` and the lookup
    /// wraps: `physical = (write_pos + index) % capacity`.
    fn get(&self, index: usize) -> Option<&SensorSample> {
        if index >= self.len {
            return None;
        }

        let actual = if self.len < self.capacity {
            index
        } else {
            (self.write_pos + index) % self.capacity
        };

        self.data[actual].as_ref()
    }
}

impl<const N: usize> Default for SlidingWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Oldest-to-newest iterator over a [`SlidingWindow`].
pub struct WindowIter<'a, const N: usize> {
    window: &'a SlidingWindow<N>,
    index: usize,
}

impl<'a, const N: usize> Iterator for WindowIter<'a, N> {
    type Item = &'a SensorSample;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.window.get(self.index)?;
        self.index += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SourceId;

    fn sample(n: usize) -> SensorSample {
        SensorSample::new(
            n as f64 * 0.02,
            SensorKind::Acceleration,
            &[n as f32, 0.0, 0.0],
            SourceId::new("test"),
        )
        .unwrap()
    }

    fn gyro_sample(n: usize) -> SensorSample {
        SensorSample::new(
            n as f64 * 0.02,
            SensorKind::Gyroscope,
            &[0.0, n as f32, 0.0],
            SourceId::new("test"),
        )
        .unwrap()
    }

    #[test]
    fn empty_window() {
        let window: SlidingWindow<5> = SlidingWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
        assert!(window.last().is_none());
        assert_eq!(window.capacity(), 5);
    }

    #[test]
    fn push_and_retrieve() {
        let mut window = SlidingWindow::<5>::new();
        window.push(sample(7));

        assert_eq!(window.len(), 1);
        assert!(!window.is_empty());
        assert_eq!(window.last().unwrap().values()[0], 7.0);
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let mut window = SlidingWindow::<3>::new();
        for n in 0..5 {
            window.push(sample(n));
        }

        assert_eq!(window.len(), 3);
        assert!(window.is_full());

        let xs: Vec<f32> = window.iter().map(|s| s.values()[0]).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn iterates_oldest_to_newest() {
        let mut window = SlidingWindow::<4>::new();
        for n in 0..4 {
            window.push(sample(n));
        }

        let timestamps: Vec<f64> = window.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![0.0, 0.02, 0.04, 0.06]);
    }

    #[test]
    fn runtime_capacity_is_honored() {
        let mut window = SlidingWindow::<8>::with_capacity(5);
        assert_eq!(window.capacity(), 5);

        for n in 0..7 {
            window.push(sample(n));
        }

        assert_eq!(window.len(), 5);
        let xs: Vec<f32> = window.iter().map(|s| s.values()[0]).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(window.last().unwrap().values()[0], 6.0);
    }

    #[test]
    fn capacity_clamps_into_backing_range() {
        let zero = SlidingWindow::<4>::with_capacity(0);
        assert_eq!(zero.capacity(), 1);

        let oversized = SlidingWindow::<4>::with_capacity(100);
        assert_eq!(oversized.capacity(), 4);
    }

    #[test]
    fn clear_resets_contents() {
        let mut window = SlidingWindow::<4>::new();
        for n in 0..4 {
            window.push(sample(n));
        }
        window.clear();

        assert!(window.is_empty());
        assert!(window.last().is_none());
        assert_eq!(window.iter().count(), 0);

        window.push(sample(9));
        assert_eq!(window.last().unwrap().values()[0], 9.0);
    }

    #[test]
    fn kind_filter_preserves_order() {
        let mut window = SlidingWindow::<6>::new();
        window.push(sample(0));
        window.push(gyro_sample(1));
        window.push(sample(2));
        window.push(gyro_sample(3));

        let accel: Vec<f32> = window
            .iter_kind(SensorKind::Acceleration)
            .map(|s| s.values()[0])
            .collect();
        assert_eq!(accel, vec![0.0, 2.0]);

        let gyro: Vec<f32> = window
            .iter_kind(SensorKind::Gyroscope)
            .map(|s| s.values()[1])
            .collect();
        assert_eq!(gyro, vec![1.0, 3.0]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// However many samples go in, the window holds exactly
            /// `min(pushes, capacity)` of them: the most recent, in order.
            #[test]
            fn holds_most_recent_in_order(
                count in 0usize..300,
                capacity in 1usize..=16,
            ) {
                let mut window = SlidingWindow::<16>::with_capacity(capacity);
                for n in 0..count {
                    window.push(sample(n));
                }

                prop_assert_eq!(window.len(), count.min(capacity));

                let expected: Vec<f32> = (count.saturating_sub(capacity)..count)
                    .map(|n| n as f32)
                    .collect();
                let actual: Vec<f32> =
                    window.iter().map(|s| s.values()[0]).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
