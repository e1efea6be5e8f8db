//! Bounded handoff queues between pipeline stages
//!
//! ## Overview
//!
//! The pipeline's three threads never share mutable state directly; they
//! communicate through two of these queues (collector -> predictor and
//! predictor -> actor). The queue is deliberately asymmetric:
//!
//! - **producers never block.** The collector must get back to its socket
//!   before the next datagram arrives, so `push` is a non-blocking call
//!   whose overflow behavior is a named policy, not a stall
//! - **consumers park.** The predictor has nothing useful to do with an
//!   empty queue, so `pop_timeout` sleeps on a condvar until data or a
//!   deadline arrives; the timeout bounds how long a stop request can go
//!   unnoticed
//!
//! ## Overflow Accounting
//!
//! Every push, pop, and drop is counted so a saturated stage shows up in
//! the periodic status line instead of silently degrading:
//!
//! ```text
//! StageQueue<SensorSample>, capacity 4, DropOldest, after 6 pushes:
//!
//!   [ s2  s3  s4  s5 ]     pushed: 6   dropped: 2   max_depth: 4
//! ```
//!
//! ## Example
//!
//! ```rust
//! use airpad_core::queue::{OverflowPolicy, StageQueue};
//!
//! let queue = StageQueue::new(8, OverflowPolicy::DropOldest);
//! assert!(queue.push(42u32));
//! assert_eq!(queue.pop(), Some(42));
//! assert_eq!(queue.pop(), None);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// What `push` does when the queue is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Evict the oldest queued item to make room. Both stage queues use
    /// this: a fresh sample or verdict supersedes a stale one.
    DropOldest,
    /// Reject the incoming item, preserving what is already queued.
    DropNewest,
}

/// Running counters for one queue.
///
/// Counters are atomics so `stats` never touches the queue mutex.
#[derive(Debug, Default)]
struct QueueStats {
    pushed: AtomicU64,
    popped: AtomicU64,
    dropped: AtomicU64,
    max_depth: AtomicU64,
}

impl QueueStats {
    fn update_max_depth(&self, current: u64) {
        let mut max = self.max_depth.load(Ordering::Relaxed);
        while current > max {
            match self.max_depth.compare_exchange_weak(
                max,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => max = actual,
            }
        }
    }
}

/// Point-in-time copy of a queue's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStatsSnapshot {
    /// Items accepted by `push`, including ones later evicted.
    pub pushed: u64,
    /// Items handed to a consumer.
    pub popped: u64,
    /// Items lost to overflow, under either policy.
    pub dropped: u64,
    /// Highest queue depth observed.
    pub max_depth: u64,
}

/// Bounded FIFO with non-blocking producers and parking consumers.
pub struct StageQueue<T> {
    inner: Mutex<VecDeque<T>>,
    available: Condvar,
    capacity: usize,
    policy: OverflowPolicy,
    stats: QueueStats,
}

impl<T> StageQueue<T> {
    /// Empty queue holding at most `capacity` items (floor of 1).
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
            policy,
            stats: QueueStats::default(),
        }
    }

    /// Offer an item without blocking.
    ///
    /// Returns whether the item entered the queue. Under `DropOldest`
    /// this is always `true` (the head is evicted to make room); under
    /// `DropNewest` a full queue returns `false`. Either way one drop is
    /// counted when at capacity.
    pub fn push(&self, item: T) -> bool {
        let mut inner = self.lock_inner();

        if inner.len() == self.capacity {
            match self.policy {
                OverflowPolicy::DropOldest => {
                    inner.pop_front();
                    self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                }
                OverflowPolicy::DropNewest => {
                    self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                    return false;
                }
            }
        }

        inner.push_back(item);
        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        self.stats.update_max_depth(inner.len() as u64);
        drop(inner);

        self.available.notify_one();
        true
    }

    /// Take the oldest item if one is ready, without blocking.
    pub fn pop(&self) -> Option<T> {
        let item = self.lock_inner().pop_front();
        if item.is_some() {
            self.stats.popped.fetch_add(1, Ordering::Relaxed);
        }
        item
    }

    /// Take the oldest item, parking up to `timeout` for one to arrive.
    ///
    /// Returns `None` only after the full timeout has elapsed with the
    /// queue empty. Spurious condvar wakeups re-enter the wait with the
    /// remaining time, so the deadline holds.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock_inner();

        loop {
            if let Some(item) = inner.pop_front() {
                self.stats.popped.fetch_add(1, Ordering::Relaxed);
                return Some(item);
            }

            let remaining = deadline.checked_duration_since(Instant::now())?;
            inner = match self.available.wait_timeout(inner, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.lock_inner().len()
    }

    /// Whether no items are queued.
    pub fn is_empty(&self) -> bool {
        self.lock_inner().is_empty()
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Overflow policy this queue was built with.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Copy of the running counters.
    pub fn stats(&self) -> QueueStatsSnapshot {
        QueueStatsSnapshot {
            pushed: self.stats.pushed.load(Ordering::Relaxed),
            popped: self.stats.popped.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
            max_depth: self.stats.max_depth.load(Ordering::Relaxed),
        }
    }

    /// A poisoned mutex means a holder panicked mid-operation; the deque
    /// itself is still structurally valid, so keep serving.
    fn lock_inner(&self) -> MutexGuard<'_, VecDeque<T>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_order_preserved() {
        let queue = StageQueue::new(8, OverflowPolicy::DropNewest);
        for n in 0..5 {
            assert!(queue.push(n));
        }

        let drained: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn drop_oldest_evicts_head() {
        let queue = StageQueue::new(4, OverflowPolicy::DropOldest);
        for n in 0..6 {
            assert!(queue.push(n));
        }

        assert_eq!(queue.len(), 4);
        let drained: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![2, 3, 4, 5]);

        let stats = queue.stats();
        assert_eq!(stats.pushed, 6);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.popped, 4);
    }

    #[test]
    fn drop_newest_rejects_when_full() {
        let queue = StageQueue::new(2, OverflowPolicy::DropNewest);
        assert!(queue.push(0));
        assert!(queue.push(1));
        assert!(!queue.push(2));

        let drained: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![0, 1]);
        assert_eq!(queue.stats().dropped, 1);
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let queue: StageQueue<u32> = StageQueue::new(4, OverflowPolicy::DropOldest);
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_timeout_waits_full_duration() {
        let queue: StageQueue<u32> = StageQueue::new(4, OverflowPolicy::DropOldest);
        let timeout = Duration::from_millis(50);

        let start = Instant::now();
        assert_eq!(queue.pop_timeout(timeout), None);
        assert!(start.elapsed() >= timeout);
    }

    #[test]
    fn pop_timeout_wakes_on_push() {
        let queue = Arc::new(StageQueue::new(4, OverflowPolicy::DropOldest));
        let producer = Arc::clone(&queue);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push(99u32);
        });

        let got = queue.pop_timeout(Duration::from_secs(5));
        assert_eq!(got, Some(99));
        handle.join().unwrap();
    }

    #[test]
    fn cross_thread_order_is_preserved() {
        let queue = Arc::new(StageQueue::new(128, OverflowPolicy::DropNewest));
        let producer = Arc::clone(&queue);

        let handle = thread::spawn(move || {
            for n in 0..100u32 {
                assert!(producer.push(n));
            }
        });

        let mut received = Vec::new();
        while received.len() < 100 {
            if let Some(n) = queue.pop_timeout(Duration::from_secs(5)) {
                received.push(n);
            }
        }
        handle.join().unwrap();

        let expected: Vec<u32> = (0..100).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn max_depth_tracks_high_water_mark() {
        let queue = StageQueue::new(8, OverflowPolicy::DropNewest);
        for n in 0..3 {
            queue.push(n);
        }
        while queue.pop().is_some() {}
        queue.push(9);

        assert_eq!(queue.stats().max_depth, 3);
    }

    #[test]
    fn capacity_floor_is_one() {
        let queue = StageQueue::new(0, OverflowPolicy::DropOldest);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.push(7));
        assert!(queue.push(8));
        assert_eq!(queue.pop(), Some(8));
    }
}
