//! Clocks and timestamps
//!
//! Timestamps are plain `f64` seconds: that is what the wire format
//! carries, and fractional seconds are the natural unit for cooldowns
//! measured in tenths of a second. The [`Clock`] trait exists so the two
//! places that read "now" (receipt stamping and actor cooldowns) can be
//! driven by a hand-cranked clock in tests.

/// Seconds, monotonic or wall clock depending on the source.
pub type Timestamp = f64;

/// Source of the current time.
pub trait Clock {
    /// Current time in seconds.
    fn now(&self) -> Timestamp;

    /// Whether readings are wall-clock (absolute) rather than relative
    /// to some arbitrary origin.
    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Monotonic clock anchored at its own construction.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    /// Clock reading zero at the moment of this call.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Wall clock: seconds since the Unix epoch.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct WallClock;

#[cfg(feature = "std")]
impl Clock for WallClock {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Hand-cranked clock for tests.
///
/// Internally an atomic microsecond counter behind an `Arc`, so a cloned
/// handle can advance time for a clock owned by another thread.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: std::sync::Arc<core::sync::atomic::AtomicU64>,
}

#[cfg(feature = "std")]
impl ManualClock {
    /// Clock starting at the given time.
    pub fn new(start: Timestamp) -> Self {
        let clock = Self::default();
        clock.set(start);
        clock
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Timestamp) {
        let micros = (now.max(0.0) * 1_000_000.0) as u64;
        self.micros
            .store(micros, core::sync::atomic::Ordering::Relaxed);
    }

    /// Move forward by `delta` seconds.
    pub fn advance(&self, delta: Timestamp) {
        let micros = (delta.max(0.0) * 1_000_000.0) as u64;
        self.micros
            .fetch_add(micros, core::sync::atomic::Ordering::Relaxed);
    }
}

#[cfg(feature = "std")]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.micros.load(core::sync::atomic::Ordering::Relaxed) as f64 / 1_000_000.0
    }
}
