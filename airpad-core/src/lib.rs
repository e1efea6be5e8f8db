//! Data plane for the airpad gesture pipeline
//!
//! Holds the types that flow between the pipeline stages: decoded sensor
//! samples, the sliding window they accumulate in, the label history the
//! actor debounces with, and the queues that link the stages together.
//!
//! Key constraints:
//! - Fixed allocation: windows and histories are index-wrapped arrays
//!   sized at compile time, with runtime effective capacities
//! - Samples are `Copy` and validated once, at construction
//! - Confidence is fixed-point so threshold comparisons are exact
//!
//! ```
//! use airpad_core::{SensorKind, SensorSample, SlidingWindow, SourceId};
//!
//! let mut window: SlidingWindow<8> = SlidingWindow::new();
//! let sample = SensorSample::new(
//!     0.02,
//!     SensorKind::Acceleration,
//!     &[0.1, 9.8, 0.3],
//!     SourceId::new("phone"),
//! ).unwrap();
//! window.push(sample);
//! assert_eq!(window.len(), 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod errors;
pub mod events;
pub mod history;
#[cfg(feature = "std")]
pub mod queue;
pub mod time;
pub mod window;

// Public API
pub use errors::SampleError;
pub use events::{Confidence, GestureLabel, Prediction, SensorKind, SensorSample, SourceId};
pub use history::PredictionHistory;
#[cfg(feature = "std")]
pub use queue::{OverflowPolicy, QueueStatsSnapshot, StageQueue};
pub use time::{Clock, Timestamp};
#[cfg(feature = "std")]
pub use time::{ManualClock, MonotonicClock, WallClock};
pub use window::SlidingWindow;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
