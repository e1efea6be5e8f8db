//! Error types for sample construction and validation
//!
//! Kept small and `Copy`: these surface on the datagram decode path,
//! where a malformed payload is an expected event, not an exception.

use thiserror_no_std::Error;

use crate::events::SensorKind;

/// Why a would-be [`SensorSample`](crate::events::SensorSample) was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// Component count does not match what the sensor kind carries.
    #[error("{kind:?} expects {expected} components, got {got}")]
    ComponentMismatch {
        /// Sensor kind the payload claimed.
        kind: SensorKind,
        /// Component count that kind requires.
        expected: usize,
        /// Component count the payload carried.
        got: usize,
    },

    /// A component was NaN or infinite.
    #[error("{kind:?} component {axis} is not finite")]
    NonFinite {
        /// Sensor kind the payload claimed.
        kind: SensorKind,
        /// Index of the offending component.
        axis: usize,
    },

    /// The timestamp was NaN, infinite, or negative.
    #[error("timestamp is not a finite non-negative value")]
    BadTimestamp,
}
