//! Error types for feature extraction, scaling, and classification

use thiserror_no_std::Error;

/// Result alias used across the crate.
pub type MlResult<T> = Result<T, MlError>;

/// Failures in the inference path or while loading model artifacts.
#[derive(Debug, Error)]
pub enum MlError {
    /// A feature vector's length does not match what a consumer expects.
    ///
    /// At startup this means the extractor, scaler, and classifier were
    /// trained for different feature layouts; the pipeline refuses to run.
    #[error("dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch {
        /// Length the consumer was built for.
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },

    /// A fixed-capacity buffer could not hold the requested data.
    #[error("fixed buffer capacity exceeded")]
    CapacityExceeded,

    /// A parameter failed construction-time validation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// An artifact file could not be read.
    #[cfg(feature = "std")]
    #[error("artifact read failed: {0}")]
    Io(#[from] std::io::Error),

    /// An artifact file is not valid JSON.
    #[cfg(feature = "std")]
    #[error("artifact parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// An artifact parsed but its contents are unusable.
    #[cfg(feature = "std")]
    #[error("bad artifact: {0}")]
    Artifact(String),
}
