//! Named tunables shared across the pipeline crates
//!
//! Defaults mirror the sensor stream this pipeline was built against:
//! a phone streaming inertial sensors at roughly 50 Hz. Everything here
//! can be overridden through the runtime configuration; the constants
//! exist so the defaults have one home and one explanation.

/// Sample geometry.
pub mod sample {
    /// Largest component count any sensor kind carries (quaternion).
    pub const MAX_COMPONENTS: usize = 4;

    /// Bytes of inline storage for a stream source identifier.
    pub const SOURCE_ID_BYTES: usize = 15;
}

/// Sliding-window sizing.
pub mod window {
    /// Backing capacity for pipeline windows. Bounds the runtime
    /// `window_capacity` tunable; 256 samples is over five seconds at
    /// the expected 50 Hz rate.
    pub const MAX_CAPACITY: usize = 256;

    /// Default effective capacity: one second at 50 Hz.
    pub const DEFAULT_CAPACITY: usize = 50;

    /// Default fill floor before the predictor starts classifying.
    /// Half a window keeps startup latency low without classifying
    /// nearly-empty windows.
    pub const DEFAULT_MIN_FILL: usize = 25;
}

/// Stage-queue sizing.
pub mod queues {
    /// Collector to predictor queue. Samples are small and short-lived,
    /// so the bound is generous; the predictor's continuous drain keeps
    /// it shallow in practice.
    pub const SAMPLE_CAPACITY: usize = 1024;

    /// Predictor to actor queue. A gated prediction that sits here is
    /// stale almost immediately, so the bound is tight.
    pub const PREDICTION_CAPACITY: usize = 64;
}

/// Confidence gating and debouncing.
pub mod gating {
    /// Default confidence floor a prediction must clear to reach the
    /// actor. Matches the threshold the reference model was tuned at.
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

    /// Default prediction-history width: consecutive identical labels
    /// required before the actor fires.
    pub const DEFAULT_HISTORY_LENGTH: usize = 3;

    /// Backing capacity for the prediction history.
    pub const MAX_HISTORY_LENGTH: usize = 16;
}

/// Loop timing.
pub mod timing {
    /// Longest any stage sits in one blocking wait before re-checking
    /// the stop flag, in milliseconds. Bounds shutdown latency.
    pub const DEFAULT_IDLE_WAIT_MS: u64 = 100;

    /// Default per-thread join budget during shutdown, in milliseconds.
    pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 2000;
}

/// Actor failure policy.
pub mod actor {
    /// Consecutive action-sink failures tolerated before the actor
    /// declares the sink dead and shuts the pipeline down.
    pub const SINK_FAILURE_BUDGET: u32 = 8;
}
