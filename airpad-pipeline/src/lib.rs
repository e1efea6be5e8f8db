//! Gesture Recognition Pipeline Runtime
//!
//! ## Overview
//!
//! This crate assembles the airpad pipeline: three stages on three OS
//! threads, linked by bounded queues, turning phone sensor datagrams
//! into key actions.
//!
//! - [`Collector`] pulls samples from a [`SampleSource`] and never
//!   blocks on downstream
//! - [`Predictor`] windows the samples, runs the inference chain, and
//!   gates predictions by confidence
//! - [`Actor`] debounces predictions and drives an [`ActionSink`]
//!
//! The stages are generic over the traits at their edges, so the whole
//! pipeline runs against scripted sources, stub models, and recording
//! sinks in tests, with no socket, artifact, or OS input needed.
//!
//! ## Failure Model
//!
//! Three levels, deliberately distinct:
//!
//! 1. **Per-item**: a malformed datagram or a failed inference costs
//!    exactly that item. Logged, skipped, forgotten.
//! 2. **Budgeted**: sink failures are tolerated until too many happen
//!    consecutively.
//! 3. **Fatal**: transport loss, a spent sink budget, or any stage
//!    panic stops the whole pipeline. A partially-alive pipeline would
//!    look healthy while doing nothing, so fatality is always total.
//!
//! Startup errors (bad config, mismatched artifacts) are a fourth kind:
//! they happen before any thread exists and surface directly from
//! [`PipelineHandle::start`].
//!
//! [`SampleSource`]: airpad_connectors::SampleSource
//! [`ActionSink`]: airpad_connectors::ActionSink

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod actor;
pub mod collector;
pub mod config;
pub mod lifecycle;
pub mod predictor;

pub use actor::Actor;
pub use collector::Collector;
pub use config::{ActionConfig, ActionKind, ActionTable, Binding, PipelineConfig};
pub use lifecycle::{PipelineHandle, PipelineStats};
pub use predictor::Predictor;

use airpad_connectors::SourceError;
use thiserror::Error;

/// Anything that can stop the pipeline from starting or keep it from
/// running.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A configuration field failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Extractor, scaler, and model disagree on feature count.
    #[error(
        "feature arity mismatch: extractor {extractor}, scaler {scaler}, model {model}"
    )]
    ArityMismatch {
        /// Features the extractor produces.
        extractor: usize,
        /// Features the scaler was fit on.
        scaler: usize,
        /// Features the model was trained on.
        model: usize,
    },

    /// The sample source's transport failed.
    #[error("sample source failed: {0}")]
    Source(#[from] SourceError),

    /// The action sink failed too many times in a row.
    #[error("action sink failed {failures} times in a row: {last}")]
    SinkBudgetExhausted {
        /// Consecutive failures observed.
        failures: u32,
        /// The final failure's message.
        last: String,
    },

    /// The OS refused to start a stage thread.
    #[error("could not spawn {stage} thread: {source}")]
    Spawn {
        /// Stage whose thread failed to start.
        stage: &'static str,
        /// The underlying OS error.
        source: std::io::Error,
    },

    /// A stage thread was still running when the shutdown deadline hit.
    #[error("{stage} thread did not stop within {timeout_ms} ms")]
    JoinTimeout {
        /// Stage that failed to stop.
        stage: &'static str,
        /// The deadline it missed.
        timeout_ms: u64,
    },

    /// A stage thread panicked.
    #[error("{stage} thread panicked")]
    StagePanicked {
        /// Stage whose thread panicked.
        stage: &'static str,
    },
}
