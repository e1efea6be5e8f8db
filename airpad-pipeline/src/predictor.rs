//! Predictor stage: sample queue to prediction queue
//!
//! ## Overview
//!
//! The predictor is the pipeline's only compute-bound stage and its only
//! blocking dequeue. Each loop turn takes one sample (or an idle-wait
//! timeout), folds it into the sliding window, and once the window has
//! reached its minimum fill runs the inference chain:
//!
//! ```text
//! window ──extract──> features ──scale──> standardized ──predict──> (label, confidence)
//!                                                                        │
//!                                               confidence >= threshold ─┴─> prediction queue
//! ```
//!
//! A prediction at exactly the threshold passes. The comparison happens
//! in fixed-point [`Confidence`] space, so "exactly" is well defined and
//! identical across runs.
//!
//! ## Error Boundary
//!
//! The stage validates the inference chain once, at construction: the
//! extractor, scaler, and model must agree on feature arity or the
//! pipeline never starts. After that, any error from a single sample's
//! inference is logged and that sample's prediction skipped; the stage
//! itself keeps running. One bad sample costs one prediction, never the
//! session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use airpad_core::constants::window::MAX_CAPACITY;
use airpad_core::{Confidence, Prediction, SensorSample, SlidingWindow, StageQueue};
use airpad_ml::{Classifier, FeatureExtractor, FeatureVector, MlResult, StandardScaler};

use crate::config::PipelineConfig;
use crate::PipelineError;

/// Second pipeline stage; see the module docs.
pub struct Predictor<E: FeatureExtractor, M: Classifier> {
    input: Arc<StageQueue<SensorSample>>,
    output: Arc<StageQueue<Prediction>>,
    stop: Arc<AtomicBool>,
    extractor: E,
    scaler: StandardScaler,
    model: M,
    window: SlidingWindow<MAX_CAPACITY>,
    min_fill: usize,
    threshold: Confidence,
    idle_wait: Duration,
    features: FeatureVector,
}

impl<E: FeatureExtractor, M: Classifier> Predictor<E, M> {
    /// Build the stage, checking that the inference chain fits together.
    ///
    /// Fails with [`PipelineError::ArityMismatch`] unless the extractor,
    /// scaler, and model all expect the same feature count. This is the
    /// check that turns a wrong artifact pairing into a startup error
    /// instead of garbage predictions.
    pub fn new(
        extractor: E,
        scaler: StandardScaler,
        model: M,
        input: Arc<StageQueue<SensorSample>>,
        output: Arc<StageQueue<Prediction>>,
        stop: Arc<AtomicBool>,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let arities = (extractor.arity(), scaler.len(), model.n_features());
        if arities.0 != arities.1 || arities.1 != arities.2 {
            return Err(PipelineError::ArityMismatch {
                extractor: arities.0,
                scaler: arities.1,
                model: arities.2,
            });
        }

        Ok(Self {
            input,
            output,
            stop,
            extractor,
            scaler,
            model,
            window: SlidingWindow::with_capacity(config.window_capacity),
            min_fill: config.window_min_fill,
            threshold: Confidence::from_float(config.confidence_threshold),
            idle_wait: Duration::from_millis(config.idle_wait_ms),
            features: FeatureVector::new(),
        })
    }

    /// Stage name for thread naming and logs.
    pub fn name(&self) -> &'static str {
        "predictor"
    }

    /// Dequeue and classify until stopped.
    pub fn run(mut self) -> Result<(), PipelineError> {
        log::debug!(
            "predictor running (window {}, min fill {}, threshold {})",
            self.window.capacity(),
            self.min_fill,
            self.threshold
        );

        while !self.stop.load(Ordering::Relaxed) {
            let Some(sample) = self.input.pop_timeout(self.idle_wait) else {
                continue;
            };
            self.ingest(sample);
        }

        log::debug!("predictor stopped");
        Ok(())
    }

    /// Fold one sample into the window and classify if primed.
    pub fn ingest(&mut self, sample: SensorSample) {
        self.window.push(sample);
        if self.window.len() < self.min_fill {
            return;
        }

        match self.classify() {
            Ok(Some(prediction)) => {
                self.output.push(prediction);
            }
            Ok(None) => {}
            Err(err) => log::warn!("prediction skipped: {err}"),
        }
    }

    /// Run the inference chain over the current window.
    ///
    /// `Ok(None)` means the prediction did not clear the gate.
    fn classify(&mut self) -> MlResult<Option<Prediction>> {
        self.extractor.extract(&self.window, &mut self.features)?;
        self.scaler.transform(&mut self.features)?;
        let prediction = self.model.predict(&self.features)?;

        if prediction.confidence >= self.threshold {
            Ok(Some(prediction))
        } else {
            log::trace!(
                "gated {} at {} (threshold {})",
                prediction.label,
                prediction.confidence,
                self.threshold
            );
            Ok(None)
        }
    }
}
