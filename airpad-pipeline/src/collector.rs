//! Collector stage: source to sample queue
//!
//! The collector owns the pipeline's only ingress. Its loop is shaped
//! around one rule: never be away from the source longer than one idle
//! wait. Handing a sample downstream is a non-blocking push, so a slow
//! predictor costs the collector nothing; the sample queue's overflow
//! policy decides what is lost.
//!
//! A payload that fails to decode is logged and forgotten. A transport
//! failure is different: the socket is gone, nothing more will ever
//! arrive, so the collector raises the stop flag and reports the error
//! as its exit status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use airpad_connectors::{SampleSource, SourceError};
use airpad_core::{SensorSample, StageQueue};

use crate::PipelineError;

/// First pipeline stage; see the module docs.
pub struct Collector<S: SampleSource> {
    source: S,
    output: Arc<StageQueue<SensorSample>>,
    stop: Arc<AtomicBool>,
}

impl<S: SampleSource> Collector<S> {
    /// Stage over `source`, feeding `output` until `stop` is raised.
    pub fn new(
        source: S,
        output: Arc<StageQueue<SensorSample>>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            output,
            stop,
        }
    }

    /// Stage name for thread naming and logs.
    pub fn name(&self) -> &'static str {
        "collector"
    }

    /// Receive until stopped or the source fails.
    ///
    /// Returns `Ok` after a requested stop; returns the source error
    /// after raising the stop flag itself on transport failure.
    pub fn run(mut self) -> Result<(), PipelineError> {
        log::debug!("collector running");

        while !self.stop.load(Ordering::Relaxed) {
            match self.source.recv_sample() {
                Ok(Some(sample)) => {
                    self.output.push(sample);
                }
                // Idle beat; loop around and re-check the stop flag.
                Ok(None) => {}
                Err(SourceError::Decode { reason }) => {
                    log::warn!("dropping malformed datagram: {reason}");
                }
                Err(err) => {
                    log::error!("sample source failed, stopping pipeline: {err}");
                    self.stop.store(true, Ordering::Relaxed);
                    return Err(err.into());
                }
            }
        }

        log::debug!("collector stopped");
        Ok(())
    }
}
