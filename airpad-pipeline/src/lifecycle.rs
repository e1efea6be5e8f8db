//! Pipeline assembly, startup, and bounded shutdown
//!
//! ## Startup
//!
//! [`PipelineHandle::start`] is the single entry point. It validates the
//! configuration and the inference chain before any thread exists, so
//! every startup failure arrives as an `Err` from one call site with
//! nothing to clean up. On success three OS threads are running, named
//! after their stages, sharing two queues and one stop flag.
//!
//! ```text
//!             ┌───────────┐      ┌───────────┐      ┌───────────┐
//!   source -> │ collector │ ---> │ predictor │ ---> │   actor   │ -> sink
//!             └───────────┘  ▲   └───────────┘  ▲   └───────────┘
//!                            │                  │
//!                      sample queue      prediction queue
//! ```
//!
//! ## Shutdown
//!
//! Stops are cooperative: anyone may raise the shared stop flag (the
//! operator via [`PipelineHandle::request_stop`], or a stage hitting a
//! fatal error). Every stage re-checks the flag at least once per idle
//! wait, so the whole pipeline unwinds within roughly one wait of the
//! flag going up. [`PipelineHandle::shutdown`] then joins each thread
//! under a deadline; a thread that fails to stop in time is reported and
//! abandoned rather than waited on forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use airpad_connectors::{ActionSink, SampleSource};
use airpad_core::{
    Clock, OverflowPolicy, Prediction, QueueStatsSnapshot, SensorSample, StageQueue,
};
use airpad_ml::{Classifier, FeatureExtractor, StandardScaler};

use crate::actor::Actor;
use crate::collector::Collector;
use crate::config::PipelineConfig;
use crate::predictor::Predictor;
use crate::PipelineError;

/// How often `shutdown` polls a thread that has not finished yet.
const JOIN_POLL: Duration = Duration::from_millis(10);

struct StageThread {
    name: &'static str,
    handle: JoinHandle<Result<(), PipelineError>>,
}

/// Queue counters for both stage boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    /// Collector-to-predictor queue.
    pub samples: QueueStatsSnapshot,
    /// Predictor-to-actor queue.
    pub predictions: QueueStatsSnapshot,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "samples in={} out={} dropped={} peak={} | predictions in={} out={} dropped={} peak={}",
            self.samples.pushed,
            self.samples.popped,
            self.samples.dropped,
            self.samples.max_depth,
            self.predictions.pushed,
            self.predictions.popped,
            self.predictions.dropped,
            self.predictions.max_depth,
        )
    }
}

/// A running pipeline: three stage threads and the means to stop them.
pub struct PipelineHandle {
    stop: Arc<AtomicBool>,
    sample_queue: Arc<StageQueue<SensorSample>>,
    prediction_queue: Arc<StageQueue<Prediction>>,
    threads: Vec<StageThread>,
}

impl PipelineHandle {
    /// Validate everything, then spawn the three stage threads.
    ///
    /// `clock` is the actor's cooldown timebase. Fails without side
    /// effects on bad configuration or a mismatched inference chain; may
    /// fail with threads already stopping if the OS refuses a spawn.
    pub fn start<S, E, M, K, C>(
        config: &PipelineConfig,
        source: S,
        extractor: E,
        scaler: StandardScaler,
        model: M,
        sink: K,
        clock: C,
    ) -> Result<Self, PipelineError>
    where
        S: SampleSource + Send + 'static,
        E: FeatureExtractor + Send + 'static,
        M: Classifier + Send + 'static,
        K: ActionSink + Send + 'static,
        C: Clock + Send + 'static,
    {
        let table = config.validate()?;

        let stop = Arc::new(AtomicBool::new(false));
        let sample_queue = Arc::new(StageQueue::new(
            config.sample_queue_capacity,
            OverflowPolicy::DropOldest,
        ));
        // Both queues shed the oldest entry under pressure: a fresher
        // sample or verdict always supersedes a stale one.
        let prediction_queue = Arc::new(StageQueue::new(
            config.prediction_queue_capacity,
            OverflowPolicy::DropOldest,
        ));

        let collector = Collector::new(source, Arc::clone(&sample_queue), Arc::clone(&stop));
        let predictor = Predictor::new(
            extractor,
            scaler,
            model,
            Arc::clone(&sample_queue),
            Arc::clone(&prediction_queue),
            Arc::clone(&stop),
            config,
        )?;
        let actor = Actor::new(
            sink,
            clock,
            table,
            Arc::clone(&prediction_queue),
            Arc::clone(&stop),
            config,
        );

        let mut handle = Self {
            stop,
            sample_queue,
            prediction_queue,
            threads: Vec::with_capacity(3),
        };

        handle.spawn(collector.name(), move || collector.run())?;
        handle.spawn(predictor.name(), move || predictor.run())?;
        handle.spawn(actor.name(), move || actor.run())?;

        log::info!("pipeline started (3 stage threads)");
        Ok(handle)
    }

    /// Spawn one named stage thread. On failure the stop flag goes up so
    /// any already-running stages unwind on their next idle beat.
    fn spawn<F>(&mut self, name: &'static str, body: F) -> Result<(), PipelineError>
    where
        F: FnOnce() -> Result<(), PipelineError> + Send + 'static,
    {
        match thread::Builder::new().name(name.into()).spawn(body) {
            Ok(handle) => {
                self.threads.push(StageThread { name, handle });
                Ok(())
            }
            Err(source) => {
                self.stop.store(true, Ordering::Relaxed);
                Err(PipelineError::Spawn { stage: name, source })
            }
        }
    }

    /// Raise the stop flag without waiting.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// A clone of the stop flag, for wiring into signal handlers.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Whether any stage thread is still running.
    pub fn is_running(&self) -> bool {
        self.threads.iter().any(|t| !t.handle.is_finished())
    }

    /// Current queue counters.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            samples: self.sample_queue.stats(),
            predictions: self.prediction_queue.stats(),
        }
    }

    /// Stop the pipeline and join every stage within `timeout`.
    ///
    /// Returns the first stage failure in pipeline order, so a collector
    /// transport error outranks the downstream noise it caused. A stage
    /// that outlives the deadline is logged, reported as a
    /// [`PipelineError::JoinTimeout`], and abandoned.
    pub fn shutdown(self, timeout: Duration) -> Result<(), PipelineError> {
        self.stop.store(true, Ordering::Relaxed);
        let deadline = Instant::now() + timeout;

        let mut first_error: Option<PipelineError> = None;
        for stage in self.threads {
            if !wait_finished(&stage.handle, deadline) {
                log::error!("{} thread did not stop within {:?}", stage.name, timeout);
                first_error.get_or_insert(PipelineError::JoinTimeout {
                    stage: stage.name,
                    timeout_ms: timeout.as_millis() as u64,
                });
                continue;
            }

            match stage.handle.join() {
                Ok(Ok(())) => log::debug!("{} thread joined", stage.name),
                Ok(Err(err)) => {
                    log::error!("{} thread exited with error: {err}", stage.name);
                    first_error.get_or_insert(err);
                }
                Err(_) => {
                    log::error!("{} thread panicked", stage.name);
                    first_error.get_or_insert(PipelineError::StagePanicked { stage: stage.name });
                }
            }
        }

        match first_error {
            None => {
                log::info!("pipeline stopped");
                Ok(())
            }
            Some(err) => Err(err),
        }
    }
}

fn wait_finished(
    handle: &JoinHandle<Result<(), PipelineError>>,
    deadline: Instant,
) -> bool {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(JOIN_POLL);
    }
    true
}
