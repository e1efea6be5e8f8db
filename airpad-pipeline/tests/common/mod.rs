//! Shared doubles and builders for the pipeline integration tests
//!
//! Everything here runs the real stage code against scripted edges:
//! - [`ScriptedSource`] replays a fixed sequence of source outcomes
//! - [`RecordingSink`] captures every key action for later assertion
//! - [`ConstModel`] makes the classifier verdict deterministic
//!
//! Helpers stay oblivious to which test uses them, so some go unused in
//! any given binary.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use airpad_connectors::{ActionSink, Key, SampleSource, SinkError, SourceError};
use airpad_core::{Confidence, GestureLabel, Prediction, SensorKind, SensorSample, SourceId};
use airpad_ml::{Classifier, MlError, MlResult};
use airpad_pipeline::PipelineConfig;

/// How long scripted sources park once their script is exhausted.
const SCRIPT_IDLE: Duration = Duration::from_millis(5);

/// How often [`wait_until`] re-checks its condition.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

// ===== SOURCE =====

/// A [`SampleSource`] that replays a prepared script.
///
/// Once the script runs out it settles into idle beats (`Ok(None)` after
/// a short sleep), the same shape a quiet socket produces, so the
/// collector keeps re-checking its stop flag instead of spinning.
pub struct ScriptedSource {
    script: VecDeque<Result<Option<SensorSample>, SourceError>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Option<SensorSample>, SourceError>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// A script that delivers `samples` in order, then idles forever.
    pub fn from_samples(samples: Vec<SensorSample>) -> Self {
        Self::new(samples.into_iter().map(|s| Ok(Some(s))).collect())
    }
}

impl SampleSource for ScriptedSource {
    fn recv_sample(&mut self) -> Result<Option<SensorSample>, SourceError> {
        match self.script.pop_front() {
            Some(step) => step,
            None => {
                thread::sleep(SCRIPT_IDLE);
                Ok(None)
            }
        }
    }
}

/// A decode failure as the UDP source would report one.
pub fn decode_error(reason: &str) -> SourceError {
    SourceError::Decode {
        reason: reason.into(),
    }
}

/// A transport failure as the UDP source would report one.
pub fn transport_error(message: &str) -> SourceError {
    SourceError::Io(std::io::Error::other(message.to_string()))
}

// ===== SINK =====

/// One captured sink invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Press(Key),
    Release(Key),
    Tap(Key),
}

/// An [`ActionSink`] that records every call into a shared log.
///
/// The log handle survives the sink moving into the actor thread, so
/// tests clone it before starting the pipeline and assert on it after.
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A handle onto the call log.
    pub fn log(&self) -> Arc<Mutex<Vec<SinkCall>>> {
        Arc::clone(&self.calls)
    }
}

impl ActionSink for RecordingSink {
    fn press(&mut self, key: Key) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push(SinkCall::Press(key));
        Ok(())
    }

    fn release(&mut self, key: Key) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push(SinkCall::Release(key));
        Ok(())
    }

    fn tap(&mut self, key: Key) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push(SinkCall::Tap(key));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ===== MODEL =====

/// A [`Classifier`] that always answers with the same verdict.
///
/// Keeps the window and feature path real while pinning the label the
/// actor sees, which is what debounce and binding tests care about.
pub struct ConstModel {
    n_features: usize,
    label: GestureLabel,
    confidence: f32,
}

impl ConstModel {
    pub fn new(n_features: usize, label: GestureLabel, confidence: f32) -> Self {
        Self {
            n_features,
            label,
            confidence,
        }
    }
}

impl Classifier for ConstModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f32]) -> MlResult<Prediction> {
        if features.len() != self.n_features {
            return Err(MlError::DimensionMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        Ok(Prediction::new(
            self.label,
            Confidence::from_float(self.confidence),
        ))
    }
}

// ===== SAMPLE BUILDERS =====

/// One accelerometer reading at `t` seconds with a deterministic shape.
pub fn accel_sample(index: usize, t: f64) -> SensorSample {
    let phase = index as f32 * 0.37;
    SensorSample::new(
        t,
        SensorKind::Acceleration,
        &[phase.sin() * 4.0, phase.cos() * 4.0, 9.81 + phase.sin()],
        SourceId::new("scripted"),
    )
    .unwrap()
}

/// `count` accelerometer samples spaced `dt` seconds apart.
pub fn accel_burst(count: usize, start_t: f64, dt: f64) -> Vec<SensorSample> {
    (0..count)
        .map(|i| accel_sample(i, start_t + i as f64 * dt))
        .collect()
}

// ===== CONFIG =====

/// A pipeline configuration sized for fast tests.
///
/// Small window and short idle waits keep every test well under a
/// second; the bindings and threshold are the defaults.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        window_capacity: 10,
        window_min_fill: 5,
        history_length: 3,
        idle_wait_ms: 20,
        ..PipelineConfig::default()
    }
}

// ===== TIMING =====

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}
