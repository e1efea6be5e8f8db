//! Scripted Recognition Session Example
//!
//! This example runs the full three-stage pipeline without a network or
//! a trained artifact: a scripted source replays a motion session, a
//! hand-built linear model separates energetic windows from calm ones,
//! and recognized gestures land in the logging sink.
//!
//! ## What You'll Learn
//!
//! - Assembling a pipeline from source, inference chain, and sink
//! - How window fill, gating, and debounce shape when actions fire
//! - Reading queue counters to see the data flow
//!
//! ## Session Script
//!
//! ```text
//! calm (noise) ──> energetic burst (jump, taps space) ──> calm again
//! ```
//!
//! ## Running the Example
//!
//! ```bash
//! RUST_LOG=debug cargo run --example 01_scripted_session
//! ```

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use airpad_connectors::{LogSink, SampleSource, SourceError};
use airpad_core::{GestureLabel, MonotonicClock, SensorKind, SensorSample, SourceId};
use airpad_ml::{FeatureSet, LinearClassifier, StandardScaler, StatExtractor};
use airpad_pipeline::{PipelineConfig, PipelineHandle};

/// Samples per second the script simulates.
const SAMPLE_RATE_HZ: f64 = 50.0;

/// Length of each script phase, in samples.
const CALM_SAMPLES: usize = 30;
const BURST_SAMPLES: usize = 40;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("AirPad Scripted Session Example");
    println!("===============================\n");

    // Small window and history so the session stays short while still
    // exercising fill, gating, and debounce.
    let config = PipelineConfig {
        window_capacity: 10,
        window_min_fill: 5,
        history_length: 3,
        idle_wait_ms: 20,
        ..PipelineConfig::default()
    };

    let script = session_script();
    let total = script.len();
    println!("Session script: {CALM_SAMPLES} calm, {BURST_SAMPLES} burst, {CALM_SAMPLES} calm");
    println!("Sample rate: {SAMPLE_RATE_HZ} Hz simulated\n");

    let handle = PipelineHandle::start(
        &config,
        ReplaySource::new(script),
        StatExtractor::new(FeatureSet::Core),
        StandardScaler::identity(FeatureSet::Core.arity()).expect("core arity fits"),
        energy_model(),
        LogSink,
        MonotonicClock::new(),
    )
    .expect("pipeline should start");

    println!("Pipeline running; watch for `tap space` from the sink.\n");

    // Wait for the whole script to drain through the predictor.
    let deadline = Instant::now() + Duration::from_secs(10);
    while handle.stats().samples.popped < total as u64 {
        if Instant::now() >= deadline {
            eprintln!("session did not finish in time");
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }
    // Give the actor a beat to drain the last predictions.
    thread::sleep(Duration::from_millis(100));

    println!("\nSession complete.");
    println!("Queue counters: {}", handle.stats());

    handle.request_stop();
    match handle.shutdown(Duration::from_secs(2)) {
        Ok(()) => println!("Pipeline stopped cleanly."),
        Err(err) => eprintln!("Pipeline stopped with error: {err}"),
    }
}

/// A source that replays a prepared sample list at roughly the script's
/// sample rate, then idles.
struct ReplaySource {
    script: VecDeque<SensorSample>,
    pace: Duration,
}

impl ReplaySource {
    fn new(script: Vec<SensorSample>) -> Self {
        Self {
            script: script.into(),
            pace: Duration::from_secs_f64(0.25 / SAMPLE_RATE_HZ),
        }
    }
}

impl SampleSource for ReplaySource {
    fn recv_sample(&mut self) -> Result<Option<SensorSample>, SourceError> {
        thread::sleep(self.pace);
        Ok(self.script.pop_front())
    }
}

/// Build the calm-burst-calm accelerometer session.
fn session_script() -> Vec<SensorSample> {
    let source = SourceId::new("scripted");
    let dt = 1.0 / SAMPLE_RATE_HZ;
    let mut samples = Vec::new();
    let mut push = |values: [f32; 3]| {
        let t = samples.len() as f64 * dt;
        samples.push(
            SensorSample::new(t, SensorKind::Acceleration, &values, source)
                .expect("script values are finite"),
        );
    };

    // Calm: gravity plus a little tremor.
    for i in 0..CALM_SAMPLES {
        let tremor = (i as f32 * 0.7).sin() * 0.05;
        push([tremor, tremor * 0.5, 9.81 + tremor]);
    }
    // Burst: large swings on every axis, the shape the model keys on.
    for i in 0..BURST_SAMPLES {
        let phase = i as f32 * 0.9;
        push([phase.sin() * 8.0, phase.cos() * 8.0, 9.81 + phase.sin() * 6.0]);
    }
    // Calm again so the stream settles back to noise.
    for i in 0..CALM_SAMPLES {
        let tremor = (i as f32 * 0.7).cos() * 0.05;
        push([tremor, tremor * 0.5, 9.81 + tremor]);
    }

    samples
}

/// A two-class linear model that reads motion energy.
///
/// The jump row weights the accelerometer standard deviations, so calm
/// windows score far below zero and energetic windows far above; the
/// noise row is the zero baseline.
fn energy_model() -> LinearClassifier {
    let arity = FeatureSet::Core.arity();
    let mut jump_row = vec![0.0f32; arity];
    // Core layout: four stats per axis, std is the second slot.
    for axis in 0..3 {
        jump_row[axis * 4 + 1] = 0.5;
    }
    let noise_row = vec![0.0f32; arity];

    let mut weights = jump_row;
    weights.extend_from_slice(&noise_row);

    LinearClassifier::new(
        &[GestureLabel::Jump, GestureLabel::Noise],
        arity,
        &weights,
        &[-4.0, 0.0],
    )
    .expect("model shapes line up")
}
