//! Actor stage: prediction queue to key actions
//!
//! ## Overview
//!
//! The actor turns a stream of per-sample predictions into discrete key
//! actions. Two mechanisms stand between a prediction and a keypress:
//!
//! - **Debounce.** Every accepted label is pushed into a
//!   [`PredictionHistory`]; only a full, unanimous history counts as a
//!   real gesture. A one-sample flicker of "punch" mid-walk presses
//!   nothing.
//! - **The active slot.** One gesture is active at a time, initially
//!   `noise`. A unanimous label equal to the active gesture is ignored,
//!   which is what makes a held streak idempotent: `walk` stays one
//!   press, no matter how long the streak runs.
//!
//! A transition to a new gesture releases the previously held key (if
//! its binding was sustained), delivers the new binding (tap for
//! momentary, press for sustained), and moves the active slot. `noise`
//! has no binding by construction, so a return to rest releases held
//! keys and arms the next gesture.
//!
//! ## Failure Budget
//!
//! A sink failure is logged and tolerated; the transition still
//! completes so the actor's state tracks what the user did, even if the
//! OS missed it. What is not tolerated is a sink that fails every time:
//! after [`SINK_FAILURE_BUDGET`] consecutive failures the actor raises
//! the stop flag and exits with the last error, taking the pipeline
//! down. Any success resets the count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use airpad_connectors::{ActionSink, Key, SinkError};
use airpad_core::constants::actor::SINK_FAILURE_BUDGET;
use airpad_core::{Clock, GestureLabel, Prediction, PredictionHistory, StageQueue, Timestamp};

use crate::config::{ActionKind, ActionTable, Binding, PipelineConfig};
use crate::PipelineError;

/// Third pipeline stage; see the module docs.
pub struct Actor<K: ActionSink, C: Clock> {
    input: Arc<StageQueue<Prediction>>,
    stop: Arc<AtomicBool>,
    sink: K,
    clock: C,
    table: ActionTable,
    history: PredictionHistory,
    active: GestureLabel,
    held: Option<Key>,
    last_fired: [Option<Timestamp>; GestureLabel::COUNT],
    consecutive_failures: u32,
    idle_wait: Duration,
}

impl<K: ActionSink, C: Clock> Actor<K, C> {
    /// Stage over `sink`, draining `input` until `stop` is raised.
    ///
    /// `clock` supplies the timebase for cooldowns.
    pub fn new(
        sink: K,
        clock: C,
        table: ActionTable,
        input: Arc<StageQueue<Prediction>>,
        stop: Arc<AtomicBool>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            input,
            stop,
            sink,
            clock,
            table,
            history: PredictionHistory::new(config.history_length),
            active: GestureLabel::Noise,
            held: None,
            last_fired: [None; GestureLabel::COUNT],
            consecutive_failures: 0,
            idle_wait: Duration::from_millis(config.idle_wait_ms),
        }
    }

    /// Stage name for thread naming and logs.
    pub fn name(&self) -> &'static str {
        "actor"
    }

    /// Currently active gesture.
    pub fn active(&self) -> GestureLabel {
        self.active
    }

    /// Dequeue and act until stopped or the failure budget is spent.
    ///
    /// Whatever the exit path, a held sustained key is released on the
    /// way out so a crash or shutdown never leaves a key stuck down.
    pub fn run(mut self) -> Result<(), PipelineError> {
        log::debug!(
            "actor running ({} bindings via {} sink, history {})",
            self.table.len(),
            self.sink.name(),
            self.history.width()
        );

        let result = self.serve();
        self.release_held_on_exit();
        log::debug!("actor stopped");
        result
    }

    fn serve(&mut self) -> Result<(), PipelineError> {
        while !self.stop.load(Ordering::Relaxed) {
            let Some(prediction) = self.input.pop_timeout(self.idle_wait) else {
                continue;
            };
            self.handle(prediction)?;
        }
        Ok(())
    }

    /// Fold one prediction into the debounce state, acting if it
    /// completes a transition.
    pub fn handle(&mut self, prediction: Prediction) -> Result<(), PipelineError> {
        self.history.push(prediction.label);

        let Some(label) = self.history.unanimous() else {
            return Ok(());
        };
        if label == self.active {
            return Ok(());
        }

        self.transition(label, prediction)
    }

    fn transition(
        &mut self,
        label: GestureLabel,
        prediction: Prediction,
    ) -> Result<(), PipelineError> {
        if self.in_cooldown(label) {
            log::debug!("{label} suppressed by cooldown");
            return Ok(());
        }

        if let Some(held) = self.held.take() {
            log::info!("release {held} ({} superseded by {label})", self.active);
            self.deliver(held, ActionSink::release)?;
        }

        match self.table.get(label).copied() {
            Some(binding) => {
                match binding.kind {
                    ActionKind::Momentary => {
                        log::info!("{label} ({}) -> tap {}", prediction.confidence, binding.key);
                        self.deliver(binding.key, ActionSink::tap)?;
                    }
                    ActionKind::Sustained => {
                        log::info!("{label} ({}) -> hold {}", prediction.confidence, binding.key);
                        self.deliver(binding.key, ActionSink::press)?;
                        self.held = Some(binding.key);
                    }
                }
                self.last_fired[label.index()] = Some(self.clock.now());
            }
            None => {
                log::debug!("{label} is unbound, no action");
            }
        }

        self.active = label;
        Ok(())
    }

    /// Whether `label` fired too recently to fire again.
    ///
    /// While suppressed the active slot does not move, so the gesture
    /// retries on each following unanimous prediction and lands as soon
    /// as the cooldown expires.
    fn in_cooldown(&self, label: GestureLabel) -> bool {
        let Some(binding) = self.table.get(label) else {
            return false;
        };
        if binding.cooldown_s <= 0.0 {
            return false;
        }
        match self.last_fired[label.index()] {
            Some(fired_at) => self.clock.now() - fired_at < binding.cooldown_s,
            None => false,
        }
    }

    /// Send one key event, keeping the consecutive-failure account.
    fn deliver(
        &mut self,
        key: Key,
        send: impl FnOnce(&mut K, Key) -> Result<(), SinkError>,
    ) -> Result<(), PipelineError> {
        match send(&mut self.sink, key) {
            Ok(()) => {
                self.consecutive_failures = 0;
                Ok(())
            }
            Err(err) => {
                self.consecutive_failures += 1;
                log::warn!(
                    "{} sink failed ({}/{}): {err}",
                    self.sink.name(),
                    self.consecutive_failures,
                    SINK_FAILURE_BUDGET
                );

                if self.consecutive_failures >= SINK_FAILURE_BUDGET {
                    log::error!("sink failure budget spent, stopping pipeline");
                    self.stop.store(true, Ordering::Relaxed);
                    return Err(PipelineError::SinkBudgetExhausted {
                        failures: self.consecutive_failures,
                        last: err.to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    fn release_held_on_exit(&mut self) {
        if let Some(key) = self.held.take() {
            match self.sink.release(key) {
                Ok(()) => log::info!("released held {key} on exit"),
                Err(err) => log::warn!("could not release held {key} on exit: {err}"),
            }
        }
    }
}
