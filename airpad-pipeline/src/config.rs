//! Pipeline configuration and gesture-to-key bindings
//!
//! [`PipelineConfig`] is the deserialized shape of the `pipeline` section
//! of the config file plus its `actions` map. It is checked once by
//! [`PipelineConfig::validate`], which turns the free-form map into an
//! [`ActionTable`] indexed by gesture label; after that point nothing in
//! the running pipeline can hit a bad binding.

use std::collections::BTreeMap;

use serde::Deserialize;

use airpad_core::constants::{gating, queues, timing, window};
use airpad_core::GestureLabel;
use airpad_connectors::Key;

use crate::PipelineError;

/// Tuning knobs for the three pipeline stages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum confidence a prediction needs to pass the gate. A
    /// prediction at exactly this value passes.
    pub confidence_threshold: f32,
    /// Samples the sliding window holds once full.
    pub window_capacity: usize,
    /// Samples required before the first prediction is attempted.
    pub window_min_fill: usize,
    /// Consecutive agreeing predictions required to act.
    pub history_length: usize,
    /// Collector-to-predictor queue depth.
    pub sample_queue_capacity: usize,
    /// Predictor-to-actor queue depth.
    pub prediction_queue_capacity: usize,
    /// How long a stage parks on an empty queue or idle socket before
    /// re-checking the stop flag, in milliseconds.
    pub idle_wait_ms: u64,
    /// Gesture name to action binding.
    pub actions: BTreeMap<String, ActionConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut actions = BTreeMap::new();
        actions.insert("jump".into(), ActionConfig::momentary("space"));
        actions.insert("punch".into(), ActionConfig::momentary("f"));
        actions.insert("turn".into(), ActionConfig::momentary("r"));
        actions.insert("walk".into(), ActionConfig::sustained("w"));

        Self {
            confidence_threshold: gating::DEFAULT_CONFIDENCE_THRESHOLD,
            window_capacity: window::DEFAULT_CAPACITY,
            window_min_fill: window::DEFAULT_MIN_FILL,
            history_length: gating::DEFAULT_HISTORY_LENGTH,
            sample_queue_capacity: queues::SAMPLE_CAPACITY,
            prediction_queue_capacity: queues::PREDICTION_CAPACITY,
            idle_wait_ms: timing::DEFAULT_IDLE_WAIT_MS,
            actions,
        }
    }
}

/// One gesture's binding as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    /// Key name, parsed by [`Key::from_name`].
    pub key: String,
    /// Momentary (tap) or sustained (hold).
    #[serde(default)]
    pub kind: ActionKind,
    /// Seconds after firing during which the same gesture is ignored.
    /// Zero disables the cooldown.
    #[serde(default)]
    pub cooldown_s: f64,
}

impl ActionConfig {
    pub(crate) fn momentary(key: &str) -> Self {
        Self {
            key: key.into(),
            kind: ActionKind::Momentary,
            cooldown_s: 0.0,
        }
    }

    fn sustained(key: &str) -> Self {
        Self {
            key: key.into(),
            kind: ActionKind::Sustained,
            cooldown_s: 0.0,
        }
    }
}

/// How a binding delivers its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Tap once when the gesture becomes active.
    #[default]
    Momentary,
    /// Hold the key down until another gesture takes over.
    Sustained,
}

/// A validated binding.
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    /// Key to deliver.
    pub key: Key,
    /// Tap or hold.
    pub kind: ActionKind,
    /// Per-gesture refire suppression, seconds.
    pub cooldown_s: f64,
}

/// Bindings indexed by gesture label.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    entries: [Option<Binding>; GestureLabel::COUNT],
}

impl ActionTable {
    /// The binding for `label`, if the config mapped one.
    pub fn get(&self, label: GestureLabel) -> Option<&Binding> {
        self.entries[label.index()].as_ref()
    }

    /// Number of bound gestures.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether no gesture is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }

    /// Bound gestures in label order.
    pub fn iter(&self) -> impl Iterator<Item = (GestureLabel, &Binding)> {
        GestureLabel::ALL
            .iter()
            .zip(self.entries.iter())
            .filter_map(|(label, entry)| entry.as_ref().map(|b| (*label, b)))
    }
}

impl PipelineConfig {
    /// Check every knob and binding, producing the action table.
    ///
    /// All failures are [`PipelineError::Config`] naming the offending
    /// field; the pipeline refuses to start on any of them.
    pub fn validate(&self) -> Result<ActionTable, PipelineError> {
        if !self.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.confidence_threshold)
        {
            return Err(PipelineError::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }

        if self.window_capacity == 0 || self.window_capacity > window::MAX_CAPACITY {
            return Err(PipelineError::Config(format!(
                "window_capacity must be within [1, {}], got {}",
                window::MAX_CAPACITY,
                self.window_capacity
            )));
        }

        if self.window_min_fill == 0 || self.window_min_fill > self.window_capacity {
            return Err(PipelineError::Config(format!(
                "window_min_fill must be within [1, window_capacity={}], got {}",
                self.window_capacity, self.window_min_fill
            )));
        }

        if self.history_length == 0 || self.history_length > gating::MAX_HISTORY_LENGTH {
            return Err(PipelineError::Config(format!(
                "history_length must be within [1, {}], got {}",
                gating::MAX_HISTORY_LENGTH,
                self.history_length
            )));
        }

        if self.sample_queue_capacity == 0 || self.prediction_queue_capacity == 0 {
            return Err(PipelineError::Config(
                "queue capacities must be at least 1".into(),
            ));
        }

        if self.idle_wait_ms == 0 {
            return Err(PipelineError::Config(
                "idle_wait_ms must be at least 1".into(),
            ));
        }

        let mut entries: [Option<Binding>; GestureLabel::COUNT] = Default::default();
        for (name, action) in &self.actions {
            let label = GestureLabel::from_name(name).ok_or_else(|| {
                PipelineError::Config(format!("unknown gesture {name:?} in actions"))
            })?;

            if label == GestureLabel::Noise {
                return Err(PipelineError::Config(
                    "the noise label is the neutral state and cannot be bound".into(),
                ));
            }

            let key = Key::from_name(&action.key).ok_or_else(|| {
                PipelineError::Config(format!(
                    "unknown key {:?} bound to gesture {name:?}",
                    action.key
                ))
            })?;

            if !action.cooldown_s.is_finite() || action.cooldown_s < 0.0 {
                return Err(PipelineError::Config(format!(
                    "cooldown_s for gesture {name:?} must be finite and non-negative"
                )));
            }

            entries[label.index()] = Some(Binding {
                key,
                kind: action.kind,
                cooldown_s: action.cooldown_s,
            });
        }

        Ok(ActionTable { entries })
    }
}
