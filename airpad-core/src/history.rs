//! Debounce history for predicted gesture labels
//!
//! A single over-threshold prediction is not enough to act on: models
//! flicker at gesture boundaries, and a one-frame spike of "punch" in the
//! middle of a walk must not press a key. The actor therefore feeds every
//! accepted label through a short FIFO and only treats a gesture as real
//! once the last `width` labels all agree.
//!
//! The FIFO reuses the index-wrapped layout of
//! [`SlidingWindow`](crate::window::SlidingWindow) but does not expose
//! ordered iteration; the only question it answers is "do the last
//! `width` labels agree, and on what".

use crate::constants::gating::MAX_HISTORY_LENGTH;
use crate::events::GestureLabel;

/// FIFO of the most recent predicted labels, with a unanimity check.
#[derive(Debug, Clone)]
pub struct PredictionHistory {
    labels: [Option<GestureLabel>; MAX_HISTORY_LENGTH],
    write_pos: usize,
    len: usize,
    /// Agreement width, `1..=MAX_HISTORY_LENGTH`.
    width: usize,
}

impl PredictionHistory {
    /// Empty history requiring `width` consecutive agreeing labels.
    ///
    /// `width` is clamped into `1..=MAX_HISTORY_LENGTH`; a width of 1
    /// makes every label immediately unanimous.
    pub fn new(width: usize) -> Self {
        Self {
            labels: [None; MAX_HISTORY_LENGTH],
            write_pos: 0,
            len: 0,
            width: width.clamp(1, MAX_HISTORY_LENGTH),
        }
    }

    /// Record a label, evicting the oldest if the history is full.
    pub fn push(&mut self, label: GestureLabel) {
        self.labels[self.write_pos] = Some(label);
        self.write_pos = (self.write_pos + 1) % self.width;

        if self.len < self.width {
            self.len += 1;
        }
    }

    /// Number of labels recorded, up to `width`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no labels have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `width` labels have been recorded.
    pub fn is_full(&self) -> bool {
        self.len == self.width
    }

    /// Agreement width this history was built with.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The agreed label, if the history is full and every entry matches.
    ///
    /// Returns `None` while the history is still filling, so a gesture
    /// can never fire off fewer than `width` observations.
    pub fn unanimous(&self) -> Option<GestureLabel> {
        if !self.is_full() {
            return None;
        }

        let first = self.labels[0]?;
        for slot in &self.labels[1..self.width] {
            if *slot != Some(first) {
                return None;
            }
        }

        Some(first)
    }

    /// Forget all recorded labels. Width is unchanged.
    pub fn clear(&mut self) {
        self.labels = [None; MAX_HISTORY_LENGTH];
        self.write_pos = 0;
        self.len = 0;
    }
}
