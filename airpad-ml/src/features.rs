//! Window-to-feature-vector extraction
//!
//! ## Overview
//!
//! The classifier never sees raw samples; it sees a fixed-length vector
//! of statistics computed over the sliding window. This module defines
//! that vector's layout and the extractor that fills it.
//!
//! Extraction is deterministic: the same window contents always produce
//! the same vector, bit for bit. Iteration order is fixed (oldest sample
//! first, kinds and axes in declaration order) and every statistic is a
//! two-pass sum in that order, so there is no accumulation-order
//! nondeterminism to chase when a prediction looks wrong.
//!
//! ## Vector Layout
//!
//! Three nested feature sets share one layout; each set is a strict
//! prefix of the next, so a model trained on `core` reads the first 24
//! slots of a `full` extraction unchanged:
//!
//! ```text
//! core (24):     [accel x,y,z | gyro x,y,z] x [mean, std, min, max]
//! extended (42): core + [accel x,y,z | gyro x,y,z] x [range, rms, crossings]
//! full (56):     extended + [accel mag | gyro mag] x [mean, std, max]
//!                         + [rotation x,y,z,w] x [mean, std]
//! ```
//!
//! A sensor kind with no samples in the window contributes an all-zero
//! block. A phone that only streams its accelerometer still yields a
//! full-length vector; the model's gyro weights simply see zeros.

use airpad_core::constants::window::MAX_CAPACITY;
use airpad_core::{SensorKind, SlidingWindow};
use libm::sqrtf;

use crate::errors::{MlError, MlResult};

/// Largest feature vector any set produces.
pub const MAX_FEATURES: usize = 64;

/// Fixed-capacity feature vector filled by an extractor.
pub type FeatureVector = heapless::Vec<f32, MAX_FEATURES>;

/// Motion kinds that contribute per-axis statistics.
const MOTION_KINDS: [SensorKind; 2] = [SensorKind::Acceleration, SensorKind::Gyroscope];

/// Which slice of the layout an extractor fills.
///
/// Named sets rather than a free arity so model artifacts can state what
/// they were trained on and be checked against the extractor at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSet {
    /// First four moments of every motion axis.
    Core,
    /// `Core` plus range, RMS, and zero-crossing counts.
    Extended,
    /// `Extended` plus magnitude and rotation statistics.
    Full,
}

impl FeatureSet {
    /// Number of features this set produces.
    pub const fn arity(self) -> usize {
        match self {
            FeatureSet::Core => 24,
            FeatureSet::Extended => 42,
            FeatureSet::Full => 56,
        }
    }

    /// Name used in model artifacts.
    pub const fn name(self) -> &'static str {
        match self {
            FeatureSet::Core => "core",
            FeatureSet::Extended => "extended",
            FeatureSet::Full => "full",
        }
    }

    /// Parse an artifact name. Exact lowercase match only.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "core" => Some(FeatureSet::Core),
            "extended" => Some(FeatureSet::Extended),
            "full" => Some(FeatureSet::Full),
            _ => None,
        }
    }
}

/// Turns a sample window into a feature vector.
///
/// Implementations must be deterministic and must always produce exactly
/// `arity()` features for a given configuration.
pub trait FeatureExtractor {
    /// Length of the vectors this extractor produces.
    fn arity(&self) -> usize;

    /// Fill `out` with features computed over `window`.
    ///
    /// `out` is cleared first; on success it holds exactly `arity()`
    /// values.
    fn extract<const N: usize>(
        &self,
        window: &SlidingWindow<N>,
        out: &mut FeatureVector,
    ) -> MlResult<()>;
}

/// Statistical extractor implementing the layout in the module docs.
#[derive(Debug, Clone, Copy)]
pub struct StatExtractor {
    set: FeatureSet,
}

impl StatExtractor {
    /// Extractor for the given feature set.
    pub fn new(set: FeatureSet) -> Self {
        Self { set }
    }

    /// The set this extractor fills.
    pub fn feature_set(&self) -> FeatureSet {
        self.set
    }
}

impl FeatureExtractor for StatExtractor {
    fn arity(&self) -> usize {
        self.set.arity()
    }

    fn extract<const N: usize>(
        &self,
        window: &SlidingWindow<N>,
        out: &mut FeatureVector,
    ) -> MlResult<()> {
        out.clear();

        // Per-axis stats are computed once and reused by the extended
        // block, so the window is walked at most once per axis.
        let mut motion = [[AxisStats::ZERO; 3]; 2];
        for (k, kind) in MOTION_KINDS.iter().enumerate() {
            for (axis, slot) in motion[k].iter_mut().enumerate() {
                let series = axis_series(window, *kind, axis)?;
                *slot = AxisStats::from_series(&series);
            }
        }

        for row in &motion {
            for stats in row {
                push_all(out, &[stats.mean, stats.std, stats.min, stats.max])?;
            }
        }

        if matches!(self.set, FeatureSet::Extended | FeatureSet::Full) {
            for row in &motion {
                for stats in row {
                    push_all(out, &[stats.range, stats.rms, stats.zero_crossings])?;
                }
            }
        }

        if self.set == FeatureSet::Full {
            for kind in MOTION_KINDS {
                let series = magnitude_series(window, kind)?;
                let stats = AxisStats::from_series(&series);
                push_all(out, &[stats.mean, stats.std, stats.max])?;
            }
            for axis in 0..SensorKind::Rotation.component_count() {
                let series = axis_series(window, SensorKind::Rotation, axis)?;
                let stats = AxisStats::from_series(&series);
                push_all(out, &[stats.mean, stats.std])?;
            }
        }

        debug_assert_eq!(out.len(), self.arity());
        Ok(())
    }
}

/// Summary statistics of one value series.
///
/// `ZERO` stands in for an empty series; see the module docs.
#[derive(Debug, Clone, Copy)]
struct AxisStats {
    mean: f32,
    std: f32,
    min: f32,
    max: f32,
    range: f32,
    rms: f32,
    zero_crossings: f32,
}

impl AxisStats {
    const ZERO: Self = Self {
        mean: 0.0,
        std: 0.0,
        min: 0.0,
        max: 0.0,
        range: 0.0,
        rms: 0.0,
        zero_crossings: 0.0,
    };

    /// Two-pass statistics: sums first, then centered moments. Population
    /// variance (divide by n), matching how training pipelines normalize.
    fn from_series(series: &[f32]) -> Self {
        if series.is_empty() {
            return Self::ZERO;
        }

        let n = series.len() as f32;
        let mut sum = 0.0f32;
        let mut sum_sq = 0.0f32;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;

        for &x in series {
            sum += x;
            sum_sq += x * x;
            min = min.min(x);
            max = max.max(x);
        }

        let mean = sum / n;
        let mut var_acc = 0.0f32;
        let mut crossings = 0u32;

        for (i, &x) in series.iter().enumerate() {
            let centered = x - mean;
            var_acc += centered * centered;
            if i > 0 && series[i - 1] * x < 0.0 {
                crossings += 1;
            }
        }

        Self {
            mean,
            std: sqrtf(var_acc / n),
            min,
            max,
            range: max - min,
            rms: sqrtf(sum_sq / n),
            zero_crossings: crossings as f32,
        }
    }
}

/// One axis of one kind, oldest to newest.
fn axis_series<const N: usize>(
    window: &SlidingWindow<N>,
    kind: SensorKind,
    axis: usize,
) -> MlResult<heapless::Vec<f32, MAX_CAPACITY>> {
    let mut series = heapless::Vec::new();
    for sample in window.iter_kind(kind) {
        if let Some(value) = sample.component(axis) {
            series.push(value).map_err(|_| MlError::CapacityExceeded)?;
        }
    }
    Ok(series)
}

/// Euclidean norm of a motion kind's three axes, per sample.
fn magnitude_series<const N: usize>(
    window: &SlidingWindow<N>,
    kind: SensorKind,
) -> MlResult<heapless::Vec<f32, MAX_CAPACITY>> {
    let mut series = heapless::Vec::new();
    for sample in window.iter_kind(kind) {
        let v = sample.values();
        let magnitude = sqrtf(v[0] * v[0] + v[1] * v[1] + v[2] * v[2]);
        series
            .push(magnitude)
            .map_err(|_| MlError::CapacityExceeded)?;
    }
    Ok(series)
}

fn push_all(out: &mut FeatureVector, values: &[f32]) -> MlResult<()> {
    out.extend_from_slice(values)
        .map_err(|_| MlError::CapacityExceeded)
}
