//! Message types that flow between the pipeline stages
//!
//! ## Overview
//!
//! Three types cross thread boundaries in this system and all of them are
//! defined here:
//!
//! ```text
//! UDP datagram --decode--> SensorSample --window--> (features) --classify-->
//!     Prediction --history--> action
//! ```
//!
//! - [`SensorSample`]: one decoded sensor reading. Validated at
//!   construction and immutable afterwards, so every consumer can trust
//!   the component count and finiteness without re-checking.
//! - [`Prediction`]: one gated classifier output, a label plus a
//!   [`Confidence`].
//! - [`GestureLabel`]: the closed set of classes the pipeline knows.
//!
//! All of them are `Copy`. A sample is at most a timestamp, four floats,
//! a discriminant, and a 16-byte source id; passing them by value through
//! queues is cheaper than any sharing scheme and removes lifetime
//! questions between threads.
//!
//! ## Confidence representation
//!
//! Confidence is stored fixed-point (u16 over [0, 1]) rather than as a
//! raw `f32`. The gate `confidence >= threshold` must behave identically
//! on every run, including when a classifier returns exactly the
//! configured threshold; quantizing both sides to the same 1/65535 grid
//! makes the comparison exact and total (no NaN case).

use crate::constants::sample::{MAX_COMPONENTS, SOURCE_ID_BYTES};
use crate::errors::SampleError;
use crate::time::Timestamp;

// ============================================================================
// SensorKind
// ============================================================================

/// Which physical sensor a sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Linear acceleration, gravity removed. Three components, m/s².
    Acceleration,
    /// Angular velocity. Three components, rad/s.
    Gyroscope,
    /// Orientation as a unit quaternion. Four components.
    Rotation,
}

impl SensorKind {
    /// Every kind, in the canonical order feature extraction uses.
    pub const ALL: [SensorKind; 3] = [
        SensorKind::Acceleration,
        SensorKind::Gyroscope,
        SensorKind::Rotation,
    ];

    /// Component count a sample of this kind must carry.
    pub const fn component_count(self) -> usize {
        match self {
            SensorKind::Acceleration | SensorKind::Gyroscope => 3,
            SensorKind::Rotation => 4,
        }
    }

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            SensorKind::Acceleration => "acceleration",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Rotation => "rotation",
        }
    }
}

// ============================================================================
// SourceId
// ============================================================================

/// Identifier of the physical sensor stream a sample belongs to.
///
/// Stored inline (no heap) so samples stay `Copy`. Longer identifiers are
/// truncated at a character boundary; 15 bytes comfortably holds a device
/// name or an IPv4 address, which is what the collector stamps here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceId {
    len: u8,
    data: [u8; SOURCE_ID_BYTES],
}

impl SourceId {
    /// Build from a string, truncating to the inline capacity.
    pub fn new(s: &str) -> Self {
        let mut end = s.len().min(SOURCE_ID_BYTES);
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut data = [0u8; SOURCE_ID_BYTES];
        data[..end].copy_from_slice(&s.as_bytes()[..end]);
        Self {
            len: end as u8,
            data,
        }
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        // Construction only ever copies in whole characters.
        core::str::from_utf8(&self.data[..self.len as usize]).unwrap_or("")
    }

    /// Inline capacity in bytes.
    pub const fn capacity() -> usize {
        SOURCE_ID_BYTES
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl core::fmt::Display for SourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SensorSample
// ============================================================================

/// One decoded sensor reading.
///
/// Constructed by the collector from a datagram and never mutated after.
/// [`SensorSample::new`] enforces the two invariants every downstream
/// stage relies on: the component count matches the kind, and every
/// component (and the timestamp) is finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Capture time in seconds. Monotonic or wall clock depending on the
    /// source; the pipeline only ever compares timestamps from the same
    /// stream.
    pub timestamp: Timestamp,
    /// Which sensor produced the reading.
    pub kind: SensorKind,
    /// Which physical stream it arrived on.
    pub source: SourceId,
    values: [f32; MAX_COMPONENTS],
}

impl SensorSample {
    /// Validate and construct a sample.
    pub fn new(
        timestamp: Timestamp,
        kind: SensorKind,
        values: &[f32],
        source: SourceId,
    ) -> Result<Self, SampleError> {
        if !timestamp.is_finite() || timestamp < 0.0 {
            return Err(SampleError::BadTimestamp);
        }
        let expected = kind.component_count();
        if values.len() != expected {
            return Err(SampleError::ComponentMismatch {
                kind,
                expected,
                got: values.len(),
            });
        }
        let mut stored = [0.0f32; MAX_COMPONENTS];
        for (axis, &v) in values.iter().enumerate() {
            if !v.is_finite() {
                return Err(SampleError::NonFinite { kind, axis });
            }
            stored[axis] = v;
        }
        Ok(Self {
            timestamp,
            kind,
            source,
            values: stored,
        })
    }

    /// The components, sliced to the kind's arity.
    pub fn values(&self) -> &[f32] {
        &self.values[..self.kind.component_count()]
    }

    /// One component by axis index, if the kind has that many.
    pub fn component(&self, axis: usize) -> Option<f32> {
        self.values().get(axis).copied()
    }
}

// ============================================================================
// GestureLabel
// ============================================================================

/// The closed set of gesture classes the classifier can emit.
///
/// `Noise` is the neutral class: it is a real classifier output (most
/// windows are nothing), carries no action binding, and is what a stable
/// stream settles on between gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    /// A quick upward jerk.
    Jump,
    /// A forward strike.
    Punch,
    /// A wrist twist.
    Turn,
    /// A sustained swing cadence.
    Walk,
    /// None of the above.
    Noise,
}

impl GestureLabel {
    /// Number of classes.
    pub const COUNT: usize = 5;

    /// Every label, in declaration order.
    pub const ALL: [GestureLabel; Self::COUNT] = [
        GestureLabel::Jump,
        GestureLabel::Punch,
        GestureLabel::Turn,
        GestureLabel::Walk,
        GestureLabel::Noise,
    ];

    /// Canonical lowercase name, as used in model artifacts and config.
    pub const fn name(self) -> &'static str {
        match self {
            GestureLabel::Jump => "jump",
            GestureLabel::Punch => "punch",
            GestureLabel::Turn => "turn",
            GestureLabel::Walk => "walk",
            GestureLabel::Noise => "noise",
        }
    }

    /// Parse a canonical name. Unknown names are `None`, which callers
    /// treat as a configuration or artifact error.
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.name() == s)
    }

    /// Stable index for table lookups.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Confidence
// ============================================================================

/// Classifier confidence in [0, 1], stored fixed-point.
///
/// 0 maps to no confidence, 65535 to full confidence. `from_float` clamps
/// (NaN collapses to zero), so a `Confidence` is always in range and the
/// derived ordering is total. Gate comparisons use `>=` on this type, so
/// a prediction at exactly the configured threshold passes, consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Confidence {
    value: u16,
}

impl Confidence {
    /// No confidence.
    pub const ZERO: Self = Self { value: 0 };

    /// Full confidence.
    pub const FULL: Self = Self { value: u16::MAX };

    /// Quantize a float into [0, 1]. Out-of-range values clamp; NaN
    /// becomes zero.
    pub fn from_float(confidence: f32) -> Self {
        let clamped = confidence.max(0.0).min(1.0);
        Self {
            value: (clamped * u16::MAX as f32) as u16,
        }
    }

    /// Back to a float in [0, 1].
    pub fn as_float(&self) -> f32 {
        self.value as f32 / u16::MAX as f32
    }

    /// Raw fixed-point value.
    pub fn value(&self) -> u16 {
        self.value
    }
}

impl core::fmt::Display for Confidence {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.3}", self.as_float())
    }
}

// ============================================================================
// Prediction
// ============================================================================

/// One gated classifier output, on its way to the actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class.
    pub label: GestureLabel,
    /// How sure the classifier was.
    pub confidence: Confidence,
}

impl Prediction {
    /// Bundle a label with its confidence.
    pub fn new(label: GestureLabel, confidence: Confidence) -> Self {
        Self { label, confidence }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceId {
        SourceId::new("test")
    }

    #[test]
    fn sample_arity_is_enforced() {
        let ok = SensorSample::new(1.0, SensorKind::Acceleration, &[0.1, 0.2, 0.3], source());
        assert!(ok.is_ok());

        let short = SensorSample::new(1.0, SensorKind::Rotation, &[0.1, 0.2, 0.3], source());
        assert_eq!(
            short.unwrap_err(),
            SampleError::ComponentMismatch {
                kind: SensorKind::Rotation,
                expected: 4,
                got: 3,
            }
        );

        let long = SensorSample::new(1.0, SensorKind::Gyroscope, &[0.0; 4], source());
        assert!(matches!(
            long.unwrap_err(),
            SampleError::ComponentMismatch { got: 4, .. }
        ));
    }

    #[test]
    fn sample_rejects_non_finite_values() {
        let nan = SensorSample::new(1.0, SensorKind::Gyroscope, &[0.0, f32::NAN, 0.0], source());
        assert_eq!(
            nan.unwrap_err(),
            SampleError::NonFinite {
                kind: SensorKind::Gyroscope,
                axis: 1,
            }
        );

        let inf = SensorSample::new(
            1.0,
            SensorKind::Acceleration,
            &[f32::INFINITY, 0.0, 0.0],
            source(),
        );
        assert!(matches!(inf.unwrap_err(), SampleError::NonFinite { axis: 0, .. }));
    }

    #[test]
    fn sample_rejects_bad_timestamps() {
        for bad in [f64::NAN, f64::INFINITY, -0.5] {
            let result =
                SensorSample::new(bad, SensorKind::Acceleration, &[0.0, 0.0, 0.0], source());
            assert_eq!(result.unwrap_err(), SampleError::BadTimestamp);
        }
    }

    #[test]
    fn sample_values_slice_matches_kind() {
        let accel =
            SensorSample::new(1.0, SensorKind::Acceleration, &[1.0, 2.0, 3.0], source()).unwrap();
        assert_eq!(accel.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(accel.component(2), Some(3.0));
        assert_eq!(accel.component(3), None);

        let rot =
            SensorSample::new(1.0, SensorKind::Rotation, &[0.0, 0.0, 0.0, 1.0], source()).unwrap();
        assert_eq!(rot.values().len(), 4);
        assert_eq!(rot.component(3), Some(1.0));
    }

    #[test]
    fn source_id_truncates_at_char_boundary() {
        let short = SourceId::new("phone");
        assert_eq!(short.as_str(), "phone");

        let exact = SourceId::new("123456789012345");
        assert_eq!(exact.as_str(), "123456789012345");

        let long = SourceId::new("123456789012345678");
        assert_eq!(long.as_str(), "123456789012345");

        // Multi-byte character straddling the cutoff is dropped whole.
        let accented = SourceId::new("12345678901234é");
        assert_eq!(accented.as_str(), "12345678901234");
    }

    #[test]
    fn label_names_round_trip() {
        for label in GestureLabel::ALL {
            assert_eq!(GestureLabel::from_name(label.name()), Some(label));
        }
        assert_eq!(GestureLabel::from_name("sprint"), None);
        assert_eq!(GestureLabel::from_name("Jump"), None);
    }

    #[test]
    fn confidence_clamps_and_orders() {
        assert_eq!(Confidence::from_float(-0.5), Confidence::ZERO);
        assert_eq!(Confidence::from_float(1.5), Confidence::FULL);
        assert_eq!(Confidence::from_float(f32::NAN), Confidence::ZERO);

        let low = Confidence::from_float(0.3);
        let high = Confidence::from_float(0.9);
        assert!(low < high);
        assert!((high.as_float() - 0.9).abs() < 0.001);
    }

    #[test]
    fn confidence_boundary_is_exact() {
        // The gating property relies on equal floats quantizing equally.
        let threshold = Confidence::from_float(0.7);
        let at_threshold = Confidence::from_float(0.7);
        assert!(at_threshold >= threshold);
        assert_eq!(at_threshold, threshold);
    }
}
