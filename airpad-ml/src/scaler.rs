//! Feature standardization
//!
//! Models are trained on standardized features; inference must apply the
//! exact same per-feature shift and scale or the learned weights are
//! meaningless. The scaler's parameters come from the training run (the
//! training-set mean and standard deviation of each feature) and are
//! loaded alongside the model.

use crate::errors::{MlError, MlResult};
use crate::features::{FeatureVector, MAX_FEATURES};

/// Per-feature `(x - mean) / scale` transform.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: heapless::Vec<f32, MAX_FEATURES>,
    scales: heapless::Vec<f32, MAX_FEATURES>,
}

impl StandardScaler {
    /// Build a scaler from training-run parameters.
    ///
    /// `means` and `scales` must be the same length, and every scale must
    /// be finite and strictly positive; a zero scale would turn one bad
    /// artifact value into NaN features at runtime.
    pub fn new(means: &[f32], scales: &[f32]) -> MlResult<Self> {
        if means.len() != scales.len() {
            return Err(MlError::DimensionMismatch {
                expected: means.len(),
                got: scales.len(),
            });
        }
        if means.iter().any(|m| !m.is_finite()) {
            return Err(MlError::InvalidParameter("scaler mean is not finite"));
        }
        if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(MlError::InvalidParameter(
                "scaler scale must be finite and positive",
            ));
        }

        let means = heapless::Vec::from_slice(means).map_err(|_| MlError::CapacityExceeded)?;
        let scales = heapless::Vec::from_slice(scales).map_err(|_| MlError::CapacityExceeded)?;
        Ok(Self { means, scales })
    }

    /// Scaler that leaves an `arity`-length vector unchanged.
    ///
    /// Stands in when no trained scaler is available, mostly in tests and
    /// examples.
    pub fn identity(arity: usize) -> MlResult<Self> {
        if arity > MAX_FEATURES {
            return Err(MlError::CapacityExceeded);
        }

        let mut means = heapless::Vec::new();
        let mut scales = heapless::Vec::new();
        for _ in 0..arity {
            means.push(0.0).map_err(|_| MlError::CapacityExceeded)?;
            scales.push(1.0).map_err(|_| MlError::CapacityExceeded)?;
        }
        Ok(Self { means, scales })
    }

    /// Number of features this scaler was fit on.
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// Whether the scaler has no parameters.
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Standardize `features` in place.
    pub fn transform(&self, features: &mut FeatureVector) -> MlResult<()> {
        if features.len() != self.means.len() {
            return Err(MlError::DimensionMismatch {
                expected: self.means.len(),
                got: features.len(),
            });
        }

        for (i, x) in features.iter_mut().enumerate() {
            *x = (*x - self.means[i]) / self.scales[i];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(values: &[f32]) -> FeatureVector {
        FeatureVector::from_slice(values).unwrap()
    }

    #[test]
    fn test_transform_known_values() {
        let scaler = StandardScaler::new(&[1.0, 10.0], &[2.0, 5.0]).unwrap();
        let mut features = vector(&[3.0, 0.0]);

        scaler.transform(&mut features).unwrap();
        assert_eq!(features.as_slice(), &[1.0, -2.0]);
    }

    #[test]
    fn test_identity_is_passthrough() {
        let scaler = StandardScaler::identity(3).unwrap();
        let mut features = vector(&[0.5, -2.0, 7.0]);

        scaler.transform(&mut features).unwrap();
        assert_eq!(features.as_slice(), &[0.5, -2.0, 7.0]);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let scaler = StandardScaler::new(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
        let mut features = vector(&[1.0, 2.0, 3.0]);

        match scaler.transform(&mut features) {
            Err(MlError::DimensionMismatch { expected: 2, got: 3 }) => {}
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(StandardScaler::new(&[0.0], &[0.0]).is_err());
        assert!(StandardScaler::new(&[0.0], &[-1.0]).is_err());
        assert!(StandardScaler::new(&[0.0], &[f32::NAN]).is_err());
        assert!(StandardScaler::new(&[f32::INFINITY], &[1.0]).is_err());
        assert!(StandardScaler::new(&[0.0, 0.0], &[1.0]).is_err());
    }
}
