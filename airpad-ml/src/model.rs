//! Gesture classification
//!
//! ## Overview
//!
//! Inference is a multinomial logistic regression: one weight row and one
//! bias per gesture class, softmax over the class scores, argmax wins.
//! The interesting machinery lives in training (which happens offline, in
//! whatever framework produced the artifact); at runtime the model is a
//! few hundred multiply-adds with no allocation.
//!
//! The [`Classifier`] trait is the seam the pipeline is generic over, so
//! tests drive the predictor stage with scripted classifiers instead of
//! trained weights.
//!
//! ## Numerical Notes
//!
//! Softmax subtracts the maximum score before exponentiating, so scores
//! of any magnitude stay in `expf`'s safe range. Ties on the maximum go
//! to the lowest class index, which keeps argmax deterministic.

use airpad_core::{Confidence, GestureLabel, Prediction};
use libm::expf;

use crate::errors::{MlError, MlResult};
use crate::features::MAX_FEATURES;

/// Most classes a model may declare.
pub const MAX_CLASSES: usize = 8;

/// Produces a labeled, confidence-scored prediction from a feature vector.
pub trait Classifier {
    /// Feature vector length this model was trained on.
    fn n_features(&self) -> usize;

    /// Classify one feature vector.
    ///
    /// Fails with [`MlError::DimensionMismatch`] if `features` is not
    /// exactly `n_features` long.
    fn predict(&self, features: &[f32]) -> MlResult<Prediction>;
}

/// Multinomial logistic regression over gesture labels.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: heapless::Vec<GestureLabel, MAX_CLASSES>,
    n_features: usize,
    /// Flat row-major weights, one `n_features` row per class.
    weights: heapless::Vec<f32, { MAX_CLASSES * MAX_FEATURES }>,
    bias: heapless::Vec<f32, MAX_CLASSES>,
}

impl LinearClassifier {
    /// Build a classifier from trained parameters.
    ///
    /// `weights` is row-major with one row of `n_features` coefficients
    /// per class, in class order. All shapes are checked here so the
    /// inference path can index without further validation.
    pub fn new(
        classes: &[GestureLabel],
        n_features: usize,
        weights: &[f32],
        bias: &[f32],
    ) -> MlResult<Self> {
        if classes.is_empty() {
            return Err(MlError::InvalidParameter("classifier needs classes"));
        }
        if classes.len() > MAX_CLASSES {
            return Err(MlError::CapacityExceeded);
        }
        for (i, class) in classes.iter().enumerate() {
            if classes[..i].contains(class) {
                return Err(MlError::InvalidParameter("duplicate class label"));
            }
        }

        let expected_weights = classes.len() * n_features;
        if weights.len() != expected_weights {
            return Err(MlError::DimensionMismatch {
                expected: expected_weights,
                got: weights.len(),
            });
        }
        if bias.len() != classes.len() {
            return Err(MlError::DimensionMismatch {
                expected: classes.len(),
                got: bias.len(),
            });
        }
        if weights.iter().chain(bias.iter()).any(|w| !w.is_finite()) {
            return Err(MlError::InvalidParameter("non-finite model parameter"));
        }

        Ok(Self {
            classes: heapless::Vec::from_slice(classes).map_err(|_| MlError::CapacityExceeded)?,
            n_features,
            weights: heapless::Vec::from_slice(weights).map_err(|_| MlError::CapacityExceeded)?,
            bias: heapless::Vec::from_slice(bias).map_err(|_| MlError::CapacityExceeded)?,
        })
    }

    /// Labels this model can emit, in weight-row order.
    pub fn classes(&self) -> &[GestureLabel] {
        &self.classes
    }

    fn score(&self, class: usize, features: &[f32]) -> f32 {
        let row = &self.weights[class * self.n_features..(class + 1) * self.n_features];
        let dot: f32 = row.iter().zip(features).map(|(w, x)| w * x).sum();
        self.bias[class] + dot
    }
}

impl Classifier for LinearClassifier {
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

        let mut scores = heapless::Vec::<f32, MAX_CLASSES>::new();
        for class in 0..self.classes.len() {
            scores
                .push(self.score(class, features))
                .map_err(|_| MlError::CapacityExceeded)?;
        }

        let max_score = scores.iter().fold(f32::NEG_INFINITY, |m, &s| m.max(s));

        let mut best = 0;
        let mut exp_sum = 0.0f32;
        for (class, &score) in scores.iter().enumerate() {
            exp_sum += expf(score - max_score);
            if score > scores[best] {
                best = class;
            }
        }

        let probability = expf(scores[best] - max_score) / exp_sum;
        Ok(Prediction::new(
            self.classes[best],
            Confidence::from_float(probability),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GestureLabel::{Jump, Noise, Punch};

    /// Two classes, one feature: positive input favors Jump.
    fn two_class_model() -> LinearClassifier {
        LinearClassifier::new(&[Jump, Noise], 1, &[4.0, -4.0], &[0.0, 0.0]).unwrap()
    }

    #[test]
    fn test_predict_prefers_strongest_class() {
        let model = two_class_model();

        let up = model.predict(&[1.0]).unwrap();
        assert_eq!(up.label, Jump);
        assert!(up.confidence.as_float() > 0.9);

        let down = model.predict(&[-1.0]).unwrap();
        assert_eq!(down.label, Noise);
    }

    #[test]
    fn test_confidence_tracks_margin() {
        let model = two_class_model();

        let weak = model.predict(&[0.1]).unwrap();
        let strong = model.predict(&[2.0]).unwrap();

        assert_eq!(weak.label, Jump);
        assert_eq!(strong.label, Jump);
        assert!(strong.confidence > weak.confidence);
    }

    #[test]
    fn test_tie_takes_first_class() {
        let model =
            LinearClassifier::new(&[Punch, Jump], 2, &[1.0, 1.0, 1.0, 1.0], &[0.0, 0.0]).unwrap();

        let prediction = model.predict(&[0.3, 0.7]).unwrap();
        assert_eq!(prediction.label, Punch);
        // Even split over two classes.
        assert!((prediction.confidence.as_float() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_single_class_is_certain() {
        let model = LinearClassifier::new(&[Noise], 2, &[0.0, 0.0], &[0.0]).unwrap();
        let prediction = model.predict(&[5.0, -5.0]).unwrap();

        assert_eq!(prediction.label, Noise);
        assert_eq!(prediction.confidence, Confidence::FULL);
    }

    #[test]
    fn test_large_scores_do_not_overflow() {
        let model = LinearClassifier::new(&[Jump, Noise], 1, &[500.0, -500.0], &[0.0, 0.0])
            .unwrap();

        let prediction = model.predict(&[1.0]).unwrap();
        assert_eq!(prediction.label, Jump);
        assert!(prediction.confidence.as_float().is_finite());
        assert!(prediction.confidence.as_float() > 0.99);
    }

    #[test]
    fn test_input_length_is_checked() {
        let model = two_class_model();
        match model.predict(&[1.0, 2.0]) {
            Err(MlError::DimensionMismatch { expected: 1, got: 2 }) => {}
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_construction_validates_shapes() {
        assert!(LinearClassifier::new(&[], 1, &[], &[]).is_err());
        assert!(LinearClassifier::new(&[Jump], 2, &[1.0], &[0.0]).is_err());
        assert!(LinearClassifier::new(&[Jump], 1, &[1.0], &[]).is_err());
        assert!(LinearClassifier::new(&[Jump, Jump], 1, &[1.0, 1.0], &[0.0, 0.0]).is_err());
        assert!(LinearClassifier::new(&[Jump], 1, &[f32::NAN], &[0.0]).is_err());
    }
}
