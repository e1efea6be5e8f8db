//! Model artifact loading
//!
//! ## Artifact Format
//!
//! Training happens offline; what ships to the device is a pair of JSON
//! files. The model file:
//!
//! ```json
//! {
//!     "classes": ["jump", "punch", "turn", "walk", "noise"],
//!     "feature_set": "core",
//!     "weights": [[0.1, -0.3, ...], ...],
//!     "bias": [0.2, -0.1, 0.0, 0.4, -0.5]
//! }
//! ```
//!
//! `weights` holds one row per class, each row `feature_set.arity()`
//! coefficients long. The scaler file uses the training framework's
//! parameter names:
//!
//! ```json
//! {
//!     "mean": [0.01, 9.78, ...],
//!     "scale": [0.42, 1.91, ...]
//! }
//! ```
//!
//! ## Validation
//!
//! Everything is checked at load time: class names must be known gesture
//! labels, the feature set must be a known layout, and every shape is
//! verified against it. A model that loads successfully cannot fail a
//! shape check later, so loading is the place where a bad artifact is a
//! hard error.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use airpad_core::GestureLabel;

use crate::errors::{MlError, MlResult};
use crate::features::FeatureSet;
use crate::model::LinearClassifier;
use crate::scaler::StandardScaler;

#[derive(Debug, Deserialize)]
struct ModelFile {
    classes: Vec<String>,
    feature_set: String,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ScalerFile {
    mean: Vec<f32>,
    scale: Vec<f32>,
}

/// Load and validate a classifier artifact.
///
/// Returns the classifier together with the feature set it was trained
/// on, so the caller can build a matching extractor.
pub fn load_model(path: &Path) -> MlResult<(LinearClassifier, FeatureSet)> {
    let text = fs::read_to_string(path)?;
    let file: ModelFile = serde_json::from_str(&text)?;

    let set = FeatureSet::from_name(&file.feature_set).ok_or_else(|| {
        MlError::Artifact(format!("unknown feature set {:?}", file.feature_set))
    })?;

    let mut classes = Vec::with_capacity(file.classes.len());
    for name in &file.classes {
        let label = GestureLabel::from_name(name)
            .ok_or_else(|| MlError::Artifact(format!("unknown class label {name:?}")))?;
        classes.push(label);
    }

    if file.weights.len() != classes.len() {
        return Err(MlError::Artifact(format!(
            "model has {} weight rows for {} classes",
            file.weights.len(),
            classes.len()
        )));
    }

    let arity = set.arity();
    let mut flat = Vec::with_capacity(classes.len() * arity);
    for (row_idx, row) in file.weights.iter().enumerate() {
        if row.len() != arity {
            return Err(MlError::Artifact(format!(
                "weight row {} has {} coefficients, feature set {:?} needs {}",
                row_idx,
                row.len(),
                set.name(),
                arity
            )));
        }
        flat.extend_from_slice(row);
    }

    let model = LinearClassifier::new(&classes, arity, &flat, &file.bias)?;
    Ok((model, set))
}

/// Load and validate a scaler artifact.
pub fn load_scaler(path: &Path) -> MlResult<StandardScaler> {
    let text = fs::read_to_string(path)?;
    let file: ScalerFile = serde_json::from_str(&text)?;
    StandardScaler::new(&file.mean, &file.scale)
}
