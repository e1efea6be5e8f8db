//! Inference for the airpad gesture pipeline
//!
//! ## Overview
//!
//! Everything between a full sample window and a labeled prediction lives
//! here:
//!
//! ```text
//! SlidingWindow ──> StatExtractor ──> StandardScaler ──> LinearClassifier
//!   (samples)      (feature vector)    (standardized)    (label, confidence)
//! ```
//!
//! Training is out of scope; models arrive as JSON artifacts produced
//! offline and are loaded once at startup by [`loader`]. The inference
//! path itself is allocation-free: feature vectors and model parameters
//! live in fixed-capacity [`heapless`] buffers, and the float math goes
//! through [`libm`] so the crate stays `no_std`-capable.
//!
//! ## Seams
//!
//! The pipeline is generic over [`FeatureExtractor`] and [`Classifier`],
//! not over concrete types, so stage tests substitute scripted
//! implementations and never need a trained artifact on disk.
//!
//! ## Feature Flags
//!
//! - `std` (default): enables [`loader`] and file-backed artifacts.
//!   Without it the crate still extracts, scales, and classifies; the
//!   parameters just have to come from somewhere else.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod features;
#[cfg(feature = "std")]
pub mod loader;
pub mod model;
pub mod scaler;

pub use errors::{MlError, MlResult};
pub use features::{FeatureExtractor, FeatureSet, FeatureVector, StatExtractor, MAX_FEATURES};
#[cfg(feature = "std")]
pub use loader::{load_model, load_scaler};
pub use model::{Classifier, LinearClassifier, MAX_CLASSES};
pub use scaler::StandardScaler;
