//! Inference-time features
//!
//! Featurize upcoming fixtures for the outcome classifier.

pub mod inference;

pub use inference::{format_features, LiveFeatureBuilder, LiveFeatures};
