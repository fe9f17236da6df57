//! Feature extraction
//!
//! Elo ratings, form windows, team identity codes and the feature vector
//! schema.

pub mod elo;
pub mod encoding;
pub mod team_stats;
pub mod vector;

pub use elo::{EloConfig, EloFeatures, EloRatings};
pub use encoding::TeamEncoder;
pub use team_stats::{
    FormEntry, FormStats, FormWindowEngine, MissingStatPolicy, DEFAULT_FORM_WINDOW,
};
pub use vector::{FeatureVector, FEATURE_COLUMNS};
