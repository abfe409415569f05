//! Feature extraction
//!
//! Converts per-round standings into model-ready rows.

pub mod standings;
pub mod trend;

pub use standings::{FeatureEngineer, FeatureVector, StandingFeatures, Targets, FEATURE_NAMES};
pub use trend::{races_since_last_win, trend};
