//! Prediction and inference
//!
//! Apply a trained model pair to each driver's latest standings.

pub mod inference;

pub use inference::{format_predictions, Predictor, RunReport};
