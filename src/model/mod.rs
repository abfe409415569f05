//! Regression models
//!
//! Two interchangeable regressor families behind one capability trait.

pub mod boosted;
pub mod linear;
pub mod scaler;
pub mod tree;

pub use boosted::GradientBoosted;
pub use linear::LinearEnsemble;
pub use scaler::StandardScaler;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Config, Result};

/// Capabilities every regressor family provides
pub trait Regressor: fmt::Debug {
    /// Identifier stored with each prediction
    fn name(&self) -> &'static str;

    /// Whether inputs should be standardized before `fit`/`predict`
    fn wants_scaled_inputs(&self) -> bool;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Relative importance per input column, summing to 1. `None` before fit.
    fn feature_importances(&self) -> Option<Array1<f64>>;
}

/// Regressor family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearEnsemble,
    GradientBoosted,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LinearEnsemble => "linear_ensemble",
            ModelKind::GradientBoosted => "gradient_boosted",
        }
    }

    /// Construct an unfitted regressor with the configured hyperparameters
    pub fn build(&self, config: &Config) -> Box<dyn Regressor> {
        match self {
            ModelKind::LinearEnsemble => Box::new(LinearEnsemble::new(
                config.linear.n_members,
                config.linear.alpha,
                config.training.seed,
            )),
            ModelKind::GradientBoosted => Box::new(GradientBoosted::new(
                config.boosting.n_estimators,
                config.boosting.max_depth,
                config.boosting.learning_rate,
                config.boosting.min_samples_leaf,
            )),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "linear_ensemble" | "linear" => Ok(ModelKind::LinearEnsemble),
            "gradient_boosted" | "boosted" | "gbt" => Ok(ModelKind::GradientBoosted),
            _ => Err(format!(
                "Unknown model: {}. Use linear_ensemble or gradient_boosted.",
                s
            )),
        }
    }
}

/// Normalize non-negative scores so they sum to 1
pub(crate) fn normalize_importances(raw: Array1<f64>) -> Array1<f64> {
    let total = raw.sum();
    if total > 0.0 {
        raw / total
    } else {
        raw
    }
}
