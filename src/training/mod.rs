//! Model training
//!
//! Train/test splitting, fitting of the regressor pair and evaluation.

pub mod metrics;
pub mod split;
pub mod trainer;

pub use metrics::Metrics;
pub use split::{train_test_split, TrainTestSplit};
pub use trainer::{TrainedModelPair, Trainer};
