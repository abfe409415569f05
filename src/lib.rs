//! Formula 1 championship prediction
//!
//! Turns per-round driver standings into supervised-learning examples, trains a
//! position/points regressor pair and predicts each driver's next round.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ModelKind;

/// Car number identifying a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverNumber(pub u32);

impl fmt::Display for DriverNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A driver's championship standing after one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRecord {
    pub season: String,
    pub round: u32,
    pub driver_number: DriverNumber,
    pub position: u32,
    pub points: f64,
    pub wins: u32,
}

/// Next-round prediction for one driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub driver_number: DriverNumber,
    pub predicted_position: f64,
    pub predicted_points_gain: f64,
    pub predicted_total_points: f64,
    pub current_position: u32,
    pub current_points: f64,
    pub confidence: f64,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub model_type: String,
}

impl Prediction {
    /// Predicted change in championship position (negative = gaining places)
    pub fn position_delta(&self) -> f64 {
        self.predicted_position - self.current_position as f64
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum F1Error {
    #[error("No training data available: need at least 2 races for one driver")]
    InsufficientData,

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, F1Error>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub training: TrainingConfig,
    pub linear: LinearConfig,
    pub boosting: BoostingConfig,
    pub season: SeasonConfig,
    pub prediction: PredictionConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub model: ModelKind,
    pub test_fraction: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConfig {
    pub n_members: usize,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonConfig {
    /// Assumed number of rounds in a season
    pub season_length: u32,
    /// Number of cars on the grid; upper bound for predicted positions
    pub grid_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    pub confidence_base: f64,
    pub confidence_min: f64,
    pub confidence_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            training: TrainingConfig {
                model: ModelKind::GradientBoosted,
                test_fraction: 0.2,
                seed: 42,
            },
            linear: LinearConfig {
                n_members: 50,
                alpha: 1.0,
            },
            boosting: BoostingConfig {
                n_estimators: 100,
                max_depth: 6,
                learning_rate: 0.1,
                min_samples_leaf: 1,
            },
            season: SeasonConfig::default(),
            prediction: PredictionConfig::default(),
            data: DataConfig {
                database_path: "data/f1cast.db".to_string(),
            },
        }
    }
}

impl Default for SeasonConfig {
    fn default() -> Self {
        SeasonConfig {
            season_length: 23,
            grid_size: 20,
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        PredictionConfig {
            confidence_base: 0.8,
            confidence_min: 0.3,
            confidence_max: 0.9,
        }
    }
}

impl PredictionConfig {
    /// Require `0 <= confidence_min <= confidence_base <= confidence_max <= 1`
    pub fn validate(&self) -> Result<()> {
        let ordered = 0.0 <= self.confidence_min
            && self.confidence_min <= self.confidence_base
            && self.confidence_base <= self.confidence_max
            && self.confidence_max <= 1.0;
        if ordered {
            Ok(())
        } else {
            Err(F1Error::Config(format!(
                "[prediction] needs 0 <= confidence_min <= confidence_base <= confidence_max <= 1, got min={} base={} max={}",
                self.confidence_min, self.confidence_base, self.confidence_max
            )))
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            F1Error::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| F1Error::Config(format!("Failed to parse config: {}", e)))?;
        config.prediction.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| F1Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
