//! Next-round predictions from a trained model pair

use chrono::Utc;

use crate::data::history::DriverHistory;
use crate::features::FeatureEngineer;
use crate::training::TrainedModelPair;
use crate::{Config, DriverNumber, F1Error, Prediction, PredictionConfig, Result, SeasonConfig, StandingRecord};

/// Outcome counts of a batch prediction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Drivers without any standings
    pub skipped: usize,
    pub failed: usize,
}

/// Turns driver histories into bounded predictions
pub struct Predictor {
    engineer: FeatureEngineer,
    season: SeasonConfig,
    settings: PredictionConfig,
}

impl Predictor {
    pub fn new(config: &Config) -> Self {
        Predictor {
            engineer: FeatureEngineer::new(&config.season),
            season: config.season.clone(),
            settings: config.prediction.clone(),
        }
    }

    /// Predict the round after the latest standing in `history`.
    ///
    /// An empty history yields `Ok(None)`.
    pub fn predict(
        &self,
        models: &TrainedModelPair,
        history: &DriverHistory,
    ) -> Result<Option<Prediction>> {
        let Some(latest) = history.latest() else {
            return Ok(None);
        };

        let row = self
            .engineer
            .build_inference_features(history, models.feature_names())?;
        let values = row.values_for(models.feature_names())?;
        let (raw_position, raw_points_gain) = models.predict_row(&values)?;

        let predicted_position = clamp_position(raw_position, self.season.grid_size);
        let predicted_points_gain = clamp_points_gain(raw_points_gain);

        log::debug!(
            "{}: raw position {:.2} -> {:.2}, raw gain {:.2} -> {:.2}",
            latest.driver_number,
            raw_position,
            predicted_position,
            raw_points_gain,
            predicted_points_gain
        );

        Ok(Some(Prediction {
            driver_number: latest.driver_number,
            predicted_position: round1(predicted_position),
            predicted_points_gain: round1(predicted_points_gain),
            predicted_total_points: round1(latest.points + predicted_points_gain),
            current_position: latest.position,
            current_points: latest.points,
            confidence: self.confidence(),
            generated_at: Utc::now().to_rfc3339(),
            model_type: models.model_type().to_string(),
        }))
    }

    /// Predict one driver out of a mixed record stream
    pub fn predict_driver(
        &self,
        models: &TrainedModelPair,
        records: &[StandingRecord],
        driver: DriverNumber,
    ) -> Result<Option<Prediction>> {
        self.predict(models, &DriverHistory::for_driver(records, driver))
    }

    /// Predict every driver in `drivers`.
    ///
    /// Failures are logged per driver and never stop the batch.
    pub fn run(
        &self,
        models: &TrainedModelPair,
        records: &[StandingRecord],
        drivers: &[DriverNumber],
    ) -> (Vec<Prediction>, RunReport) {
        let histories = DriverHistory::group(records);
        let mut predictions = Vec::new();
        let mut report = RunReport::default();

        for driver in drivers {
            report.attempted += 1;
            let history = histories.get(driver).cloned().unwrap_or_default();

            match self.predict(models, &history) {
                Ok(Some(prediction)) => {
                    report.succeeded += 1;
                    predictions.push(prediction);
                }
                Ok(None) => {
                    report.skipped += 1;
                    log::warn!("No standings for driver {}", driver);
                }
                Err(e @ F1Error::SchemaMismatch(_)) => {
                    report.failed += 1;
                    log::error!("Error predicting for driver {}: {}", driver, e);
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!("Prediction failed for driver {}: {}", driver, e);
                }
            }
        }

        log::info!(
            "Predicted {}/{} drivers ({} without data, {} failed)",
            report.succeeded,
            report.attempted,
            report.skipped,
            report.failed
        );

        (predictions, report)
    }

    /// Placeholder heuristic, not a calibrated probability.
    ///
    /// Always within `[0, 1]`, even for bounds that were never validated.
    fn confidence(&self) -> f64 {
        let bounded = self
            .settings
            .confidence_base
            .max(self.settings.confidence_min)
            .min(self.settings.confidence_max);
        if bounded.is_nan() {
            0.0
        } else {
            bounded.clamp(0.0, 1.0)
        }
    }
}

/// Bound a raw position to the grid
pub fn clamp_position(raw: f64, grid_size: u32) -> f64 {
    raw.clamp(1.0, grid_size.max(1) as f64)
}

/// Negative points gains are not possible
pub fn clamp_points_gain(raw: f64) -> f64 {
    raw.max(0.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Format predictions as a table for display
pub fn format_predictions(predictions: &[Prediction]) -> String {
    let mut out = String::new();
    out.push_str("┌────────┬─────────┬───────────┬────────┬──────────┬──────────┬────────────┐\n");
    out.push_str("│ Driver │ Current │ Predicted │ Change │   Points │     Gain │ Confidence │\n");
    out.push_str("├────────┼─────────┼───────────┼────────┼──────────┼──────────┼────────────┤\n");
    for p in predictions {
        out.push_str(&format!(
            "│ {:>6} │ {:>7} │ {:>9.1} │ {:>+6.1} │ {:>8.1} │ {:>+8.1} │ {:>9.0}% │\n",
            p.driver_number.to_string(),
            p.current_position,
            p.predicted_position,
            p.position_delta(),
            p.predicted_total_points,
            p.predicted_points_gain,
            p.confidence * 100.0
        ));
    }
    out.push_str("└────────┴─────────┴───────────┴────────┴──────────┴──────────┴────────────┘\n");
    out
}
