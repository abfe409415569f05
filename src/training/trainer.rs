//! Fitting the position/points regressor pair

use ndarray::{Array1, Array2, Axis};

use crate::features::standings::{feature_names, FeatureEngineer, FeatureVector};
use crate::model::{ModelKind, Regressor, StandardScaler};
use crate::training::metrics::{mean_absolute_error, Metrics};
use crate::training::split::train_test_split;
use crate::{Config, F1Error, Result, StandingRecord};

/// Everything one training run produces that prediction needs.
///
/// Owned by a single run and passed explicitly to the predictor.
#[derive(Debug)]
pub struct TrainedModelPair {
    kind: ModelKind,
    position_model: Box<dyn Regressor>,
    points_model: Box<dyn Regressor>,
    scaler: StandardScaler,
    feature_names: Vec<String>,
}

impl TrainedModelPair {
    pub fn new(
        kind: ModelKind,
        position_model: Box<dyn Regressor>,
        points_model: Box<dyn Regressor>,
        scaler: StandardScaler,
        feature_names: Vec<String>,
    ) -> Self {
        TrainedModelPair {
            kind,
            position_model,
            points_model,
            scaler,
            feature_names,
        }
    }

    /// Column order used at fit time
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[cfg(test)]
    pub(crate) fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Regressor family identifier stored with each prediction
    pub fn model_type(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Raw (position, points gained) outputs for each row of `x`
    pub fn predict_matrix(&self, x: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        if x.ncols() != self.feature_names.len() {
            return Err(F1Error::SchemaMismatch(format!(
                "model expects {} columns, got {}",
                self.feature_names.len(),
                x.ncols()
            )));
        }

        let position = predict_with(self.position_model.as_ref(), &self.scaler, x)?;
        let points = predict_with(self.points_model.as_ref(), &self.scaler, x)?;
        Ok((position, points))
    }

    /// Raw outputs for a single row already in `feature_names` order
    pub fn predict_row(&self, values: &[f64]) -> Result<(f64, f64)> {
        let x = Array2::from_shape_vec((1, values.len()), values.to_vec())
            .map_err(|e| F1Error::SchemaMismatch(e.to_string()))?;
        let (position, points) = self.predict_matrix(&x)?;
        Ok((position[0], points[0]))
    }

    /// Most important inputs of the position model, highest first
    pub fn top_features(&self, k: usize) -> Vec<(String, f64)> {
        let Some(importances) = self.position_model.feature_importances() else {
            return Vec::new();
        };

        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

fn predict_with(model: &dyn Regressor, scaler: &StandardScaler, x: &Array2<f64>) -> Result<Array1<f64>> {
    if model.wants_scaled_inputs() {
        model.predict(&scaler.transform(x))
    } else {
        model.predict(x)
    }
}

fn fit_with(
    model: &mut dyn Regressor,
    scaler: &StandardScaler,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<()> {
    if model.wants_scaled_inputs() {
        model.fit(&scaler.transform(x), y)
    } else {
        model.fit(x, y)
    }
}

/// Trains a regressor pair from raw standings
pub struct Trainer {
    config: Config,
    engineer: FeatureEngineer,
}

impl Trainer {
    pub fn new(config: Config) -> Self {
        let engineer = FeatureEngineer::new(&config.season);
        Trainer { config, engineer }
    }

    /// Engineer features, split, fit both regressors and evaluate.
    pub fn train(
        &self,
        records: &[StandingRecord],
        kind: ModelKind,
    ) -> Result<(TrainedModelPair, Metrics)> {
        log::info!("Preparing features from {} standings...", records.len());
        let table = self.engineer.build_training_table(records);
        let (x, y_position, y_points) = to_arrays(&table)?;

        let names = feature_names();
        log::info!(
            "Training on {} race predictions with {} features",
            x.nrows(),
            names.len()
        );

        let split = train_test_split(x.nrows(), self.config.training.test_fraction, self.config.training.seed);
        let x_train = x.select(Axis(0), &split.train);
        let x_test = x.select(Axis(0), &split.test);

        let scaler = StandardScaler::fit(&x_train);

        let mut position_model = kind.build(&self.config);
        log::info!("Training {} position model...", position_model.name());
        fit_with(
            position_model.as_mut(),
            &scaler,
            &x_train,
            &y_position.select(Axis(0), &split.train),
        )?;

        log::info!("Training {} points model...", kind);
        let mut points_model = kind.build(&self.config);
        fit_with(
            points_model.as_mut(),
            &scaler,
            &x_train,
            &y_points.select(Axis(0), &split.train),
        )?;

        let pair = TrainedModelPair::new(kind, position_model, points_model, scaler, names);

        let (position_pred, points_pred) = if split.test.is_empty() {
            (Array1::zeros(0), Array1::zeros(0))
        } else {
            pair.predict_matrix(&x_test)?
        };

        let metrics = Metrics {
            position_mae: mean_absolute_error(&y_position.select(Axis(0), &split.test), &position_pred),
            points_mae: mean_absolute_error(&y_points.select(Axis(0), &split.test), &points_pred),
            training_samples: split.train.len(),
            test_samples: split.test.len(),
        };

        log::info!("{}", metrics);
        for (name, importance) in pair.top_features(10) {
            log::info!("  {}: {:.3}", name, importance);
        }

        Ok((pair, metrics))
    }
}

/// Feature matrix plus both target vectors
fn to_arrays(table: &[FeatureVector]) -> Result<(Array2<f64>, Array1<f64>, Array1<f64>)> {
    let labelled: Vec<_> = table
        .iter()
        .filter_map(|row| row.targets.map(|t| (row.to_vec(), t)))
        .collect();

    if labelled.is_empty() {
        return Err(F1Error::InsufficientData);
    }

    let n = labelled.len();
    let values: Vec<f64> = labelled.iter().flat_map(|(v, _)| v.iter().copied()).collect();
    let x = Array2::from_shape_vec((n, FeatureVector::DIM), values)
        .map_err(|e| F1Error::Model(e.to_string()))?;
    let y_position = labelled.iter().map(|(_, t)| t.position).collect();
    let y_points = labelled.iter().map(|(_, t)| t.points_gained).collect();

    Ok((x, y_position, y_points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FEATURE_NAMES;
    use crate::DriverNumber;

    /// Synthetic season where finishing order rotates every round
    fn synthetic_season(drivers: u32, rounds: u32) -> Vec<StandingRecord> {
        let mut records = Vec::new();
        for d in 1..=drivers {
            let mut points = 0.0;
            let mut wins = 0;
            for r in 1..=rounds {
                let position = ((d + r) % drivers) + 1;
                points += (drivers - position + 1) as f64 * 2.0;
                if position == 1 {
                    wins += 1;
                }
                records.push(StandingRecord {
                    season: "2025".to_string(),
                    round: r,
                    driver_number: DriverNumber(d),
                    position,
                    points,
                    wins,
                });
            }
        }
        records
    }

    #[test]
    fn test_train_both_kinds() {
        let records = synthetic_season(6, 8);
        let trainer = Trainer::new(Config::default());

        for kind in [ModelKind::LinearEnsemble, ModelKind::GradientBoosted] {
            let (pair, metrics) = trainer.train(&records, kind).unwrap();
            // 6 drivers x 7 transitions
            assert_eq!(metrics.training_samples + metrics.test_samples, 42);
            assert_eq!(metrics.test_samples, 9);
            assert!(metrics.position_mae.is_finite());
            assert!(metrics.points_mae.is_finite());
            assert_eq!(pair.kind(), kind);
            assert_eq!(pair.model_type(), kind.as_str());
        }
    }

    #[test]
    fn test_feature_names_captured_in_order() {
        let records = synthetic_season(4, 5);
        let trainer = Trainer::new(Config::default());
        let (pair, _) = trainer.train(&records, ModelKind::GradientBoosted).unwrap();

        let expected: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        assert_eq!(pair.feature_names(), expected.as_slice());
        assert_eq!(pair.scaler().mean.len(), FEATURE_NAMES.len());
    }

    #[test]
    fn test_scaler_fit_on_training_rows_only() {
        let records = synthetic_season(6, 8);
        let config = Config::default();
        let trainer = Trainer::new(config.clone());
        let (pair, _) = trainer.train(&records, ModelKind::LinearEnsemble).unwrap();

        let table = trainer.engineer.build_training_table(&records);
        let (x, _, _) = to_arrays(&table).unwrap();
        let split = train_test_split(x.nrows(), config.training.test_fraction, config.training.seed);
        let train_means = x.select(Axis(0), &split.train).mean_axis(Axis(0)).unwrap();
        let full_means = x.mean_axis(Axis(0)).unwrap();

        let fitted = &pair.scaler().mean;
        assert!(fitted
            .iter()
            .zip(train_means.iter())
            .all(|(a, b)| (a - b).abs() < 1e-9));
        assert!(fitted
            .iter()
            .zip(full_means.iter())
            .any(|(a, b)| (a - b).abs() > 1e-9));
    }

    #[test]
    fn test_insufficient_data() {
        let records = vec![StandingRecord {
            season: "2025".to_string(),
            round: 1,
            driver_number: DriverNumber(1),
            position: 1,
            points: 25.0,
            wins: 1,
        }];
        let trainer = Trainer::new(Config::default());
        let err = trainer.train(&records, ModelKind::LinearEnsemble).unwrap_err();
        assert!(matches!(err, F1Error::InsufficientData));

        let err = trainer.train(&[], ModelKind::GradientBoosted).unwrap_err();
        assert!(matches!(err, F1Error::InsufficientData));
    }

    #[test]
    fn test_training_is_reproducible() {
        let records = synthetic_season(5, 6);
        let trainer = Trainer::new(Config::default());
        let (_, first) = trainer.train(&records, ModelKind::LinearEnsemble).unwrap();
        let (_, second) = trainer.train(&records, ModelKind::LinearEnsemble).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_top_features_ranked() {
        let records = synthetic_season(6, 8);
        let trainer = Trainer::new(Config::default());
        let (pair, _) = trainer.train(&records, ModelKind::GradientBoosted).unwrap();

        let top = pair.top_features(5);
        assert_eq!(top.len(), 5);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_wrong_width_rejected() {
        let records = synthetic_season(4, 5);
        let trainer = Trainer::new(Config::default());
        let (pair, _) = trainer.train(&records, ModelKind::GradientBoosted).unwrap();
        assert!(matches!(
            pair.predict_row(&[1.0, 2.0]),
            Err(F1Error::SchemaMismatch(_))
        ));
    }
}
