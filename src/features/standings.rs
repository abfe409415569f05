//! Standing-history feature engineering
//!
//! Every row describes a driver's form before a round. Training rows are
//! labelled with the standing reached in that round; the inference row looks
//! one round past the latest known standing.

use super::trend::{races_since_last_win, trend};
use crate::data::history::DriverHistory;
use crate::{DriverNumber, F1Error, Result, SeasonConfig, StandingRecord};

/// Column order of every feature row fed to the regressors
pub const FEATURE_NAMES: [&str; FeatureVector::DIM] = [
    "driver_number",
    "round",
    "last_position",
    "last_2_avg_position",
    "last_3_avg_position",
    "last_5_avg_position",
    "position_trend_3_races",
    "points_trend_3_races",
    "position_std_3_races",
    "position_std_5_races",
    "current_championship_position",
    "current_points",
    "current_wins",
    "season_progress",
    "recent_wins",
    "races_since_last_win",
    "points_per_race_avg",
    "points_per_race_recent",
    "position_change_last_race",
    "best_position_last_5",
    "worst_position_last_5",
];

/// Owned copy of [`FEATURE_NAMES`], as captured by a trained model
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Form features derived from the standings before a round
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandingFeatures {
    // === Recent positions ===
    pub last_position: f64,
    pub last_2_avg_position: f64,
    pub last_3_avg_position: f64,
    pub last_5_avg_position: f64,

    // === Momentum ===
    pub position_trend_3_races: f64,
    pub points_trend_3_races: f64,

    // === Consistency ===
    /// Zero until three rounds exist
    pub position_std_3_races: f64,
    /// Zero until five rounds exist
    pub position_std_5_races: f64,

    // === Championship standing ===
    pub current_championship_position: f64,
    pub current_points: f64,
    pub current_wins: f64,

    pub season_progress: f64,

    // === Wins ===
    pub recent_wins: f64,
    pub races_since_last_win: f64,

    // === Points efficiency ===
    pub points_per_race_avg: f64,
    pub points_per_race_recent: f64,

    pub position_change_last_race: f64,
    pub best_position_last_5: f64,
    pub worst_position_last_5: f64,
}

impl StandingFeatures {
    /// Number of derived features
    pub const DIM: usize = 19;

    /// Compute features from a non-empty, round-ordered history.
    ///
    /// `round` is the round being predicted; it only feeds `season_progress`.
    pub fn from_history(history: &[StandingRecord], round: u32, season_length: u32) -> Option<Self> {
        let last = history.last()?;
        let n = history.len();

        let positions: Vec<f64> = history.iter().map(|r| r.position as f64).collect();
        let points: Vec<f64> = history.iter().map(|r| r.points).collect();
        let wins: Vec<u32> = history.iter().map(|r| r.wins).collect();

        let last_3_positions = tail(&positions, 3);
        let last_5_positions = tail(&positions, 5);

        let position_std_3_races = if n >= 3 { sample_std(last_3_positions) } else { 0.0 };
        let position_std_5_races = if n >= 5 { sample_std(last_5_positions) } else { 0.0 };

        let recent_wins = if n >= 3 {
            let window = tail(&wins, 3);
            let max = window.iter().copied().max().unwrap_or(0);
            let min = window.iter().copied().min().unwrap_or(0);
            (max - min) as f64
        } else {
            0.0
        };

        let points_per_race_recent = if n >= 3 {
            let window = tail(&points, 3);
            (window[window.len() - 1] - window[0]) / 3.0
        } else {
            0.0
        };

        let position_change_last_race = if n >= 2 {
            positions[n - 1] - positions[n - 2]
        } else {
            0.0
        };

        Some(StandingFeatures {
            last_position: last.position as f64,
            last_2_avg_position: mean(tail(&positions, 2)),
            last_3_avg_position: mean(last_3_positions),
            last_5_avg_position: mean(last_5_positions),
            position_trend_3_races: trend(&positions, 3),
            points_trend_3_races: trend(&points, 3),
            position_std_3_races,
            position_std_5_races,
            current_championship_position: last.position as f64,
            current_points: last.points,
            current_wins: last.wins as f64,
            season_progress: round as f64 / season_length as f64,
            recent_wins,
            races_since_last_win: races_since_last_win(&wins) as f64,
            points_per_race_avg: last.points / n as f64,
            points_per_race_recent,
            position_change_last_race,
            best_position_last_5: last_5_positions.iter().copied().fold(f64::INFINITY, f64::min),
            worst_position_last_5: last_5_positions
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
        })
    }

    /// Convert to flat vector (same order as the tail of [`FEATURE_NAMES`])
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.last_position,
            self.last_2_avg_position,
            self.last_3_avg_position,
            self.last_5_avg_position,
            self.position_trend_3_races,
            self.points_trend_3_races,
            self.position_std_3_races,
            self.position_std_5_races,
            self.current_championship_position,
            self.current_points,
            self.current_wins,
            self.season_progress,
            self.recent_wins,
            self.races_since_last_win,
            self.points_per_race_avg,
            self.points_per_race_recent,
            self.position_change_last_race,
            self.best_position_last_5,
            self.worst_position_last_5,
        ]
    }
}

/// Supervised targets for a training row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Targets {
    pub position: f64,
    pub points_gained: f64,
}

/// One model input row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub driver_number: DriverNumber,
    /// Round the row predicts
    pub round: u32,
    pub features: StandingFeatures,
    /// Present on training rows only
    pub targets: Option<Targets>,
}

impl FeatureVector {
    /// Number of model input columns
    pub const DIM: usize = StandingFeatures::DIM + 2;

    /// All columns in [`FEATURE_NAMES`] order
    pub fn to_vec(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(Self::DIM);
        values.push(self.driver_number.0 as f64);
        values.push(self.round as f64);
        values.extend(self.features.to_vec());
        values
    }

    /// Values for the given columns, in the given order
    pub fn values_for(&self, names: &[String]) -> Result<Vec<f64>> {
        let all = self.to_vec();
        names
            .iter()
            .map(|name| {
                FEATURE_NAMES
                    .iter()
                    .position(|n| *n == name.as_str())
                    .map(|i| all[i])
                    .ok_or_else(|| F1Error::SchemaMismatch(format!("unknown feature '{}'", name)))
            })
            .collect()
    }
}

/// Builds training and inference rows from standings
#[derive(Debug, Clone, Copy)]
pub struct FeatureEngineer {
    season_length: u32,
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new(&SeasonConfig::default())
    }
}

impl FeatureEngineer {
    pub fn new(season: &SeasonConfig) -> Self {
        FeatureEngineer {
            season_length: season.season_length.max(1),
        }
    }

    /// One labelled row per driver per round after their first
    pub fn build_training_table(&self, records: &[StandingRecord]) -> Vec<FeatureVector> {
        let mut table = Vec::new();

        for (driver, history) in DriverHistory::group(records) {
            let rows = self.driver_rows(driver, &history);
            log::debug!("{}: {} rounds -> {} rows", driver, history.len(), rows.len());
            table.extend(rows);
        }

        table
    }

    fn driver_rows(&self, driver: DriverNumber, history: &DriverHistory) -> Vec<FeatureVector> {
        let records = history.records();
        (1..records.len())
            .filter_map(|i| {
                let current = &records[i];
                let before = history.before(i);
                let previous = before.last()?;
                let features =
                    StandingFeatures::from_history(before, current.round, self.season_length)?;
                Some(FeatureVector {
                    driver_number: driver,
                    round: current.round,
                    features,
                    targets: Some(Targets {
                        position: current.position as f64,
                        points_gained: current.points - previous.points,
                    }),
                })
            })
            .collect()
    }

    /// Unlabelled row for the round after the latest standing.
    ///
    /// `feature_names` must be exactly the column list captured at training
    /// time; columns are never reordered to make a mismatched list fit.
    pub fn build_inference_features(
        &self,
        history: &DriverHistory,
        feature_names: &[String],
    ) -> Result<FeatureVector> {
        check_schema(feature_names)?;

        let latest = history.latest().ok_or_else(|| {
            F1Error::SchemaMismatch("no standings to compute features from".to_string())
        })?;
        let round = latest.round + 1;
        let features = StandingFeatures::from_history(history.records(), round, self.season_length)
            .ok_or_else(|| {
                F1Error::SchemaMismatch("no standings to compute features from".to_string())
            })?;

        Ok(FeatureVector {
            driver_number: latest.driver_number,
            round,
            features,
            targets: None,
        })
    }
}

/// Require the exact engineered column list
pub fn check_schema(feature_names: &[String]) -> Result<()> {
    if feature_names.len() != FEATURE_NAMES.len() {
        return Err(F1Error::SchemaMismatch(format!(
            "expected {} features, model has {}",
            FEATURE_NAMES.len(),
            feature_names.len()
        )));
    }

    for (i, (expected, actual)) in FEATURE_NAMES.iter().zip(feature_names).enumerate() {
        if *expected != actual.as_str() {
            return Err(F1Error::SchemaMismatch(format!(
                "column {} is '{}', expected '{}'",
                i, actual, expected
            )));
        }
    }

    Ok(())
}

fn tail<T>(values: &[T], k: usize) -> &[T] {
    &values[values.len().saturating_sub(k)..]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with one degree of freedom removed
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(driver: u32, round: u32, position: u32, points: f64, wins: u32) -> StandingRecord {
        StandingRecord {
            season: "2025".to_string(),
            round,
            driver_number: DriverNumber(driver),
            position,
            points,
            wins,
        }
    }

    /// Rounds 1-5 of a driver who wins round 5
    fn sample_driver() -> Vec<StandingRecord> {
        let positions = [5, 4, 6, 3, 2];
        let points = [10.0, 18.0, 18.0, 25.0, 33.0];
        let wins = [0, 0, 0, 0, 1];
        (0..5)
            .map(|i| make_record(4, i as u32 + 1, positions[i], points[i], wins[i]))
            .collect()
    }

    #[test]
    fn test_one_row_per_transition() {
        let engineer = FeatureEngineer::default();
        let mut records = sample_driver();
        records.extend((1..=3).map(|r| make_record(81, r, 1, 25.0 * r as f64, r)));

        let table = engineer.build_training_table(&records);
        let driver_4 = table.iter().filter(|r| r.driver_number == DriverNumber(4)).count();
        let driver_81 = table.iter().filter(|r| r.driver_number == DriverNumber(81)).count();
        assert_eq!(driver_4, 4);
        assert_eq!(driver_81, 2);
        assert!(table.iter().all(|r| r.round >= 2));
    }

    #[test]
    fn test_single_race_drivers_produce_nothing() {
        let engineer = FeatureEngineer::default();
        let records = vec![make_record(1, 1, 1, 25.0, 1), make_record(2, 1, 2, 18.0, 0)];
        assert!(engineer.build_training_table(&records).is_empty());
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let engineer = FeatureEngineer::default();
        let mut records = sample_driver();
        records.reverse();

        let table = engineer.build_training_table(&records);
        let rounds: Vec<u32> = table.iter().map(|r| r.round).collect();
        assert_eq!(rounds, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_round_five_row() {
        let engineer = FeatureEngineer::default();
        let table = engineer.build_training_table(&sample_driver());
        assert_eq!(table.len(), 4);

        let row = table.iter().find(|r| r.round == 5).unwrap();
        let targets = row.targets.unwrap();
        assert_eq!(targets.position, 2.0);
        assert_eq!(targets.points_gained, 8.0);

        // History is rounds 1-4: positions [5,4,6,3], wins all zero
        let f = &row.features;
        assert_eq!(f.last_position, 3.0);
        assert_eq!(f.position_change_last_race, -3.0);
        assert_eq!(f.recent_wins, 0.0);
        assert_eq!(f.races_since_last_win, 4.0);
        assert_eq!(f.current_points, 25.0);
        assert_eq!(f.best_position_last_5, 3.0);
        assert_eq!(f.worst_position_last_5, 6.0);
        assert!((f.last_2_avg_position - 4.5).abs() < 1e-9);
        assert!((f.last_3_avg_position - 13.0 / 3.0).abs() < 1e-9);
        assert!((f.last_5_avg_position - 4.5).abs() < 1e-9);
        assert!((f.points_per_race_avg - 6.25).abs() < 1e-9);
        // (25 - 18) / 3
        assert!((f.points_per_race_recent - 7.0 / 3.0).abs() < 1e-9);
        assert!((f.season_progress - 5.0 / 23.0).abs() < 1e-9);
        // std of [4, 6, 3]
        assert!((f.position_std_3_races - (7.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(f.position_std_5_races, 0.0);
    }

    #[test]
    fn test_short_history_fallbacks() {
        let engineer = FeatureEngineer::default();
        let table = engineer.build_training_table(&sample_driver());
        let row = table.iter().find(|r| r.round == 2).unwrap();
        let f = &row.features;

        assert_eq!(f.last_2_avg_position, 5.0);
        assert_eq!(f.last_5_avg_position, 5.0);
        assert_eq!(f.position_std_3_races, 0.0);
        assert_eq!(f.position_trend_3_races, 0.0);
        assert_eq!(f.recent_wins, 0.0);
        assert_eq!(f.points_per_race_recent, 0.0);
        assert_eq!(f.position_change_last_race, 0.0);
        assert_eq!(f.races_since_last_win, 1.0);
        assert_eq!(row.targets.unwrap().points_gained, 8.0);
    }

    #[test]
    fn test_inference_features_use_whole_history() {
        let engineer = FeatureEngineer::default();
        let history = DriverHistory::new(sample_driver());
        let row = engineer
            .build_inference_features(&history, &feature_names())
            .unwrap();

        assert_eq!(row.round, 6);
        assert!(row.targets.is_none());
        let f = &row.features;
        assert_eq!(f.last_position, 2.0);
        assert_eq!(f.position_change_last_race, -1.0);
        assert_eq!(f.recent_wins, 1.0);
        assert_eq!(f.races_since_last_win, 0.0);
        assert_eq!(f.current_points, 33.0);
        assert!((f.season_progress - 6.0 / 23.0).abs() < 1e-9);
        assert!(f.position_std_5_races > 0.0);
    }

    #[test]
    fn test_inference_column_order() {
        let engineer = FeatureEngineer::default();
        let history = DriverHistory::new(sample_driver());
        let names = feature_names();
        let row = engineer.build_inference_features(&history, &names).unwrap();

        let values = row.values_for(&names).unwrap();
        assert_eq!(values, row.to_vec());
        assert_eq!(values[0], 4.0);
        assert_eq!(values[1], 6.0);
        assert_eq!(values[11], 33.0);
        assert_eq!(row.features.current_points, 33.0);
    }

    #[test]
    fn test_reordered_names_rejected() {
        let engineer = FeatureEngineer::default();
        let history = DriverHistory::new(sample_driver());
        let mut names = feature_names();
        names.swap(2, 3);

        let err = engineer.build_inference_features(&history, &names).unwrap_err();
        assert!(matches!(err, F1Error::SchemaMismatch(_)));
    }

    #[test]
    fn test_missing_or_unknown_names_rejected() {
        let engineer = FeatureEngineer::default();
        let history = DriverHistory::new(sample_driver());

        let mut short = feature_names();
        short.pop();
        assert!(matches!(
            engineer.build_inference_features(&history, &short),
            Err(F1Error::SchemaMismatch(_))
        ));

        let mut renamed = feature_names();
        renamed[5] = "grid_penalty".to_string();
        assert!(matches!(
            engineer.build_inference_features(&history, &renamed),
            Err(F1Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_empty_history_is_schema_mismatch() {
        let engineer = FeatureEngineer::default();
        let err = engineer
            .build_inference_features(&DriverHistory::default(), &feature_names())
            .unwrap_err();
        assert!(matches!(err, F1Error::SchemaMismatch(_)));
    }

    #[test]
    fn test_dim_matches_names() {
        let row = FeatureVector {
            driver_number: DriverNumber(1),
            round: 2,
            features: StandingFeatures::default(),
            targets: None,
        };
        assert_eq!(row.to_vec().len(), FEATURE_NAMES.len());
        assert_eq!(StandingFeatures::default().to_vec().len(), StandingFeatures::DIM);
    }
}
