//! Evaluation metrics

use ndarray::Array1;
use std::fmt;

/// Held-out performance of a trained model pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Mean absolute error of predicted championship position
    pub position_mae: f64,
    /// Mean absolute error of predicted points gained
    pub points_mae: f64,
    pub training_samples: usize,
    pub test_samples: usize,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position MAE: {:.2} positions | Points MAE: {:.2} points | train={} test={}",
            self.position_mae, self.points_mae, self.training_samples, self.test_samples
        )
    }
}

/// Mean absolute error; 0.0 for empty input
pub fn mean_absolute_error(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    (actual - predicted).mapv(f64::abs).mean().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mae() {
        let actual = array![1.0, 2.0, 3.0];
        let predicted = array![2.0, 2.0, 1.0];
        assert!((mean_absolute_error(&actual, &predicted) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mae_empty() {
        let empty = Array1::<f64>::zeros(0);
        assert_eq!(mean_absolute_error(&empty, &empty), 0.0);
    }

    #[test]
    fn test_display() {
        let metrics = Metrics {
            position_mae: 1.234,
            points_mae: 5.0,
            training_samples: 80,
            test_samples: 20,
        };
        assert_eq!(
            metrics.to_string(),
            "Position MAE: 1.23 positions | Points MAE: 5.00 points | train=80 test=20"
        );
    }
}
