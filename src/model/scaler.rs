//! Z-score feature scaling

use ndarray::{Array1, Array2, Axis};

/// Per-column standardization fit on training rows only
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Compute column means and population standard deviations.
    ///
    /// Constant columns get a std of 1 so they pass through centred.
    pub fn fit(x: &Array2<f64>) -> Self {
        let n_cols = x.ncols();
        if x.nrows() == 0 {
            return StandardScaler {
                mean: Array1::zeros(n_cols),
                std: Array1::ones(n_cols),
            };
        }

        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_cols));
        let std = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });

        StandardScaler { mean, std }
    }

    /// Apply `(x - mean) / std` row-wise
    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut scaled = x.clone();
        for mut row in scaled.rows_mut() {
            row -= &self.mean;
            row /= &self.std;
        }
        scaled
    }
}
