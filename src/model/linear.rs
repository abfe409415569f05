//! Bagged ridge regression
//!
//! Each member is an ordinary least-squares fit (linfa-linear) on a bootstrap
//! resample whose design is centred and stacked with `sqrt(alpha) * I`, which
//! is the ridge solution with an unpenalized intercept. The ensemble averages
//! member coefficients.

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{concatenate, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{normalize_importances, Regressor};
use crate::{F1Error, Result};

/// Smallest ridge penalty; keeps the normal equations positive definite
const MIN_ALPHA: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct LinearEnsemble {
    n_members: usize,
    alpha: f64,
    seed: u64,
    coef: Option<Array1<f64>>,
    intercept: f64,
    /// Mean absolute member coefficient per column
    abs_coef: Option<Array1<f64>>,
}

impl LinearEnsemble {
    pub fn new(n_members: usize, alpha: f64, seed: u64) -> Self {
        LinearEnsemble {
            n_members: n_members.max(1),
            alpha: alpha.max(MIN_ALPHA),
            seed,
            coef: None,
            intercept: 0.0,
            abs_coef: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coef.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Ridge fit of one resample, returning (coefficients, intercept)
    fn fit_member(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(Array1<f64>, f64)> {
        let p = x.ncols();
        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| F1Error::Model("empty resample".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);

        let x_centred = x - &x_mean;
        let y_centred = y - y_mean;

        let penalty = Array2::<f64>::eye(p) * self.alpha.sqrt();
        let design = concatenate(Axis(0), &[x_centred.view(), penalty.view()])
            .map_err(|e| F1Error::Model(format!("ridge design: {}", e)))?;
        let response = concatenate(Axis(0), &[y_centred.view(), Array1::zeros(p).view()])
            .map_err(|e| F1Error::Model(format!("ridge response: {}", e)))?;

        let fitted = LinearRegression::new()
            .with_intercept(false)
            .fit(&Dataset::new(design, response))
            .map_err(|e| F1Error::Model(format!("linear fit failed: {}", e)))?;

        let coef = fitted.params().to_owned();
        let intercept = y_mean - coef.dot(&x_mean);
        Ok((coef, intercept))
    }
}

impl Regressor for LinearEnsemble {
    fn name(&self) -> &'static str {
        "linear_ensemble"
    }

    fn wants_scaled_inputs(&self) -> bool {
        true
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(F1Error::Model(format!(
                "cannot fit linear ensemble on {} rows and {} targets",
                n,
                y.len()
            )));
        }

        let p = x.ncols();
        let mut coef_sum = Array1::<f64>::zeros(p);
        let mut abs_sum = Array1::<f64>::zeros(p);
        let mut intercept_sum = 0.0;

        let mut rng = StdRng::seed_from_u64(self.seed);
        for _ in 0..self.n_members {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let x_boot = x.select(Axis(0), &sample);
            let y_boot = y.select(Axis(0), &sample);

            let (coef, intercept) = self.fit_member(&x_boot, &y_boot)?;
            abs_sum += &coef.mapv(f64::abs);
            coef_sum += &coef;
            intercept_sum += intercept;
        }

        let m = self.n_members as f64;
        self.coef = Some(coef_sum / m);
        self.intercept = intercept_sum / m;
        self.abs_coef = Some(abs_sum / m);

        log::debug!(
            "Fitted {} ridge members (alpha {}), intercept {:.4}",
            self.n_members,
            self.alpha,
            self.intercept
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coef = self
            .coef
            .as_ref()
            .ok_or_else(|| F1Error::Model("linear ensemble is not fitted".to_string()))?;
        if x.ncols() != coef.len() {
            return Err(F1Error::Model(format!(
                "expected {} columns, got {}",
                coef.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(coef) + self.intercept)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.abs_coef.clone().map(normalize_importances)
    }
}
