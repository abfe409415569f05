//! Gradient-boosted regression trees (squared-error loss)

use ndarray::{Array1, Array2};

use super::tree::{RegressionTree, TreeParams};
use super::{normalize_importances, Regressor};
use crate::{F1Error, Result};

#[derive(Debug, Clone)]
pub struct GradientBoosted {
    n_estimators: usize,
    learning_rate: f64,
    tree_params: TreeParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
    importances: Option<Array1<f64>>,
}

impl GradientBoosted {
    pub fn new(
        n_estimators: usize,
        max_depth: usize,
        learning_rate: f64,
        min_samples_leaf: usize,
    ) -> Self {
        GradientBoosted {
            n_estimators,
            learning_rate,
            tree_params: TreeParams {
                max_depth,
                min_samples_leaf,
            },
            base_score: 0.0,
            trees: Vec::new(),
            importances: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoosted {
    fn name(&self) -> &'static str {
        "gradient_boosted"
    }

    fn wants_scaled_inputs(&self) -> bool {
        false
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(F1Error::Model(format!(
                "cannot fit boosted trees on {} rows and {} targets",
                x.nrows(),
                y.len()
            )));
        }

        let n = x.nrows();
        self.base_score = y.mean().unwrap_or(0.0);
        self.trees.clear();

        let mut raw_importances = Array1::zeros(x.ncols());
        let mut predictions = Array1::from_elem(n, self.base_score);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = y
                .iter()
                .zip(predictions.iter())
                .map(|(target, pred)| target - pred)
                .collect();

            let tree = RegressionTree::fit(
                x,
                &residuals,
                (0..n).collect(),
                self.tree_params,
                &mut raw_importances,
            );

            for (i, row) in x.rows().into_iter().enumerate() {
                predictions[i] += self.learning_rate * tree.predict_row(row);
            }
            self.trees.push(tree);
        }

        log::debug!(
            "Boosted {} trees (depth <= {}), train MSE {:.4}",
            self.trees.len(),
            self.tree_params.max_depth,
            (y - &predictions).mapv(|e| e * e).mean().unwrap_or(0.0)
        );

        self.importances = Some(normalize_importances(raw_importances));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let importances = self
            .importances
            .as_ref()
            .ok_or_else(|| F1Error::Model("gradient boosted model is not fitted".to_string()))?;
        if x.ncols() != importances.len() {
            return Err(F1Error::Model(format!(
                "expected {} columns, got {}",
                importances.len(),
                x.ncols()
            )));
        }

        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                self.base_score
                    + self
                        .trees
                        .iter()
                        .map(|t| self.learning_rate * t.predict_row(row))
                        .sum::<f64>()
            })
            .collect())
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.importances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_nonlinear_target() {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { 0.0 });
        let y = Array1::from_shape_fn(40, |i| if i < 20 { 3.0 } else { 15.0 });

        let mut model = GradientBoosted::new(100, 3, 0.1, 1);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_trees(), 100);

        let preds = model.predict(&x).unwrap();
        let mae = (&preds - &y).mapv(f64::abs).mean().unwrap();
        assert!(mae < 0.1, "mae = {}", mae);

        let importances = model.feature_importances().unwrap();
        assert!((importances.sum() - 1.0).abs() < 1e-9);
        assert!(importances[0] > 0.99);
    }

    #[test]
    fn test_constant_target() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![7.0, 7.0, 7.0];
        let mut model = GradientBoosted::new(10, 6, 0.1, 1);
        model.fit(&x, &y).unwrap();

        let preds = model.predict(&array![[50.0]]).unwrap();
        assert!((preds[0] - 7.0).abs() < 1e-12);
        assert_eq!(model.feature_importances().unwrap().sum(), 0.0);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = GradientBoosted::new(10, 6, 0.1, 1);
        assert!(matches!(model.predict(&array![[1.0]]), Err(F1Error::Model(_))));
    }

    #[test]
    fn test_empty_fit_fails() {
        let mut model = GradientBoosted::new(10, 6, 0.1, 1);
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        assert!(model.fit(&x, &y).is_err());
    }
}
