//! Least-squares regression tree used as the boosting base learner

use ndarray::{Array1, Array2, ArrayView1};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Reduction in squared error
    gain: f64,
}

/// Binary tree stored as a flat node arena, root at index 0
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on `rows` of `x` against `targets`.
    ///
    /// Split gains are added into `importances`, indexed by column.
    pub fn fit(
        x: &Array2<f64>,
        targets: &[f64],
        rows: Vec<usize>,
        params: TreeParams,
        importances: &mut Array1<f64>,
    ) -> Self {
        let mut tree = RegressionTree { nodes: Vec::new() };
        tree.grow(x, targets, rows, 0, params, importances);
        tree
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        targets: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: TreeParams,
        importances: &mut Array1<f64>,
    ) -> usize {
        let value = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|&r| targets[r]).sum::<f64>() / rows.len() as f64
        };

        let min_leaf = params.min_samples_leaf.max(1);
        let split = if depth < params.max_depth && rows.len() >= 2 * min_leaf {
            best_split(x, targets, &rows, min_leaf)
        } else {
            None
        };

        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        if let Some(split) = split {
            importances[split.feature] += split.gain;

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .into_iter()
                .partition(|&r| x[[r, split.feature]] <= split.threshold);

            let left = self.grow(x, targets, left_rows, depth + 1, params, importances);
            let right = self.grow(x, targets, right_rows, depth + 1, params, importances);
            self.nodes[idx] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
        }

        idx
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    #[cfg(test)]
    pub(crate) fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

/// Exhaustive search over every column and every distinct cut point
fn best_split(
    x: &Array2<f64>,
    targets: &[f64],
    rows: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = rows.len();
    let total: f64 = rows.iter().map(|&r| targets[r]).sum();
    let parent_score = total * total / n as f64;

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..x.ncols() {
        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut left_sum = 0.0;
        for i in 0..n - 1 {
            left_sum += targets[sorted[i]];
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let lo = x[[sorted[i], feature]];
            let hi = x[[sorted[i + 1], feature]];
            if lo == hi {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64
                - parent_score;

            if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
                let mid = lo + (hi - lo) / 2.0;
                best = Some(SplitCandidate {
                    feature,
                    threshold: if mid < hi { mid } else { lo },
                    gain,
                });
            }
        }
    }

    best
}
