//! Seeded row-wise train/test split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_fraction)` rows.
///
/// Rows are split without regard to driver or round, so later rounds of a
/// driver can land in training while earlier ones are tested. At least one
/// training row is always kept.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> TrainTestSplit {
    let mut rows: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    let n_test = ((n as f64 * test_fraction.clamp(0.0, 1.0)).ceil() as usize).min(n.saturating_sub(1));
    let train = rows.split_off(n_test);

    log::debug!("Split {} rows: train={}, test={}", n, train.len(), rows.len());

    TrainTestSplit { train, test: rows }
}
