//! Random-forest regressor.
//!
//! Each tree is grown on a bootstrap sample of the rows (or on all rows when
//! bootstrap is off). Trees are independent, so they are fit in parallel; each
//! one draws from its own `StdRng` seeded from `(seed, tree index)`, which
//! keeps the forest identical across runs and thread counts.
//!
//! With bootstrap on, the rows a tree never saw give a free validation signal:
//! the out-of-bag (OOB) R².

use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::ForestConfig;
use crate::error::ModelError;
use crate::fit::tree::{RegressionTree, TreeParams};

/// A fitted forest for a single target.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    oob_r2: Option<f64>,
}

/// Fit a forest on the encoded matrix `x` and target vector `y`.
pub fn fit_forest(x: &DMatrix<f64>, y: &[f64], config: &ForestConfig) -> Result<FittedForest, ModelError> {
    validate(x, y, config)?;

    let n = x.nrows();
    let params = TreeParams {
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        min_samples_leaf: config.min_samples_leaf,
        max_features: config.max_features.resolve(x.ncols()),
    };

    let fitted: Vec<(RegressionTree, Vec<usize>)> = (0..config.n_estimators)
        .into_par_iter()
        .map(|idx| {
            let mut rng = StdRng::seed_from_u64(tree_seed(config.seed, idx));
            let (indices, out_of_bag) = if config.bootstrap {
                bootstrap_sample(n, &mut rng)
            } else {
                ((0..n).collect(), Vec::new())
            };
            let tree = RegressionTree::fit(x, y, &indices, &params, &mut rng);
            (tree, out_of_bag)
        })
        .collect();

    let oob_r2 = if config.bootstrap { oob_r2(x, y, &fitted) } else { None };
    let trees = fitted.into_iter().map(|(tree, _)| tree).collect();

    Ok(FittedForest {
        trees,
        n_features: x.ncols(),
        oob_r2,
    })
}

impl FittedForest {
    /// Mean tree prediction for every row of `x`.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        if x.ncols() != self.n_features {
            return Err(ModelError::Prediction(format!(
                "Feature mismatch: expected {} encoded features, got {}.",
                self.n_features,
                x.ncols()
            )));
        }
        let n_trees = self.trees.len() as f64;
        Ok((0..x.nrows())
            .map(|row| self.trees.iter().map(|t| t.predict_row(x, row)).sum::<f64>() / n_trees)
            .collect())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Out-of-bag R², when bootstrap was on and enough rows were left out.
    pub fn oob_r2(&self) -> Option<f64> {
        self.oob_r2
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

fn validate(x: &DMatrix<f64>, y: &[f64], config: &ForestConfig) -> Result<(), ModelError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::Fit(format!(
            "Encoded matrix is empty ({}x{}).",
            x.nrows(),
            x.ncols()
        )));
    }
    if x.nrows() != y.len() {
        return Err(ModelError::Fit(format!(
            "Row count mismatch: {} feature rows vs {} targets.",
            x.nrows(),
            y.len()
        )));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Fit("Targets contain non-finite values.".to_string()));
    }
    if config.n_estimators == 0 {
        return Err(ModelError::Fit("n_estimators must be >= 1.".to_string()));
    }
    if config.min_samples_split < 2 {
        return Err(ModelError::Fit("min_samples_split must be >= 2.".to_string()));
    }
    if config.min_samples_leaf == 0 {
        return Err(ModelError::Fit("min_samples_leaf must be >= 1.".to_string()));
    }
    Ok(())
}

/// Per-tree seed: the forest seed mixed with the tree index (splitmix64).
fn tree_seed(seed: u64, idx: usize) -> u64 {
    let mut z = seed.wrapping_add((idx as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Draw `n` rows with replacement; also return the rows never drawn.
fn bootstrap_sample(n: usize, rng: &mut StdRng) -> (Vec<usize>, Vec<usize>) {
    let mut in_bag = vec![false; n];
    let indices: Vec<usize> = (0..n)
        .map(|_| {
            let i = rng.gen_range(0..n);
            in_bag[i] = true;
            i
        })
        .collect();
    let out_of_bag = (0..n).filter(|&i| !in_bag[i]).collect();
    (indices, out_of_bag)
}

fn oob_r2(x: &DMatrix<f64>, y: &[f64], fitted: &[(RegressionTree, Vec<usize>)]) -> Option<f64> {
    let n = y.len();
    let mut sums = vec![0.0; n];
    let mut counts = vec![0usize; n];

    for (tree, out_of_bag) in fitted {
        for &i in out_of_bag {
            sums[i] += tree.predict_row(x, i);
            counts[i] += 1;
        }
    }

    let scored: Vec<(f64, f64)> = (0..n)
        .filter(|&i| counts[i] > 0)
        .map(|i| (y[i], sums[i] / counts[i] as f64))
        .collect();
    if scored.len() < 2 {
        return None;
    }

    let mean = scored.iter().map(|(obs, _)| obs).sum::<f64>() / scored.len() as f64;
    let sst: f64 = scored.iter().map(|(obs, _)| (obs - mean).powi(2)).sum();
    let sse: f64 = scored.iter().map(|(obs, pred)| (obs - pred).powi(2)).sum();
    if sst <= 0.0 {
        return None;
    }
    Some(1.0 - sse / sst)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two indicator columns; y depends additively on both.
    fn toy() -> (DMatrix<f64>, Vec<f64>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for rep in 0..6 {
            for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
                data.extend_from_slice(&[a, b]);
                y.push(3.0 * a + 5.0 * b + rep as f64 * 0.01);
            }
        }
        (DMatrix::from_row_slice(y.len(), 2, &data), y)
    }

    #[test]
    fn same_seed_gives_identical_forests() {
        let (x, y) = toy();
        let config = ForestConfig {
            n_estimators: 16,
            ..ForestConfig::default()
        };
        let a = fit_forest(&x, &y, &config).unwrap();
        let b = fit_forest(&x, &y, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn predictions_track_the_signal() {
        let (x, y) = toy();
        let forest = fit_forest(&x, &y, &ForestConfig::default()).unwrap();
        assert_eq!(forest.n_trees(), 100);

        let preds = forest.predict(&x).unwrap();
        for (pred, obs) in preds.iter().zip(&y) {
            assert!((pred - obs).abs() < 0.5, "pred={pred} obs={obs}");
        }
        let r2 = forest.oob_r2().expect("oob r2 with 24 rows and 100 trees");
        assert!(r2 > 0.9 && r2 <= 1.0, "r2={r2}");
    }

    #[test]
    fn without_bootstrap_every_tree_sees_all_rows() {
        let (x, y) = toy();
        let config = ForestConfig {
            n_estimators: 3,
            bootstrap: false,
            ..ForestConfig::default()
        };
        let forest = fit_forest(&x, &y, &config).unwrap();
        assert!(forest.oob_r2().is_none());
        let t = forest.trees();
        assert_eq!(t[0], t[1]);
        assert_eq!(t[1], t[2]);
    }

    #[test]
    fn feature_mismatch_is_a_prediction_error() {
        let (x, y) = toy();
        let forest = fit_forest(&x, &y, &ForestConfig { n_estimators: 2, ..ForestConfig::default() }).unwrap();
        let wrong = DMatrix::<f64>::zeros(1, 3);
        assert!(matches!(forest.predict(&wrong), Err(ModelError::Prediction(_))));
    }

    #[test]
    fn invalid_inputs_are_fit_errors() {
        let (x, y) = toy();
        assert!(matches!(fit_forest(&x, &y[1..], &ForestConfig::default()), Err(ModelError::Fit(_))));
        let zero_trees = ForestConfig {
            n_estimators: 0,
            ..ForestConfig::default()
        };
        assert!(matches!(fit_forest(&x, &y, &zero_trees), Err(ModelError::Fit(_))));
        let empty = DMatrix::<f64>::zeros(0, 2);
        assert!(matches!(fit_forest(&empty, &[], &ForestConfig::default()), Err(ModelError::Fit(_))));
    }

    #[test]
    fn tree_seeds_differ_per_index() {
        assert_ne!(tree_seed(42, 0), tree_seed(42, 1));
        assert_eq!(tree_seed(42, 3), tree_seed(42, 3));
    }
}
