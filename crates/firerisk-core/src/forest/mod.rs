//! Random forest classifier: bootstrap-aggregated CART trees with
//! soft-vote prediction.
//!
//! Tree `i` is seeded with `seed + i` and trees are collected in index
//! order, so the fitted forest does not depend on how many threads grow it.

pub mod tree;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self { n_trees: 100, max_depth: None, min_samples_split: 2, seed: 42 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit on feature rows `x` with labels `y ∈ 0..n_classes`.
    /// `x` must be non-empty and rectangular.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: &ForestParams) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let tree_params = TreeParams {
            n_classes,
            // sqrt(n_features), at least one.
            max_features: ((n_features as f64).sqrt() as usize).max(1),
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
        };

        let grow = |i: usize| {
            let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
            let n = x.len();
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            DecisionTree::fit(x, y, sample, &tree_params, &mut rng)
        };

        #[cfg(feature = "threading")]
        let trees = {
            use rayon::prelude::*;
            (0..params.n_trees).into_par_iter().map(grow).collect()
        };
        #[cfg(not(feature = "threading"))]
        let trees = (0..params.n_trees).map(grow).collect();

        Self { trees, n_classes, n_features }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of the per-tree leaf probabilities.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_classes];
        for t in &self.trees {
            for (a, p) in acc.iter_mut().zip(t.predict_proba(row)) {
                *a += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }

    /// Most probable class; ties go to the lowest class index.
    pub fn predict(&self, row: &[f64]) -> usize {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (c, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = c;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for c in 0..3usize {
            for i in 0..40 {
                let jitter = (i as f64 * 0.37).sin() * 0.5;
                x.push(vec![c as f64 * 10.0 + jitter, c as f64 * -5.0 + jitter, jitter]);
                y.push(c);
            }
        }
        (x, y)
    }

    #[test]
    fn separates_well_spaced_blobs() {
        let (x, y) = blobs();
        let params = ForestParams { n_trees: 15, ..Default::default() };
        let forest = RandomForest::fit(&x, &y, 3, &params);
        assert_eq!(forest.n_trees(), 15);
        let correct = x.iter().zip(&y).filter(|(r, &l)| forest.predict(r) == l).count();
        assert_eq!(correct, x.len());
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = blobs();
        let params = ForestParams { n_trees: 5, ..Default::default() };
        let a = RandomForest::fit(&x, &y, 3, &params);
        let b = RandomForest::fit(&x, &y, 3, &params);
        let row = [4.0, -2.0, 0.1];
        assert_eq!(a.predict_proba(&row), b.predict_proba(&row));
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(&x, &y, 3, &ForestParams { n_trees: 7, ..Default::default() });
        let s: f64 = forest.predict_proba(&[5.0, -2.5, 0.0]).iter().sum();
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[cfg(feature = "threading")]
    #[test]
    fn parallel_fit_matches_serial() {
        let (x, y) = blobs();
        let params = ForestParams { n_trees: 8, ..Default::default() };
        let parallel = RandomForest::fit(&x, &y, 3, &params);
        let serial = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| RandomForest::fit(&x, &y, 3, &params));
        for row in [[4.0, -2.0, 0.1], [0.2, 0.3, -0.4], [19.5, -9.8, 0.2]] {
            assert_eq!(parallel.predict_proba(&row), serial.predict_proba(&row));
        }
    }
}
