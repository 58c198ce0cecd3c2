//! CART decision tree with Gini impurity and per-split feature subsampling.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub n_classes: usize,
    /// Candidate features examined per split before accepting the best.
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    /// Class probabilities of the training samples that reached the leaf.
    Leaf { proba: Vec<f64> },
    /// `x[feature] <= threshold` goes left.
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn class_counts(y: &[usize], idx: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in idx {
        counts[y[i]] += 1;
    }
    counts
}

#[inline]
fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / t).powi(2)).sum::<f64>()
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` selected by `idx` (duplicates allowed,
    /// as in a bootstrap sample).
    pub fn fit(x: &[Vec<f64>], y: &[usize], idx: Vec<usize>, params: &TreeParams, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, idx, 0, params, rng);
        tree
    }

    /// Append the subtree for `idx` and return its node id.
    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        idx: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> usize {
        let counts = class_counts(y, &idx, params.n_classes);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = params.max_depth.is_some_and(|d| depth >= d);

        let split = if pure || depth_reached || idx.len() < params.min_samples_split {
            None
        } else {
            best_split(x, y, &idx, &counts, params, rng)
        };

        let Some(split) = split else {
            let n = idx.len().max(1) as f64;
            let proba = counts.iter().map(|&c| c as f64 / n).collect();
            self.nodes.push(Node::Leaf { proba });
            return self.nodes.len() - 1;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            idx.into_iter().partition(|&i| x[i][split.feature] <= split.threshold);

        // Reserve the slot so children land after their parent.
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { proba: Vec::new() });
        let left = self.grow(x, y, left_idx, depth + 1, params, rng);
        let right = self.grow(x, y, right_idx, depth + 1, params, rng);
        self.nodes[id] = Node::Split { feature: split.feature, threshold: split.threshold, left, right };
        id
    }

    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { proba } => return proba,
                Node::Split { feature, threshold, left, right } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Search a random permutation of features. Keeps going past
/// `max_features` until at least one valid partition is found.
fn best_split(
    x: &[Vec<f64>],
    y: &[usize],
    idx: &[usize],
    parent_counts: &[usize],
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<BestSplit> {
    if idx.len() < 2 {
        return None;
    }
    let n_features = x.first().map_or(0, Vec::len);
    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);

    let parent_impurity = gini(parent_counts, idx.len());
    let mut best: Option<BestSplit> = None;
    let mut order: Vec<usize> = idx.to_vec();

    for (visited, &f) in features.iter().enumerate() {
        if visited >= params.max_features && best.is_some() {
            break;
        }
        order.sort_by(|&a, &b| x[a][f].total_cmp(&x[b][f]));

        let mut left = vec![0usize; params.n_classes];
        let mut right = parent_counts.to_vec();
        let n = order.len();
        for k in 0..n - 1 {
            let c = y[order[k]];
            left[c] += 1;
            right[c] -= 1;

            let v = x[order[k]][f];
            let next = x[order[k + 1]][f];
            if v >= next {
                continue;
            }
            let nl = k + 1;
            let nr = n - nl;
            let impurity = (nl as f64 * gini(&left, nl) + nr as f64 * gini(&right, nr)) / n as f64;
            if impurity < parent_impurity - 1e-12 && best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = v + (next - v) / 2.0;
                // Guard against the midpoint rounding up to `next`.
                if threshold >= next {
                    threshold = v;
                }
                best = Some(BestSplit { feature: f, threshold, impurity });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params(max_depth: Option<usize>) -> TreeParams {
        TreeParams { n_classes: 3, max_features: 2, max_depth, min_samples_split: 2 }
    }

    #[test]
    fn gini_bounds() {
        assert_eq!(gini(&[4, 0, 0], 4), 0.0);
        assert!((gini(&[1, 1, 0], 2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn separable_data_is_fit_exactly() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, 0.0]).collect();
        let y: Vec<usize> = (0..30).map(|i| i / 10).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..30).collect(), &params(None), &mut rng);
        for (row, &label) in x.iter().zip(&y) {
            let p = tree.predict_proba(row);
            assert_eq!(p[label], 1.0, "row {row:?}");
        }
    }

    #[test]
    fn depth_limit_gives_single_leaf() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<usize> = (0..10).map(|i| usize::from(i >= 5)).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..10).collect(), &params(Some(0)), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_proba(&[0.0]), &[0.5, 0.5, 0.0]);
    }

    #[test]
    fn constant_features_yield_leaf() {
        let x = vec![vec![1.0]; 6];
        let y = vec![0, 1, 2, 0, 1, 2];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..6).collect(), &params(None), &mut rng);
        assert_eq!(tree.node_count(), 1);
    }
}
