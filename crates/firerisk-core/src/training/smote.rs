//! SMOTE: synthetic minority oversampling by interpolating toward
//! same-class nearest neighbours.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::split::indices_by_class;
use super::Dataset;
use crate::error::{PipelineError, Result};

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(p, q)| (p - q).powi(2)).sum()
}

/// For each member of `members`, the positions (within `members`) of its `k`
/// nearest other members. Brute force: `O(n_c² · d)` time per class and one
/// `n_c`-long distance buffer at a time, which suits per-class counts in the
/// low thousands.
fn nearest_neighbours(x: &[Vec<f64>], members: &[usize], k: usize) -> Vec<Vec<usize>> {
    members
        .iter()
        .enumerate()
        .map(|(a, &i)| {
            let mut dists: Vec<(f64, usize)> = members
                .iter()
                .enumerate()
                .filter(|&(b, _)| b != a)
                .map(|(b, &j)| (squared_distance(&x[i], &x[j]), b))
                .collect();
            dists.sort_by(|p, q| p.0.total_cmp(&q.0).then(p.1.cmp(&q.1)));
            dists.into_iter().take(k).map(|(_, b)| b).collect()
        })
        .collect()
}

/// Oversample every class up to the size of the largest one. Each synthetic
/// row is `x + u · (neighbour − x)` with `u ~ U[0, 1)` and the neighbour
/// drawn from the `min(k, n_c − 1)` nearest rows of the same class.
///
/// Original rows are kept first, in order; synthetic rows follow.
pub fn smote(data: &Dataset, k: usize, seed: u64) -> Result<Dataset> {
    if data.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    if k == 0 {
        return Err(PipelineError::InvalidConfig("smote_k must be at least 1".into()));
    }
    let by_class = indices_by_class(&data.y);
    if by_class.len() < 2 {
        return Err(PipelineError::SingleClass);
    }
    let target = by_class.values().map(Vec::len).max().unwrap_or(0);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = data.clone();

    for (&class, members) in &by_class {
        let deficit = target - members.len();
        if deficit == 0 {
            continue;
        }
        if members.len() < 2 {
            return Err(PipelineError::ClassTooSmall { class, count: members.len() });
        }
        let k_eff = k.min(members.len() - 1);
        let neighbours = nearest_neighbours(&data.x, members, k_eff);

        for _ in 0..deficit {
            let a = rng.gen_range(0..members.len());
            let b = neighbours[a][rng.gen_range(0..k_eff)];
            let (xa, xb) = (&data.x[members[a]], &data.x[members[b]]);
            let u: f64 = rng.gen();
            out.x.push(xa.iter().zip(xb).map(|(p, q)| p + u * (q - p)).collect());
            out.y.push(class);
        }
        debug!(?class, added = deficit, "smote oversampled class");
    }
    Ok(out)
}
