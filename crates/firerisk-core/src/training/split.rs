//! Seeded stratified train/test split.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::Dataset;
use crate::error::{PipelineError, Result};
use crate::label::FireClass;

/// Row indices of each class, in input order.
pub(crate) fn indices_by_class(labels: &[FireClass]) -> BTreeMap<FireClass, Vec<usize>> {
    let mut by_class: BTreeMap<FireClass, Vec<usize>> = BTreeMap::new();
    for (i, &c) in labels.iter().enumerate() {
        by_class.entry(c).or_default().push(i);
    }
    by_class
}

/// Split `data` so each class contributes `round(n_c · test_fraction)`
/// rows to the test side, clamped so both sides keep at least one row of
/// every class.
///
/// Fails on an empty dataset, a single class, or any class with fewer
/// than two rows.
pub fn stratified_split(data: &Dataset, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "test_fraction must lie in (0, 1), got {test_fraction}"
        )));
    }
    if data.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let by_class = indices_by_class(&data.y);
    if by_class.len() < 2 {
        return Err(PipelineError::SingleClass);
    }
    if let Some((&class, idx)) = by_class.iter().find(|(_, idx)| idx.len() < 2) {
        return Err(PipelineError::ClassTooSmall { class, count: idx.len() });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::new();
    let mut test_idx = Vec::new();
    for idx in by_class.values() {
        let mut idx = idx.clone();
        idx.shuffle(&mut rng);
        let n = idx.len();
        let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
        test_idx.extend_from_slice(&idx[..n_test]);
        train_idx.extend_from_slice(&idx[n_test..]);
    }
    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    Ok((data.subset(&train_idx), data.subset(&test_idx)))
}
