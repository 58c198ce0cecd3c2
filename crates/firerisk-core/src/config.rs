//! Run-wide tunables, loadable from a partial JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::DEFAULT_CELL_SIZE;
use crate::synth::DEFAULT_NOISE_STD;

/// Tunables for a pipeline run. Any field absent from a JSON override
/// keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Grid cell edge in degrees, shared by both datasets.
    pub cell_size: f64,
    /// Synthetic noise standard deviation as a fraction of the class mean.
    pub noise_std: f64,
    /// `None` seeds the synthetic noise from OS entropy.
    pub synth_seed: Option<u64>,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub smote_k: usize,
    pub smote_seed: u64,
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub forest_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            noise_std: DEFAULT_NOISE_STD,
            synth_seed: None,
            test_fraction: 0.2,
            split_seed: 42,
            smote_k: 5,
            smote_seed: 42,
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            forest_seed: 42,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
