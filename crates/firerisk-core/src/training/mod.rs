//! Training pipeline: feature/label extraction, stratified split with
//! training-side SMOTE, random forest fit, and held-out evaluation.
//!
//! Pipeline:
//!   prepare_data → split_and_resample → train → evaluate

pub mod metrics;
pub mod smote;
pub mod split;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::forest::{ForestParams, RandomForest};
use crate::label::FireClass;
use crate::model::ModelArtifact;
use crate::records::FusedTable;
use crate::schema::FeatureSchema;

pub use metrics::{ClassReport, ConfusionMatrix, Evaluation};

/// Feature matrix and aligned labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub schema: FeatureSchema,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<FireClass>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn subset(&self, idx: &[usize]) -> Self {
        Self {
            schema: self.schema.clone(),
            x: idx.iter().map(|&i| self.x[i].clone()).collect(),
            y: idx.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

/// Resampled training split and the untouched test split.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
}

/// Select the schema features of every record, dropping rows with any
/// missing value.
pub fn prepare_data(table: &FusedTable) -> Dataset {
    let (x, y): (Vec<Vec<f64>>, Vec<FireClass>) = table
        .records
        .iter()
        .filter(|r| r.features.iter().all(|v| !v.is_nan()))
        .map(|r| (r.features.clone(), r.fire_class))
        .unzip();
    let dropped = table.len() - y.len();
    if dropped > 0 {
        warn!(dropped, "rows with missing features dropped before training");
    }
    Dataset { schema: table.schema.clone(), x, y }
}

/// Count per class present in `labels`, ascending by class.
pub fn class_distribution(labels: &[FireClass]) -> Vec<(FireClass, usize)> {
    FireClass::ALL
        .iter()
        .map(|&c| (c, labels.iter().filter(|&&l| l == c).count()))
        .filter(|&(_, n)| n > 0)
        .collect()
}

/// Stratified split, then SMOTE on the training side only. The test side
/// keeps the original class proportions.
pub fn split_and_resample(data: &Dataset, cfg: &PipelineConfig) -> Result<TrainTestSplit> {
    let (train, test) = split::stratified_split(data, cfg.test_fraction, cfg.split_seed)?;
    let train = smote::smote(&train, cfg.smote_k, cfg.smote_seed)?;
    info!(
        train = train.len(),
        test = test.len(),
        train_classes = ?class_distribution(&train.y),
        "split and resampled"
    );
    Ok(TrainTestSplit { train, test })
}

/// Fit the forest on `train`.
pub fn train(train: &Dataset, cfg: &PipelineConfig) -> Result<ModelArtifact> {
    if train.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    if cfg.n_trees == 0 {
        return Err(PipelineError::InvalidConfig("n_trees must be at least 1".into()));
    }
    let y: Vec<usize> = train.y.iter().map(|c| c.index()).collect();
    let params = ForestParams {
        n_trees: cfg.n_trees,
        max_depth: cfg.max_depth,
        min_samples_split: cfg.min_samples_split,
        seed: cfg.forest_seed,
    };
    let forest = RandomForest::fit(&train.x, &y, FireClass::ALL.len(), &params);
    info!(trees = forest.n_trees(), samples = train.len(), "random forest trained");
    Ok(ModelArtifact { schema: train.schema.clone(), forest })
}

/// Score `model` on the held-out `test` split.
pub fn evaluate(model: &ModelArtifact, test: &Dataset) -> Result<Evaluation> {
    let predicted = model.predict_with_schema(&test.schema, &test.x)?;
    let evaluation = Evaluation::from_labels(&test.y, &predicted);
    info!(accuracy = evaluation.accuracy, macro_f1 = evaluation.macro_f1(), "evaluated on test split");
    Ok(evaluation)
}
