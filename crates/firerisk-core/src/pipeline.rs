//! End-to-end orchestration over flat files.
//!
//! Stage order:
//!   1. Load fire + meteo CSVs
//!   2. Fuse to (date, cell) records and label
//!   3. Overwrite features with class-conditioned synthetic draws
//!   4. prepare_data → split_and_resample → train (→ evaluate)

use std::path::Path;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fusion::{fuse, FusionStats};
use crate::io::{read_fire_csv, read_meteo_csv};
use crate::model::ModelArtifact;
use crate::records::FusedTable;
use crate::synth::{Augmentor, ClassMeanProfile};
use crate::training::{self, Evaluation, TrainTestSplit};

/// Fused, labelled and synthesized training table built from raw files.
pub fn build_training_table(
    fire_csv: &Path,
    meteo_csv: &Path,
    profile: &ClassMeanProfile,
    cfg: &PipelineConfig,
) -> Result<(FusedTable, FusionStats)> {
    let fires = read_fire_csv(fire_csv)?;
    let meteo = read_meteo_csv(meteo_csv, &profile.schema)?;
    info!(fires = fires.len(), meteo = meteo.len(), "loaded raw inputs");

    let (mut table, stats) = fuse(&fires, meteo.observations(), &profile.schema, cfg.cell_size);
    let mut augmentor = Augmentor::new(profile.clone(), cfg.noise_std, cfg.synth_seed)?;
    augmentor.augment(&mut table)?;
    Ok((table, stats))
}

/// A trained model together with the data it was fitted and scored on.
pub struct TrainingRun {
    pub table: FusedTable,
    pub split: TrainTestSplit,
    pub model: ModelArtifact,
    pub evaluation: Evaluation,
}

/// Train on an already built table and score on its held-out split.
pub fn train_on_table(table: FusedTable, cfg: &PipelineConfig) -> Result<TrainingRun> {
    let data = training::prepare_data(&table);
    let split = training::split_and_resample(&data, cfg)?;
    let model = training::train(&split.train, cfg)?;
    let evaluation = training::evaluate(&model, &split.test)?;
    Ok(TrainingRun { table, split, model, evaluation })
}

/// Load, fuse, synthesize and train; return only the model.
pub fn train_and_return_model(
    fire_csv: &Path,
    meteo_csv: &Path,
    profile: &ClassMeanProfile,
    cfg: &PipelineConfig,
) -> Result<ModelArtifact> {
    let (table, _) = build_training_table(fire_csv, meteo_csv, profile, cfg)?;
    let data = training::prepare_data(&table);
    let split = training::split_and_resample(&data, cfg)?;
    training::train(&split.train, cfg)
}
