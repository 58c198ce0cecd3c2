/// Trains the fire-risk random forest from raw fire and meteo files and
/// reports held-out metrics. Metrics are diagnostic; nothing gates on them.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use firerisk_core::pipeline::{build_training_table, train_on_table};
use firerisk_core::training::{class_distribution, Evaluation};
use firerisk_core::{ClassMeanProfile, FeatureSchema, PipelineConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train and evaluate the fire-risk classifier")]
struct Args {
    /// Raw fire detections CSV.
    #[arg(long, default_value = "data/raw_fire_totrain.csv")]
    fire: PathBuf,

    /// Raw meteorological observations CSV.
    #[arg(long, default_value = "data/raw_meteo_totrain.csv")]
    meteo: PathBuf,

    /// Pipeline configuration JSON; omitted fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-class mean profile JSON (defaults to the built-in ERA5 table).
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Write the evaluation as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report<'a> {
    config: &'a PipelineConfig,
    train_rows: usize,
    test_rows: usize,
    evaluation: &'a Evaluation,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let profile = match &args.profile {
        Some(path) => ClassMeanProfile::from_json_file(path, &FeatureSchema::era5())
            .with_context(|| format!("reading profile {}", path.display()))?,
        None => ClassMeanProfile::default(),
    };

    let (table, _) = build_training_table(&args.fire, &args.meteo, &profile, &cfg)?;

    eprintln!("Sample count per fire_class:");
    for (class, n) in class_distribution(&table.labels()) {
        eprintln!("  {:>3} {:>8}", u8::from(class), n);
    }

    let run = train_on_table(table, &cfg).context("training")?;

    eprintln!("\nConfusion matrix (rows = true, cols = predicted):");
    eprint!("{}", run.evaluation.confusion);
    eprintln!("\nClassification report:");
    eprint!("{}", run.evaluation);

    if let Some(path) = &args.report {
        let report = Report {
            config: &cfg,
            train_rows: run.split.train.len(),
            test_rows: run.split.test.len(),
            evaluation: &run.evaluation,
        };
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!("  -> {}", path.display());
    }
    Ok(())
}
