/// Forecast labeller: trains on historical fire/meteo files, then assigns a
/// fire-risk class to every feature-complete row of a meteo forecast whose
/// timeline is shifted to start today.
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use firerisk_core::forecast::{persist, run_forecast};
use firerisk_core::io::read_meteo_csv;
use firerisk_core::pipeline::train_and_return_model;
use firerisk_core::{ClassMeanProfile, FeatureSchema, PipelineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "forecast", about = "Predict fire-risk classes for a meteorological forecast")]
struct Args {
    /// Meteorological forecast CSV.
    #[arg(short, long, default_value = "data/meteo_forecast.csv")]
    input: PathBuf,

    /// Output CSV: forecast columns plus fire_prediction.
    #[arg(short, long, default_value = "data/predictions.csv")]
    output: PathBuf,

    /// Historical fire detections used for training.
    #[arg(long, default_value = "data/raw_fire_totrain.csv")]
    fire: PathBuf,

    /// Historical meteorology used for training.
    #[arg(long, default_value = "data/raw_meteo_totrain.csv")]
    meteo: PathBuf,

    /// Pipeline configuration JSON; omitted fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-class mean profile JSON (defaults to the built-in ERA5 table).
    #[arg(long)]
    profile: Option<PathBuf>,
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
    let schema = FeatureSchema::era5();
    let profile = match &args.profile {
        Some(path) => ClassMeanProfile::from_json_file(path, &schema)
            .with_context(|| format!("reading profile {}", path.display()))?,
        None => ClassMeanProfile::default(),
    };

    let forecast = read_meteo_csv(&args.input, &schema)
        .with_context(|| format!("reading forecast {}", args.input.display()))?;
    let model = train_and_return_model(&args.fire, &args.meteo, &profile, &cfg).context("training model")?;

    let today = Local::now().date_naive();
    let output = run_forecast(forecast, &model, today)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    persist(&args.output, &output).with_context(|| format!("writing {}", args.output.display()))?;
    eprintln!(
        "{} of {} rows predicted -> {}",
        output.predicted_count(),
        output.records.len(),
        args.output.display()
    );
    Ok(())
}
