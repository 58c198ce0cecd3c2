/// Training-table builder: fuses raw fire detections with gridded meteorology
/// and writes one labelled, synthesized row per (date, cell).
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use firerisk_core::io::write_fused_csv;
use firerisk_core::pipeline::build_training_table;
use firerisk_core::training::class_distribution;
use firerisk_core::{ClassMeanProfile, FeatureSchema, PipelineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fuse", about = "Fuse fire detections and meteorology into a labelled training table")]
struct Args {
    /// Raw fire detections CSV (latitude, longitude, acq_date, frp).
    #[arg(long, default_value = "data/raw_fire_totrain.csv")]
    fire: PathBuf,

    /// Raw meteorological observations CSV (latitude, longitude, time, features).
    #[arg(long, default_value = "data/raw_meteo_totrain.csv")]
    meteo: PathBuf,

    /// Output fused table.
    #[arg(short, long, default_value = "data/meteo_totrain.csv")]
    output: PathBuf,

    /// Pipeline configuration JSON; omitted fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-class mean profile JSON (defaults to the built-in ERA5 table).
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Seed for the synthetic feature noise (unseeded when omitted).
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.seed.is_some() {
        cfg.synth_seed = args.seed;
    }
    let profile = match &args.profile {
        Some(path) => ClassMeanProfile::from_json_file(path, &FeatureSchema::era5())
            .with_context(|| format!("reading profile {}", path.display()))?,
        None => ClassMeanProfile::default(),
    };

    let (table, stats) = build_training_table(&args.fire, &args.meteo, &profile, &cfg)
        .with_context(|| format!("fusing {} with {}", args.fire.display(), args.meteo.display()))?;

    eprintln!("fire_class distribution:");
    for (class, n) in class_distribution(&table.labels()) {
        eprintln!("  {:>3} {:>8}", u8::from(class), n);
    }
    eprintln!(
        "rejected rows: fire {} / meteo {}; fire-only cell-days dropped: {}",
        stats.fire_rows_rejected, stats.meteo_rows_rejected, stats.fire_only_groups
    );
    eprintln!("missing feature values after synthesis: {}", table.missing_feature_count());

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_fused_csv(&args.output, &table)
        .with_context(|| format!("writing {}", args.output.display()))?;
    eprintln!("{} rows -> {}", table.len(), args.output.display());
    Ok(())
}
