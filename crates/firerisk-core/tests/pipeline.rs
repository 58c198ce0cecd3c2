use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use firerisk_core::forecast::{persist, run_forecast};
use firerisk_core::io::{read_meteo_csv, write_fused_csv};
use firerisk_core::pipeline::{build_training_table, train_and_return_model, train_on_table};
use firerisk_core::{ClassMeanProfile, FeatureSchema, FireClass, PipelineConfig};
use tempfile::TempDir;

const FEATURES: &str = "u10,v10,t2m,d2m,msl,sst,sp,u100,v100,stl1,swvl1,cvh";

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

/// Meteo rows on a 0.1° lattice over three days; fires placed so every
/// class has enough cell-days to survive the stratified split.
fn synthetic_inputs(dir: &TempDir) -> (PathBuf, PathBuf) {
    let mut meteo = format!("latitude,longitude,time,{FEATURES}\n");
    let mut fire = String::from("latitude,longitude,acq_date,frp\n");
    for day in 1..=3 {
        for i in 0..10 {
            for j in 0..10 {
                let lat = 40.05 + i as f64 * 0.1;
                let lon = -120.05 + j as f64 * 0.1;
                meteo.push_str(&format!(
                    "{lat:.2},{lon:.2},2023-08-0{day} 12:00:00,1,2,290,285,1015,295,1013,3,2,285,0.25,0.5\n"
                ));
                let k = i * 10 + j;
                if k % 5 == 0 {
                    fire.push_str(&format!("{lat:.2},{lon:.2},2023-08-0{day},4.5\n"));
                } else if k % 7 == 0 {
                    fire.push_str(&format!("{lat:.2},{lon:.2},2023-08-0{day},25.0\n"));
                }
            }
        }
    }
    (write(dir, "fire.csv", &fire), write(dir, "meteo.csv", &meteo))
}

#[test]
fn single_high_intensity_detection() {
    let dir = TempDir::new().unwrap();
    let fire = write(&dir, "fire.csv", "latitude,longitude,acq_date,frp\n36.7,-119.4,2023-08-01,15\n");
    let meteo = write(
        &dir,
        "meteo.csv",
        &format!("latitude,longitude,time,{FEATURES}\n36.7,-119.4,2023-08-01 00:00:00,9,9,9,9,9,9,9,9,9,9,9,9\n"),
    );
    let profile = ClassMeanProfile::default();
    let cfg = PipelineConfig { synth_seed: Some(1), ..Default::default() };

    let (table, _) = build_training_table(&fire, &meteo, &profile, &cfg).unwrap();
    assert_eq!(table.len(), 1);
    let r = &table.records[0];
    assert_eq!(r.fire_class, FireClass::High);
    assert_eq!(r.frp_max, 15.0);
    for (&v, &m) in r.features.iter().zip(profile.mean(FireClass::High)) {
        assert!((v - m).abs() <= 6.0 * 0.02 * m + 0.005, "feature {v} vs mean {m}");
    }

    let out = dir.path().join("fused.csv");
    write_fused_csv(&out, &table).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with(&format!("date,cell_id,frp_max,fire_class,{FEATURES}\n")));
    assert!(text.lines().nth(1).unwrap().starts_with("2023-08-01,36.700_-119.400,15,2,"));
}

#[test]
fn train_then_forecast() {
    let dir = TempDir::new().unwrap();
    let (fire, meteo) = synthetic_inputs(&dir);
    let profile = ClassMeanProfile::default();
    let cfg = PipelineConfig { synth_seed: Some(3), n_trees: 25, ..Default::default() };

    let (table, stats) = build_training_table(&fire, &meteo, &profile, &cfg).unwrap();
    assert_eq!(table.len(), 300);
    assert_eq!(stats.fire_only_groups, 0);

    let run = train_on_table(table, &cfg).unwrap();
    assert!(run.evaluation.accuracy > 0.9, "accuracy {}", run.evaluation.accuracy);

    let high = profile.mean(FireClass::High);
    let none = profile.mean(FireClass::None);
    let fmt = |v: &[f64]| v.iter().map(f64::to_string).collect::<Vec<_>>().join(",");
    let forecast_csv = write(
        &dir,
        "forecast.csv",
        &format!(
            "time,latitude,longitude,{FEATURES}\n\
             2024-02-10 00:00:00,40.1,-120.0,{}\n\
             2024-02-11 00:00:00,40.1,-120.0,{}\n\
             2024-02-11 00:00:00,40.2,-120.0,,1,1,1,1,1,1,1,1,1,1,1\n",
            fmt(high),
            fmt(none)
        ),
    );
    let table = read_meteo_csv(&forecast_csv, &FeatureSchema::era5()).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let output = run_forecast(table, &run.model, today).unwrap();
    assert_eq!(output.records[0].fire_prediction, Some(FireClass::High));
    assert_eq!(output.records[1].fire_prediction, Some(FireClass::None));
    assert_eq!(output.records[2].fire_prediction, None);

    let out = dir.path().join("predictions.csv");
    persist(&out, &output).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].ends_with(",fire_prediction"));
    assert!(lines[1].starts_with("2026-10-19,") && lines[1].ends_with(",2"));
    assert!(lines[2].starts_with("2026-10-20,") && lines[2].ends_with(",0"));
    assert!(lines[3].ends_with(","));
}

#[test]
fn model_from_files_is_reproducible_when_seeded() {
    let dir = TempDir::new().unwrap();
    let (fire, meteo) = synthetic_inputs(&dir);
    let cfg = PipelineConfig { synth_seed: Some(9), n_trees: 10, ..Default::default() };
    let profile = ClassMeanProfile::default();
    let a = train_and_return_model(&fire, &meteo, &profile, &cfg).unwrap();
    let b = train_and_return_model(&fire, &meteo, &profile, &cfg).unwrap();
    let rows = vec![profile.mean(FireClass::Low).to_vec()];
    assert_eq!(a.predict(&rows).unwrap(), b.predict(&rows).unwrap());
    assert_eq!(a.predict(&rows).unwrap(), vec![FireClass::Low]);
}

#[test]
fn single_class_training_data_aborts() {
    let dir = TempDir::new().unwrap();
    let fire = write(&dir, "fire.csv", "latitude,longitude,acq_date,frp\n");
    let meteo = write(
        &dir,
        "meteo.csv",
        &format!(
            "latitude,longitude,time,{FEATURES}\n\
             1.05,1.05,2023-08-01,1,1,1,1,1,1,1,1,1,1,1,1\n\
             2.05,2.05,2023-08-01,1,1,1,1,1,1,1,1,1,1,1,1\n"
        ),
    );
    let cfg = PipelineConfig { synth_seed: Some(1), ..Default::default() };
    let err = train_and_return_model(&fire, &meteo, &ClassMeanProfile::default(), &cfg).unwrap_err();
    assert!(matches!(err, firerisk_core::PipelineError::SingleClass));
}
