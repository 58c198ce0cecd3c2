//! Forecast pipeline: shift a meteo forecast onto a timeline that starts
//! today, then label every feature-complete row with a trained model.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::io::write_predictions_csv;
use crate::label::FireClass;
use crate::model::ModelArtifact;
use crate::records::{ForecastOutput, MeteoTable, PredictionRecord};

/// Map the distinct timestamps of `table`, in ascending order, onto
/// consecutive days starting at `today`, rewriting both the parsed time
/// and the raw `time` field. Returns the mapping in order.
pub fn remap_time_column(table: &mut MeteoTable, today: NaiveDate) -> Result<Vec<(NaiveDateTime, NaiveDate)>> {
    let mut mapping: BTreeMap<NaiveDateTime, NaiveDate> =
        table.rows.iter().map(|r| (r.observation.time, today)).collect();
    for (i, day) in mapping.values_mut().enumerate() {
        *day = today
            .checked_add_days(Days::new(i as u64))
            .ok_or_else(|| PipelineError::InvalidConfig(format!("{i} days after {today} overflows")))?;
    }

    let time_col = table.time_col;
    for row in &mut table.rows {
        let day = mapping[&row.observation.time];
        row.observation.time = day.and_time(NaiveTime::default());
        if let Some(field) = row.raw.get_mut(time_col) {
            *field = day.format("%Y-%m-%d").to_string();
        }
    }
    Ok(mapping.into_iter().collect())
}

/// Feature rows with no missing value, and their positions in `table`.
pub fn prepare_features(table: &MeteoTable) -> (Vec<usize>, Vec<Vec<f64>>) {
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.observation.features.iter().all(|v| !v.is_nan()))
        .map(|(i, r)| (i, r.observation.features.clone()))
        .unzip()
}

/// One prediction per row; `None` where features were incomplete.
pub fn predict(table: &MeteoTable, model: &ModelArtifact) -> Result<Vec<Option<FireClass>>> {
    let (positions, features) = prepare_features(table);
    let classes = model.predict_with_schema(&table.schema, &features)?;
    let mut out = vec![None; table.len()];
    for (pos, class) in positions.into_iter().zip(classes) {
        out[pos] = Some(class);
    }
    Ok(out)
}

/// Remap, predict and assemble the output table.
pub fn run_forecast(mut table: MeteoTable, model: &ModelArtifact, today: NaiveDate) -> Result<ForecastOutput> {
    let mapping = remap_time_column(&mut table, today)?;
    let predictions = predict(&table, model)?;
    let output = ForecastOutput {
        headers: table.headers,
        records: table
            .rows
            .into_iter()
            .zip(predictions)
            .map(|(row, fire_prediction)| PredictionRecord { row, fire_prediction })
            .collect(),
    };
    info!(
        rows = output.records.len(),
        predicted = output.predicted_count(),
        days = mapping.len(),
        "forecast labelled"
    );
    Ok(output)
}

pub fn persist(path: &Path, output: &ForecastOutput) -> Result<()> {
    write_predictions_csv(path, output)
}
