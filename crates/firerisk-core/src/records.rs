//! Row types flowing through the pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::label::FireClass;
use crate::schema::FeatureSchema;

/// One raw satellite fire detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireDetection {
    pub latitude: f64,
    pub longitude: f64,
    pub acq_date: NaiveDate,
    /// Fire radiative power in MW. NaN when the source cell was empty.
    pub frp: f64,
}

/// One gridded meteorological observation. `features` follows the table's
/// [`FeatureSchema`]; missing values are NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteoObservation {
    pub latitude: f64,
    pub longitude: f64,
    pub time: NaiveDateTime,
    pub features: Vec<f64>,
}

/// A parsed meteo row together with its verbatim CSV fields, so a forecast
/// table can be written back with every original column intact.
#[derive(Debug, Clone)]
pub struct MeteoRow {
    pub observation: MeteoObservation,
    pub raw: Vec<String>,
}

/// A meteorological CSV held in memory.
#[derive(Debug, Clone)]
pub struct MeteoTable {
    pub headers: Vec<String>,
    /// Index of the `time` column within `headers`.
    pub time_col: usize,
    pub schema: FeatureSchema,
    pub rows: Vec<MeteoRow>,
}

impl MeteoTable {
    pub fn observations(&self) -> impl Iterator<Item = &MeteoObservation> {
        self.rows.iter().map(|r| &r.observation)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The fused unit of analysis: one row per (date, cell).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCellRecord {
    pub date: NaiveDate,
    pub cell_id: String,
    /// Maximum FRP seen in the cell that day, 0 when there was no detection.
    pub frp_max: f64,
    pub fire_class: FireClass,
    pub features: Vec<f64>,
}

/// Output of fusion: records sorted by (date, cell_id).
#[derive(Debug, Clone)]
pub struct FusedTable {
    pub schema: FeatureSchema,
    pub records: Vec<DailyCellRecord>,
}

impl FusedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total count of NaN feature values across all records.
    pub fn missing_feature_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.features.iter().filter(|v| v.is_nan()).count())
            .sum()
    }

    pub fn labels(&self) -> Vec<FireClass> {
        self.records.iter().map(|r| r.fire_class).collect()
    }
}

/// A forecast row with its predicted class, absent when any feature was
/// missing.
#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub row: MeteoRow,
    pub fire_prediction: Option<FireClass>,
}

/// A forecast table augmented with predictions.
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    pub headers: Vec<String>,
    pub records: Vec<PredictionRecord>,
}

impl ForecastOutput {
    pub fn predicted_count(&self) -> usize {
        self.records.iter().filter(|r| r.fire_prediction.is_some()).count()
    }
}
