//! Ordered meteorological feature schema shared by fusion, synthesis,
//! training and forecasting.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// ERA5 single-level variables used as model features, in column order.
const ERA5_FEATURES: [&str; 12] = [
    "u10", "v10", "t2m", "d2m", "msl", "sst", "sp", "u100", "v100", "stl1", "swvl1", "cvh",
];

/// An ordered list of feature names. Every feature vector in the pipeline is
/// laid out in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect() }
    }

    /// The 12 ERA5 variables: `u10 v10 t2m d2m msl sst sp u100 v100 stl1 swvl1 cvh`.
    pub fn era5() -> Self {
        Self::new(ERA5_FEATURES)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Column index of every feature within `headers`, in schema order.
    pub fn locate(&self, headers: &csv::StringRecord, file: &str) -> Result<Vec<usize>> {
        self.names
            .iter()
            .map(|name| {
                headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
                    PipelineError::MissingColumn { file: file.to_string(), column: name.clone() }
                })
            })
            .collect()
    }

    /// Fail fast when two components disagree on feature layout.
    pub fn ensure_matches(&self, other: &FeatureSchema) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(PipelineError::SchemaMismatch {
                expected: self.names.join(", "),
                found: other.names.join(", "),
            })
        }
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::era5()
    }
}
