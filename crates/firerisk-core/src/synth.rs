//! Class-conditioned synthetic features.
//!
//! Every fused record has its real meteorology replaced by
//! `mean[class][f] + N(0, noise_std · mean[class][f])`, rounded to 2 decimals.
//! This is a full overwrite rather than an imputation of gaps: the resulting
//! features carry no observed signal beyond the label itself.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::label::FireClass;
use crate::records::FusedTable;
use crate::schema::FeatureSchema;

/// Default relative noise level.
pub const DEFAULT_NOISE_STD: f64 = 0.02;

/// Built-in per-class means, ERA5 schema order.
const ERA5_CLASS_MEANS: [[f64; 12]; 3] = [
    // u10  v10  t2m    d2m    msl     sst    sp      u100 v100 stl1   swvl1 cvh
    [2.5, 1.5, 290.0, 285.0, 1015.0, 295.0, 1013.0, 3.0, 2.0, 285.0, 0.25, 0.5],
    [4.0, 2.5, 295.0, 290.0, 1010.0, 296.0, 1008.0, 5.0, 3.5, 290.0, 0.20, 0.3],
    [6.0, 4.0, 300.0, 295.0, 1005.0, 297.0, 1003.0, 7.0, 5.0, 295.0, 0.15, 0.1],
];

/// One mean feature vector per [`FireClass`], laid out by `schema`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMeanProfile {
    pub schema: FeatureSchema,
    /// Indexed by `FireClass::index()`.
    pub means: Vec<Vec<f64>>,
}

impl Default for ClassMeanProfile {
    fn default() -> Self {
        Self {
            schema: FeatureSchema::era5(),
            means: ERA5_CLASS_MEANS.iter().map(|m| m.to_vec()).collect(),
        }
    }
}

impl ClassMeanProfile {
    pub fn mean(&self, class: FireClass) -> &[f64] {
        &self.means[class.index()]
    }

    /// One row per class, each as long as the schema.
    pub fn validate(&self) -> Result<()> {
        let shape_error = |found: String| PipelineError::SchemaMismatch {
            expected: format!("{} classes x {} features", FireClass::ALL.len(), self.schema.len()),
            found,
        };
        if self.means.len() != FireClass::ALL.len() {
            return Err(shape_error(format!("{} class rows", self.means.len())));
        }
        for (class, row) in FireClass::ALL.iter().zip(&self.means) {
            if row.len() != self.schema.len() {
                return Err(shape_error(format!("{} features for class {}", row.len(), u8::from(*class))));
            }
        }
        Ok(())
    }

    /// Load a profile of the form `{"0": {"u10": 2.5, …}, "1": {…}, "2": {…}}`.
    /// Every class must name every feature of `schema`.
    pub fn from_json_file(path: &Path, schema: &FeatureSchema) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text, schema)
    }

    pub fn from_json_str(text: &str, schema: &FeatureSchema) -> Result<Self> {
        let raw: BTreeMap<u8, BTreeMap<String, f64>> = serde_json::from_str(text)?;
        let mut means = Vec::with_capacity(FireClass::ALL.len());
        for class in FireClass::ALL {
            let by_name = raw.get(&u8::from(class)).ok_or_else(|| PipelineError::SchemaMismatch {
                expected: schema.names().join(", "),
                found: format!("no means for class {}", u8::from(class)),
            })?;
            let row = schema
                .names()
                .iter()
                .map(|name| {
                    by_name.get(name).copied().ok_or_else(|| PipelineError::SchemaMismatch {
                        expected: schema.names().join(", "),
                        found: by_name.keys().cloned().collect::<Vec<_>>().join(", "),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            means.push(row);
        }
        Ok(Self { schema: schema.clone(), means })
    }
}

/// Draws synthetic feature values around the class means.
pub struct Augmentor {
    profile: ClassMeanProfile,
    /// `noise[class][feature]`
    noise: Vec<Vec<Normal<f64>>>,
    rng: StdRng,
}

impl Augmentor {
    /// `seed = None` draws from OS entropy, so successive runs differ.
    pub fn new(profile: ClassMeanProfile, noise_std: f64, seed: Option<u64>) -> Result<Self> {
        profile.validate()?;
        let noise = profile
            .means
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&m| {
                        let sd = (noise_std * m).abs();
                        Normal::new(0.0, sd).map_err(|_| {
                            PipelineError::InvalidConfig(format!("noise_std {noise_std} gives no valid spread"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self { profile, noise, rng })
    }

    /// One synthetic feature vector for `class`.
    pub fn draw(&mut self, class: FireClass) -> Vec<f64> {
        let means = &self.profile.means[class.index()];
        let noise = &self.noise[class.index()];
        means
            .iter()
            .zip(noise)
            .map(|(&m, n)| round2(m + self.rng.sample(n)))
            .collect()
    }

    /// Overwrite every record's features with a synthetic draw for its class.
    pub fn augment(&mut self, table: &mut FusedTable) -> Result<()> {
        self.profile.schema.ensure_matches(&table.schema)?;
        let missing_before = table.missing_feature_count();
        if missing_before > 0 {
            warn!(missing_before, "missing feature values replaced by synthetic draws");
        }
        for record in &mut table.records {
            record.features = self.draw(record.fire_class);
        }
        debug!(records = table.len(), "synthetic features drawn");
        Ok(())
    }
}

#[inline]
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
