//! Trained classifier bundled with the feature schema it was fitted on.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::forest::RandomForest;
use crate::label::FireClass;
use crate::schema::FeatureSchema;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: FeatureSchema,
    pub forest: RandomForest,
}

impl ModelArtifact {
    /// Predict one class per row. Rows must follow `self.schema`.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<FireClass>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.schema.len() {
                    return Err(PipelineError::SchemaMismatch {
                        expected: self.schema.names().join(", "),
                        found: format!("{} values", row.len()),
                    });
                }
                FireClass::from_index(self.forest.predict(row))
            })
            .collect()
    }

    /// Predict against rows laid out by `schema`, which must equal the
    /// schema the model was trained on.
    pub fn predict_with_schema(&self, schema: &FeatureSchema, rows: &[Vec<f64>]) -> Result<Vec<FireClass>> {
        self.schema.ensure_matches(schema)?;
        self.predict(rows)
    }
}
