//! Error taxonomy for the fire-risk pipeline.

use thiserror::Error;

use crate::label::FireClass;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{file}: missing column `{column}`")]
    MissingColumn { file: String, column: String },

    #[error("line {line}: cannot parse `{value}` in column `{column}`")]
    ParseField { line: u64, column: String, value: String },

    #[error("line {line}: invalid date `{value}`")]
    InvalidDate { line: u64, value: String },

    #[error("feature schema mismatch: expected [{expected}], found [{found}]")]
    SchemaMismatch { expected: String, found: String },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("labels contain a single class; stratified split needs at least two")]
    SingleClass,

    #[error("class {class:?} has only {count} sample(s)")]
    ClassTooSmall { class: FireClass, count: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown fire class {0}")]
    UnknownClass(u8),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
