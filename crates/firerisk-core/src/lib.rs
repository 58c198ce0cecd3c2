//! Offline wildfire-risk pipeline: grid fire detections and meteorology,
//! fuse them into labelled cell-days, train a random forest, and label
//! meteorological forecasts.

pub mod config;
pub mod error;
pub mod forecast;
pub mod forest;
pub mod fusion;
pub mod grid;
pub mod io;
pub mod label;
pub mod model;
pub mod pipeline;
pub mod records;
pub mod schema;
pub mod synth;
pub mod training;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use grid::{cell, GridCell};
pub use label::{classify, FireClass};
pub use model::ModelArtifact;
pub use schema::FeatureSchema;
pub use synth::{Augmentor, ClassMeanProfile};
