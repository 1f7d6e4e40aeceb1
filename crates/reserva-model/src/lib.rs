//! Reserva domain model.
//!
//! Shared types for the retraining pipeline: configuration structs,
//! the pipeline error taxonomy, categorical encoding maps, the
//! selected feature schema, the metrics record, and the artifact
//! directory layout. This crate holds data and invariants only; stage
//! logic lives in the stage crates.

pub mod config;
pub mod encoding;
pub mod error;
pub mod metrics;
pub mod paths;
pub mod schema;

pub use config::{
    DEFAULT_LABEL_COLUMN, IngestionConfig, ParamSpace, PipelineConfig, ProcessingConfig, Scoring,
    TrainingConfig, ValueRange, load_config,
};
pub use encoding::{CategoryMap, Encodings};
pub use error::{BoxedSource, ErrorKind, PipelineError, Result};
pub use metrics::MetricsRecord;
pub use paths::ArtifactLayout;
pub use schema::FeatureSchema;
