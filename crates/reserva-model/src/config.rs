//! Pipeline configuration.
//!
//! The configuration is loaded once from a YAML file and passed by
//! value into each stage's constructor; no component reads a global.
//! Missing or malformed keys fail fast with a configuration error
//! before any stage runs.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Default label column for the reservations dataset.
pub const DEFAULT_LABEL_COLUMN: &str = "booking_status";

/// Top-level pipeline configuration, mirroring `config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub data_ingestion: IngestionConfig,
    pub data_processing: ProcessingConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Source bucket and split settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub bucket_name: String,
    pub bucket_file_name: String,
    /// Fraction of rows assigned to the training split, in (0, 1).
    pub train_ratio: f64,
}

/// Column roles and preprocessing thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub categorical_features: Vec<String>,
    pub numerical_features: Vec<String>,
    pub skewness_threshold: f64,
    pub num_of_features_to_select: usize,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Identifier/index columns dropped unconditionally by preprocessing.
    #[serde(default = "default_id_columns")]
    pub id_columns: Vec<String>,
}

fn default_label_column() -> String {
    DEFAULT_LABEL_COLUMN.to_string()
}

fn default_id_columns() -> Vec<String> {
    vec!["Unnamed: 0".to_string(), "Booking_ID".to_string()]
}

/// Randomized-search and cross-validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of hyperparameter configurations to sample.
    pub n_iter: usize,
    /// Number of cross-validation folds.
    pub cv_folds: usize,
    pub scoring: Scoring,
    /// Worker threads for fold evaluation; 0 uses the rayon default.
    pub n_jobs: usize,
    pub random_state: u64,
    pub param_space: ParamSpace,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_iter: 10,
            cv_folds: 5,
            scoring: Scoring::Accuracy,
            n_jobs: 0,
            random_state: 42,
            param_space: ParamSpace::default(),
        }
    }
}

/// Cross-validation scoring metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    Accuracy,
    F1,
}

impl std::fmt::Display for Scoring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scoring::Accuracy => f.write_str("accuracy"),
            Scoring::F1 => f.write_str("f1"),
        }
    }
}

/// Hyperparameter search space: discrete candidate lists and
/// continuous ranges sampled uniformly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamSpace {
    pub n_estimators: Vec<usize>,
    pub learning_rate: ValueRange,
    pub max_depth: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
    pub subsample: ValueRange,
}

impl Default for ParamSpace {
    fn default() -> Self {
        Self {
            n_estimators: vec![100, 200, 300],
            learning_rate: ValueRange {
                low: 0.01,
                high: 0.2,
            },
            max_depth: vec![3, 5, 7],
            min_samples_leaf: vec![5, 10, 20],
            subsample: ValueRange {
                low: 0.5,
                high: 1.0,
            },
        }
    }
}

/// Closed interval for uniform sampling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

/// Load and validate a pipeline configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        PipelineError::configuration(format!("cannot read config file {}", path.display()))
            .with_source(err)
    })?;
    let config: PipelineConfig = serde_yaml::from_str(&raw).map_err(|err| {
        PipelineError::configuration(format!("malformed config file {}", path.display()))
            .with_source(err)
    })?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

impl PipelineConfig {
    /// Check cross-field invariants the serde layer cannot express.
    pub fn validate(&self) -> Result<()> {
        let ratio = self.data_ingestion.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(PipelineError::configuration(format!(
                "data_ingestion.train_ratio must be in (0, 1), got {ratio}"
            )));
        }
        self.data_processing.validate()?;
        self.training.validate()
    }
}

impl ProcessingConfig {
    fn validate(&self) -> Result<()> {
        if self.num_of_features_to_select == 0 {
            return Err(PipelineError::configuration(
                "data_processing.num_of_features_to_select must be at least 1",
            ));
        }
        if !self.skewness_threshold.is_finite() || self.skewness_threshold < 0.0 {
            return Err(PipelineError::configuration(format!(
                "data_processing.skewness_threshold must be a non-negative number, got {}",
                self.skewness_threshold
            )));
        }
        let categorical: BTreeSet<&str> =
            self.categorical_features.iter().map(String::as_str).collect();
        let numerical: BTreeSet<&str> =
            self.numerical_features.iter().map(String::as_str).collect();
        if let Some(shared) = categorical.intersection(&numerical).next() {
            return Err(PipelineError::configuration(format!(
                "column `{shared}` is listed as both categorical and numerical"
            )));
        }
        let label = self.label_column.as_str();
        if categorical.contains(label) || numerical.contains(label) {
            return Err(PipelineError::configuration(format!(
                "label column `{label}` must not appear in the feature lists"
            )));
        }
        Ok(())
    }
}

impl TrainingConfig {
    fn validate(&self) -> Result<()> {
        if self.n_iter == 0 {
            return Err(PipelineError::configuration(
                "training.n_iter must be at least 1",
            ));
        }
        if self.cv_folds < 2 {
            return Err(PipelineError::configuration(
                "training.cv_folds must be at least 2",
            ));
        }
        self.param_space.validate()
    }
}

impl ParamSpace {
    fn validate(&self) -> Result<()> {
        for (name, values) in [
            ("n_estimators", &self.n_estimators),
            ("max_depth", &self.max_depth),
            ("min_samples_leaf", &self.min_samples_leaf),
        ] {
            if values.is_empty() {
                return Err(PipelineError::configuration(format!(
                    "training.param_space.{name} must not be empty"
                )));
            }
        }
        for (name, range) in [
            ("learning_rate", self.learning_rate),
            ("subsample", self.subsample),
        ] {
            if !(range.low.is_finite() && range.high.is_finite()) || range.low > range.high {
                return Err(PipelineError::configuration(format!(
                    "training.param_space.{name} range is invalid ({} .. {})",
                    range.low, range.high
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    fn minimal_yaml() -> &'static str {
        r"
data_ingestion:
  bucket_name: reserva-data
  bucket_file_name: reservations.csv
  train_ratio: 0.8
data_processing:
  categorical_features: [type_of_meal_plan, room_type_reserved]
  numerical_features: [lead_time, avg_price_per_room]
  skewness_threshold: 5.0
  num_of_features_to_select: 3
"
    }

    #[test]
    fn loads_minimal_config_with_training_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(minimal_yaml().as_bytes()).expect("write");
        let config = load_config(file.path()).expect("load");
        assert_eq!(config.data_ingestion.train_ratio, 0.8);
        assert_eq!(config.data_processing.label_column, DEFAULT_LABEL_COLUMN);
        assert_eq!(config.training.cv_folds, 5);
        assert_eq!(config.training.random_state, 42);
        assert_eq!(config.training.param_space.n_estimators, vec![100, 200, 300]);
    }

    #[test]
    fn missing_required_key_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"data_ingestion:\n  bucket_name: only\n")
            .expect("write");
        let err = load_config(file.path()).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let err = load_config(Path::new("/nonexistent/config.yaml")).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn rejects_out_of_range_train_ratio() {
        let yaml = minimal_yaml().replace("0.8", "1.2");
        let config: PipelineConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = config.validate().expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn rejects_overlapping_role_sets() {
        let yaml = minimal_yaml().replace("lead_time", "type_of_meal_plan");
        let config: PipelineConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = config.validate().expect_err("must fail");
        assert!(err.to_string().contains("type_of_meal_plan"));
    }

    #[test]
    fn rejects_label_in_feature_lists() {
        let yaml = minimal_yaml().replace("lead_time", "booking_status");
        let config: PipelineConfig = serde_yaml::from_str(&yaml).expect("parse");
        assert!(config.validate().is_err());
    }
}
