//! Training-stage orchestration.
//!
//! Fit (randomized search + refit), evaluate on the held-out table,
//! persist the model, and report everything to the experiment tracker.
//! The first failing step aborts the remainder; tracker calls are
//! best-effort and never abort anything.

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;

use reserva_ingest::to_feature_matrix;
use reserva_model::{MetricsRecord, Result, PipelineError, TrainingConfig};
use reserva_track::{ExperimentTracker, log_or_warn};

use crate::metrics::evaluate;
use crate::persist::save_model;
use crate::search::random_search;

/// Runs the train → evaluate → persist sequence for one retraining.
#[derive(Debug)]
pub struct ModelTrainer {
    config: TrainingConfig,
    model_path: PathBuf,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig, model_path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            model_path: model_path.into(),
        }
    }

    /// Train on `train_df`, evaluate on `test_df`, persist the model,
    /// and return the metrics record. `dataset_files` are the on-disk
    /// tables logged to the tracker for run identification.
    pub fn run(
        &self,
        train_df: &DataFrame,
        test_df: &DataFrame,
        label_column: &str,
        dataset_files: &[&Path],
        tracker: &mut dyn ExperimentTracker,
    ) -> Result<MetricsRecord> {
        log_or_warn(tracker.begin_run(), "begin_run");
        for dataset in dataset_files {
            log_or_warn(tracker.log_artifact(dataset, "datasets"), "log_artifact");
        }

        tracing::info!(
            rows = train_df.height(),
            n_iter = self.config.n_iter,
            cv_folds = self.config.cv_folds,
            "fitting: randomized hyperparameter search"
        );
        let matrix = to_feature_matrix(train_df, label_column).map_err(|err| {
            PipelineError::training("training table is not fully numeric").with_source(err)
        })?;
        let outcome = random_search(&matrix, &self.config)?;

        tracing::info!("evaluating: scoring the refit model on the held-out table");
        let metrics = evaluate(&outcome.model, test_df, label_column)?;

        tracing::info!(path = %self.model_path.display(), "persisting model artifact");
        let artifact = save_model(&outcome.model, &self.model_path)?;

        let mut params = outcome.best_params.to_map();
        params.insert(
            "cv_best_score".to_string(),
            format!("{:.6}", outcome.best_score),
        );
        params.insert("model_sha256".to_string(), artifact.sha256.clone());
        log_or_warn(tracker.log_artifact(&artifact.path, "model"), "log_artifact");
        log_or_warn(tracker.log_params(&params), "log_params");
        log_or_warn(tracker.log_metrics(&metrics), "log_metrics");
        log_or_warn(tracker.end_run(), "end_run");

        tracing::info!(%metrics, "training stage complete");
        Ok(metrics)
    }
}
