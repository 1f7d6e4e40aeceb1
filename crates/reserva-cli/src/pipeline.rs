//! Pipeline orchestration.
//!
//! Runs the stages in order: download → load → split → preprocess
//! (train fit, test replay) → balance (train only) → select features
//! (train; schema applied to test) → train/evaluate/persist. Any stage
//! error aborts the run; artifacts written before the failure stay on
//! disk.

use std::path::PathBuf;

use reserva_ingest::{DirBucket, HttpBucket, ObjectStore, load_table, split_table, write_table};
use reserva_model::{ArtifactLayout, MetricsRecord, PipelineError, Result, load_config};
use reserva_track::FsTracker;
use reserva_train::ModelTrainer;
use reserva_transform::{Preprocessor, apply_schema, balance, select_features};

use crate::cli::RunArgs;

/// What one pipeline run produced, for the operator summary.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub raw_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub balanced_rows: usize,
    pub selected_features: Vec<String>,
    pub metrics: MetricsRecord,
    pub model_path: PathBuf,
    pub artifacts_root: PathBuf,
}

/// Execute the full retraining pipeline.
pub fn run_pipeline(args: &RunArgs) -> Result<RunSummary> {
    let config = load_config(&args.config)?;
    let layout = ArtifactLayout::new(&args.artifacts_dir);
    let store = bucket_store(args)?;

    let ingestion = &config.data_ingestion;
    store.download(
        &ingestion.bucket_name,
        &ingestion.bucket_file_name,
        &layout.raw_file(),
    )?;
    let raw = load_table(&layout.raw_file())?;
    let raw_rows = raw.height();

    let seed = config.training.random_state;
    let (mut train, mut test) = split_table(&raw, ingestion.train_ratio, seed)?;
    let split_train_rows = train.height();
    let split_test_rows = test.height();
    write_table(&mut train, &layout.train_file())?;
    write_table(&mut test, &layout.test_file())?;

    let processing = &config.data_processing;
    let label = processing.label_column.clone();
    let preprocessor = Preprocessor::new(processing.clone());
    let (train, encodings) = preprocessor.fit_transform(train)?;
    let test = preprocessor.transform_with(test, &encodings)?;

    let balanced = balance(&train, &label, seed)?;
    let balanced_rows = balanced.height();

    let (mut train_selected, schema) = select_features(
        &balanced,
        &label,
        processing.num_of_features_to_select,
        seed,
    )?;
    let mut test_selected = apply_schema(&test, &schema)?;
    let processed_train = layout.processed_train_file();
    let processed_test = layout.processed_test_file();
    write_table(&mut train_selected, &processed_train)?;
    write_table(&mut test_selected, &processed_test)?;

    let mut tracker = FsTracker::new(layout.runs_dir());
    let trainer = ModelTrainer::new(config.training.clone(), layout.model_file());
    let metrics = trainer.run(
        &train_selected,
        &test_selected,
        &label,
        &[processed_train.as_path(), processed_test.as_path()],
        &mut tracker,
    )?;

    Ok(RunSummary {
        raw_rows,
        train_rows: split_train_rows,
        test_rows: split_test_rows,
        balanced_rows,
        selected_features: schema.features().to_vec(),
        metrics,
        model_path: layout.model_file(),
        artifacts_root: layout.root().to_path_buf(),
    })
}

/// Pick the bucket collaborator from the CLI flags.
fn bucket_store(args: &RunArgs) -> Result<Box<dyn ObjectStore>> {
    if let Some(endpoint) = &args.bucket_endpoint {
        return Ok(Box::new(HttpBucket::new(endpoint.clone())));
    }
    if let Some(root) = &args.bucket_root {
        return Ok(Box::new(DirBucket::new(root)));
    }
    Err(PipelineError::configuration(
        "no bucket source: pass --bucket-root or --bucket-endpoint",
    ))
}
