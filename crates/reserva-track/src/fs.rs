//! Filesystem-backed experiment tracker.
//!
//! Each run becomes a directory under the runs root:
//!
//! ```text
//! runs/20260806_101500/
//!   run.json               started/ended timestamps
//!   params.json            hyperparameters of the selected model
//!   metrics.json           the four evaluation metrics
//!   artifacts/<category>/  copied artifact files
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use reserva_model::MetricsRecord;

use crate::{ExperimentTracker, TrackerError};

#[derive(Debug, Serialize)]
struct RunInfo {
    run_id: String,
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct ActiveRun {
    dir: PathBuf,
    info: RunInfo,
    params: BTreeMap<String, String>,
}

/// Tracker writing JSON files and artifact copies under a runs
/// directory.
#[derive(Debug)]
pub struct FsTracker {
    runs_dir: PathBuf,
    active: Option<ActiveRun>,
}

impl FsTracker {
    pub fn new(runs_dir: impl Into<PathBuf>) -> Self {
        Self {
            runs_dir: runs_dir.into(),
            active: None,
        }
    }

    /// Directory of the active run, if one is open.
    pub fn current_run_dir(&self) -> Option<&Path> {
        self.active.as_ref().map(|run| run.dir.as_path())
    }

    fn active_mut(&mut self) -> Result<&mut ActiveRun, TrackerError> {
        self.active.as_mut().ok_or(TrackerError::NoActiveRun)
    }

    fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<(), TrackerError> {
        let body = serde_json::to_vec_pretty(value)?;
        fs::write(dir.join(name), body)?;
        Ok(())
    }

    /// Timestamped run id, suffixed when a same-second run directory
    /// already exists.
    fn next_run_id(&self, started_at: DateTime<Utc>) -> String {
        let base = started_at.format("%Y%m%d_%H%M%S").to_string();
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.runs_dir.join(&candidate).exists() {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        candidate
    }
}

impl ExperimentTracker for FsTracker {
    fn begin_run(&mut self) -> Result<(), TrackerError> {
        if self.active.is_some() {
            return Err(TrackerError::RunAlreadyActive);
        }
        let started_at = Utc::now();
        let run_id = self.next_run_id(started_at);
        let dir = self.runs_dir.join(&run_id);
        fs::create_dir_all(&dir)?;
        let info = RunInfo {
            run_id: run_id.clone(),
            started_at,
            ended_at: None,
        };
        Self::write_json(&dir, "run.json", &info)?;
        tracing::info!(%run_id, dir = %dir.display(), "experiment run started");
        self.active = Some(ActiveRun {
            dir,
            info,
            params: BTreeMap::new(),
        });
        Ok(())
    }

    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<(), TrackerError> {
        let run = self.active_mut()?;
        run.params
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        let dir = run.dir.clone();
        let merged = run.params.clone();
        Self::write_json(&dir, "params.json", &merged)
    }

    fn log_metrics(&mut self, metrics: &MetricsRecord) -> Result<(), TrackerError> {
        let run = self.active_mut()?;
        let dir = run.dir.clone();
        Self::write_json(&dir, "metrics.json", &metrics.to_map())
    }

    fn log_artifact(&mut self, path: &Path, category: &str) -> Result<(), TrackerError> {
        let run = self.active_mut()?;
        let file_name = path
            .file_name()
            .ok_or_else(|| TrackerError::Io(std::io::Error::other("artifact has no file name")))?;
        let target_dir = run.dir.join("artifacts").join(category);
        fs::create_dir_all(&target_dir)?;
        fs::copy(path, target_dir.join(file_name))?;
        tracing::debug!(artifact = %path.display(), category, "artifact logged");
        Ok(())
    }

    fn end_run(&mut self) -> Result<(), TrackerError> {
        let mut run = self.active.take().ok_or(TrackerError::NoActiveRun)?;
        run.info.ended_at = Some(Utc::now());
        Self::write_json(&run.dir, "run.json", &run.info)?;
        tracing::info!(run_id = %run.info.run_id, "experiment run ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> MetricsRecord {
        MetricsRecord {
            accuracy: 0.9,
            precision: 0.8,
            recall: 0.7,
            f1_score: 0.75,
        }
    }

    #[test]
    fn run_directory_collects_params_metrics_and_artifacts() {
        let root = tempfile::tempdir().expect("tempdir");
        let artifact = root.path().join("model.json");
        fs::write(&artifact, b"{}").expect("artifact");

        let mut tracker = FsTracker::new(root.path().join("runs"));
        tracker.begin_run().expect("begin");
        let run_dir = tracker.current_run_dir().expect("active").to_path_buf();

        tracker
            .log_params(&BTreeMap::from([(
                "learning_rate".to_string(),
                "0.1".to_string(),
            )]))
            .expect("params");
        tracker.log_metrics(&metrics()).expect("metrics");
        tracker.log_artifact(&artifact, "model").expect("artifact");
        tracker.end_run().expect("end");

        assert!(run_dir.join("params.json").is_file());
        assert!(run_dir.join("metrics.json").is_file());
        assert!(run_dir.join("artifacts/model/model.json").is_file());
        let run_json = fs::read_to_string(run_dir.join("run.json")).expect("run.json");
        assert!(run_json.contains("ended_at"));
    }

    #[test]
    fn logging_without_a_run_fails() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut tracker = FsTracker::new(root.path());
        let err = tracker.log_metrics(&metrics()).expect_err("must fail");
        assert!(matches!(err, TrackerError::NoActiveRun));
    }

    #[test]
    fn double_begin_is_rejected() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut tracker = FsTracker::new(root.path().join("runs"));
        tracker.begin_run().expect("begin");
        assert!(matches!(
            tracker.begin_run(),
            Err(TrackerError::RunAlreadyActive)
        ));
    }
}
