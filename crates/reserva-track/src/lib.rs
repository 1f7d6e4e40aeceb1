//! Reserva experiment tracking.
//!
//! The trainer logs dataset identities, hyperparameters, metrics, and
//! artifacts to an [`ExperimentTracker`] scoped to one run. Tracking is
//! observability, not pipeline state: callers route every call through
//! [`log_or_warn`], so an unreachable tracker degrades to warnings and
//! never fails a training run.

pub mod fs;

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use reserva_model::MetricsRecord;

pub use fs::FsTracker;

/// Tracker-side failures. Deliberately separate from the pipeline
/// error taxonomy: these are reported, not propagated.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("no active run; call begin_run first")]
    NoActiveRun,
    #[error("a run is already active")]
    RunAlreadyActive,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One-run-at-a-time experiment logging.
///
/// The run boundary wraps the whole training + evaluation + persistence
/// sequence: `begin_run`, any number of `log_*` calls, `end_run`.
pub trait ExperimentTracker {
    fn begin_run(&mut self) -> Result<(), TrackerError>;
    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<(), TrackerError>;
    fn log_metrics(&mut self, metrics: &MetricsRecord) -> Result<(), TrackerError>;
    /// Attach a file to the run under a category (e.g. "datasets",
    /// "model").
    fn log_artifact(&mut self, path: &Path, category: &str) -> Result<(), TrackerError>;
    fn end_run(&mut self) -> Result<(), TrackerError>;
}

/// A tracker that records nothing. Used by dry runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracker;

impl ExperimentTracker for NoopTracker {
    fn begin_run(&mut self) -> Result<(), TrackerError> {
        Ok(())
    }

    fn log_params(&mut self, _params: &BTreeMap<String, String>) -> Result<(), TrackerError> {
        Ok(())
    }

    fn log_metrics(&mut self, _metrics: &MetricsRecord) -> Result<(), TrackerError> {
        Ok(())
    }

    fn log_artifact(&mut self, _path: &Path, _category: &str) -> Result<(), TrackerError> {
        Ok(())
    }

    fn end_run(&mut self) -> Result<(), TrackerError> {
        Ok(())
    }
}

/// Swallow a tracker failure with a warning. Tracking is best-effort
/// and must not abort the run.
pub fn log_or_warn(result: Result<(), TrackerError>, operation: &str) {
    if let Err(error) = result {
        tracing::warn!(%error, operation, "experiment tracking failed; run continues");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_or_warn_swallows_failures() {
        log_or_warn(Err(TrackerError::NoActiveRun), "log_metrics");
        log_or_warn(Ok(()), "log_metrics");
    }
}
