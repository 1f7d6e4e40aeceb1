//! Model artifact persistence.
//!
//! The fitted classifier is serialized as JSON at the configured path.
//! Persistence is a one-way side effect: on failure the run is failed,
//! but the in-memory model stays valid for the caller.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use reserva_learn::GbdtClassifier;
use reserva_model::{PipelineError, Result};

/// A persisted model: where it landed and the digest of its bytes.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub path: PathBuf,
    pub sha256: String,
}

/// Serialize the model to `path`, creating parent directories as
/// needed.
pub fn save_model(model: &GbdtClassifier, path: &Path) -> Result<ModelArtifact> {
    let body = serde_json::to_vec_pretty(model)
        .map_err(|err| PipelineError::persistence("cannot serialize model").with_source(err))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            PipelineError::persistence(format!("cannot create directory {}", parent.display()))
                .with_source(err)
        })?;
    }
    fs::write(path, &body).map_err(|err| {
        PipelineError::persistence(format!("cannot write model to {}", path.display()))
            .with_source(err)
    })?;
    let sha256 = hex::encode(Sha256::digest(&body));
    tracing::info!(path = %path.display(), %sha256, "model persisted");
    Ok(ModelArtifact {
        path: path.to_path_buf(),
        sha256,
    })
}

/// Reload a persisted model.
pub fn load_model(path: &Path) -> Result<GbdtClassifier> {
    let body = fs::read(path).map_err(|err| {
        PipelineError::persistence(format!("cannot read model from {}", path.display()))
            .with_source(err)
    })?;
    serde_json::from_slice(&body).map_err(|err| {
        PipelineError::persistence(format!("model file {} is corrupt", path.display()))
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserva_learn::GbdtParams;
    use reserva_model::ErrorKind;

    fn fitted_model() -> GbdtClassifier {
        let x = vec![vec![0.0], vec![1.0], vec![5.0], vec![6.0]];
        let y = vec![0, 0, 1, 1];
        let params = GbdtParams {
            n_estimators: 5,
            min_samples_leaf: 1,
            ..GbdtParams::default()
        };
        GbdtClassifier::fit(&x, &y, &["x".to_string()], &params, 42).expect("fit")
    }

    #[test]
    fn round_trips_through_disk_with_parent_creation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model/nested/model.json");
        let model = fitted_model();

        let artifact = save_model(&model, &path).expect("save");
        assert!(path.is_file());
        assert_eq!(artifact.sha256.len(), 64);

        let reloaded = load_model(&path).expect("load");
        assert_eq!(reloaded, model);
        assert_eq!(reloaded.predict_row(&[0.5]), 0);
        assert_eq!(reloaded.predict_row(&[5.5]), 1);
    }

    #[test]
    fn corrupt_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        fs::write(&path, b"not json").expect("write");
        let err = load_model(&path).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }
}
