//! Object-bucket collaborator.
//!
//! The pipeline only needs one operation from cloud storage: fetch one
//! object into a local file. [`ObjectStore`] keeps that seam narrow so
//! runs can point at a directory mirror, a plain HTTPS endpoint, or a
//! test fixture. Errors are wrapped as ingestion failures and never
//! retried here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reserva_model::{PipelineError, Result};

/// Downloads one object from a named bucket into a local file.
pub trait ObjectStore {
    fn download(&self, bucket: &str, object: &str, dest: &Path) -> Result<()>;
}

/// A bucket mirror on the local filesystem: `<root>/<bucket>/<object>`.
///
/// This is what the operator's offline runs and the test suite use.
#[derive(Debug, Clone)]
pub struct DirBucket {
    root: PathBuf,
}

impl DirBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ObjectStore for DirBucket {
    fn download(&self, bucket: &str, object: &str, dest: &Path) -> Result<()> {
        let source = self.root.join(bucket).join(object);
        if !source.is_file() {
            return Err(PipelineError::ingestion(format!(
                "object {object} not found in bucket {bucket} (looked at {})",
                source.display()
            )));
        }
        ensure_parent(dest)?;
        fs::copy(&source, dest).map_err(|err| {
            PipelineError::ingestion(format!(
                "cannot copy {} to {}",
                source.display(),
                dest.display()
            ))
            .with_source(err)
        })?;
        tracing::info!(bucket, object, dest = %dest.display(), "object downloaded");
        Ok(())
    }
}

/// A bucket behind a plain HTTPS endpoint: `GET <endpoint>/<bucket>/<object>`.
#[derive(Debug, Clone)]
pub struct HttpBucket {
    endpoint: String,
}

impl HttpBucket {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            endpoint.pop();
        }
        Self { endpoint }
    }
}

impl ObjectStore for HttpBucket {
    fn download(&self, bucket: &str, object: &str, dest: &Path) -> Result<()> {
        let url = format!("{}/{bucket}/{object}", self.endpoint);
        let response = ureq::get(&url).call().map_err(|err| {
            PipelineError::ingestion(format!("GET {url} failed")).with_source(err)
        })?;
        ensure_parent(dest)?;
        let mut file = fs::File::create(dest).map_err(|err| {
            PipelineError::ingestion(format!("cannot create {}", dest.display())).with_source(err)
        })?;
        let mut reader = response.into_reader();
        io::copy(&mut reader, &mut file).map_err(|err| {
            PipelineError::ingestion(format!("cannot write {}", dest.display())).with_source(err)
        })?;
        tracing::info!(%url, dest = %dest.display(), "object downloaded");
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            PipelineError::ingestion(format!("cannot create directory {}", parent.display()))
                .with_source(err)
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserva_model::ErrorKind;
    use std::io::Write;

    #[test]
    fn dir_bucket_copies_the_object() {
        let root = tempfile::tempdir().expect("tempdir");
        let bucket_dir = root.path().join("reserva-data");
        fs::create_dir_all(&bucket_dir).expect("mkdir");
        let mut file = fs::File::create(bucket_dir.join("reservations.csv")).expect("create");
        file.write_all(b"a,b\n1,2\n").expect("write");

        let dest = root.path().join("artifacts/raw/raw.csv");
        let store = DirBucket::new(root.path());
        store
            .download("reserva-data", "reservations.csv", &dest)
            .expect("download");
        assert_eq!(fs::read_to_string(dest).expect("read"), "a,b\n1,2\n");
    }

    #[test]
    fn missing_object_is_an_ingestion_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = DirBucket::new(root.path());
        let err = store
            .download("reserva-data", "missing.csv", &root.path().join("out.csv"))
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Ingestion);
    }
}
