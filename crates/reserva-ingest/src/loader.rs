//! CSV table loading and writing through polars.

use std::fs::{self, File};
use std::path::Path;

use polars::prelude::{CsvReadOptions, CsvWriter, DataFrame, SerReader, SerWriter};

use reserva_model::{PipelineError, Result};

/// Read a headered CSV file into a DataFrame. A missing file is an
/// ingestion error, not a panic.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PipelineError::ingestion(format!(
            "table file {} does not exist",
            path.display()
        )));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|err| {
            PipelineError::ingestion(format!("cannot open {}", path.display())).with_source(err)
        })?
        .finish()
        .map_err(|err| {
            PipelineError::ingestion(format!("cannot parse {}", path.display())).with_source(err)
        })?;
    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "table loaded"
    );
    Ok(df)
}

/// Write a DataFrame as a headered CSV artifact, creating parent
/// directories as needed.
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            PipelineError::persistence(format!("cannot create directory {}", parent.display()))
                .with_source(err)
        })?;
    }
    let mut file = File::create(path).map_err(|err| {
        PipelineError::persistence(format!("cannot create {}", path.display())).with_source(err)
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|err| {
            PipelineError::persistence(format!("cannot write {}", path.display())).with_source(err)
        })?;
    tracing::debug!(path = %path.display(), rows = df.height(), "table written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserva_model::ErrorKind;
    use std::io::Write;

    #[test]
    fn loads_what_it_wrote() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/table.csv");
        let mut source = File::create(dir.path().join("source.csv")).expect("create");
        source.write_all(b"a,b\n1,x\n2,y\n").expect("write");
        let mut df = load_table(&dir.path().join("source.csv")).expect("load");

        write_table(&mut df, &path).expect("write");
        let round = load_table(&path).expect("reload");
        assert_eq!(round.height(), 2);
        assert_eq!(round.width(), 2);
    }

    #[test]
    fn missing_file_is_an_ingestion_error() {
        let err = load_table(Path::new("/nonexistent/raw.csv")).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Ingestion);
    }
}
