//! Pipeline error taxonomy.
//!
//! Every stage failure is wrapped into a [`PipelineError`] carrying the
//! stage kind, a stage-specific message, and the original cause as
//! `source`. Stages never recover or retry; they log, wrap, and
//! propagate, so a single error chain reaches the operator.

use thiserror::Error;

/// Boxed underlying cause attached to a pipeline error.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which pipeline stage (or cross-cutting concern) produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Ingestion,
    Preprocessing,
    Balancing,
    FeatureSelection,
    Training,
    Evaluation,
    Persistence,
    Configuration,
    Schema,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Ingestion => "ingestion",
            ErrorKind::Preprocessing => "preprocessing",
            ErrorKind::Balancing => "balancing",
            ErrorKind::FeatureSelection => "feature selection",
            ErrorKind::Training => "training",
            ErrorKind::Evaluation => "evaluation",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Schema => "schema",
        };
        f.write_str(name)
    }
}

/// A stage failure with its original cause attached.
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct PipelineError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Ingestion, message)
    }

    pub fn preprocessing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Preprocessing, message)
    }

    pub fn balancing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Balancing, message)
    }

    pub fn feature_selection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FeatureSelection, message)
    }

    pub fn training(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Training, message)
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Evaluation, message)
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// A configured column is absent from the table it must exist in.
    pub fn schema(column: &str, context: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Schema,
            format!("expected column `{column}`: {}", context.into()),
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_source_into_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = PipelineError::ingestion("download failed").with_source(io);
        assert_eq!(err.kind(), ErrorKind::Ingestion);
        assert_eq!(err.to_string(), "ingestion error: download failed");
        let source = std::error::Error::source(&err).expect("source attached");
        assert!(source.to_string().contains("no such file"));
    }

    #[test]
    fn schema_error_names_column() {
        let err = PipelineError::schema("Booking_ID", "missing from raw table");
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("`Booking_ID`"));
    }
}
