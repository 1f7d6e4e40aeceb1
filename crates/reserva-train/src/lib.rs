//! Reserva model training.
//!
//! Randomized hyperparameter search with K-fold cross-validation over
//! the boosted classifier, held-out evaluation, JSON model persistence
//! with a content digest, and the trainer orchestration that reports
//! each run to the experiment tracker.

pub mod metrics;
pub mod persist;
pub mod search;
pub mod trainer;

pub use metrics::{ConfusionCounts, compute_metrics, confusion_counts, evaluate};
pub use persist::{ModelArtifact, load_model, save_model};
pub use search::{SearchOutcome, random_search, sample_params};
pub use trainer::ModelTrainer;
