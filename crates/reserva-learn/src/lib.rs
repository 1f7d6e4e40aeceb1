//! Reserva tree learners.
//!
//! Self-contained, deterministic tree models for the pipeline: CART
//! split search, a bagged forest used for feature ranking, and the
//! gradient-boosted binary classifier the trainer searches over. All
//! randomness flows through seeded `StdRng` instances so refitting
//! from the same inputs reproduces the same model.

pub mod forest;
pub mod gbdt;
pub mod tree;

use thiserror::Error;

pub use forest::{ForestClassifier, ForestConfig};
pub use gbdt::{GbdtClassifier, GbdtParams};
pub use tree::{Node, Tree, TreeConfig};

/// Fitting failures. These indicate caller bugs or degenerate inputs,
/// and are wrapped into the stage taxonomy by the calling crate.
#[derive(Debug, Error)]
pub enum LearnError {
    #[error("dataset is empty")]
    EmptyDataset,
    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("labels contain a single class; at least two are required")]
    SingleClass,
    #[error("binary classifier got label {found}; labels must be 0 or 1")]
    NonBinaryLabel { found: u32 },
}
