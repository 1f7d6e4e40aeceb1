//! Reserva feature preparation.
//!
//! Everything between the raw split tables and the trainer: cleaning
//! and encoding (fitted on train, replayed on test), skew correction,
//! SMOTE class balancing, and importance-based feature selection with
//! schema propagation onto the test table.

pub mod balance;
pub mod preprocess;
pub mod select;

use polars::prelude::DataFrame;

pub use balance::balance;
pub use preprocess::{Preprocessor, sample_skewness};
pub use select::{apply_schema, select_features};

/// True if the table has a column with this exact name.
pub(crate) fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names()
        .iter()
        .any(|column| column.as_str() == name)
}
