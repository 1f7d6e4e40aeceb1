//! Reserva data ingestion.
//!
//! Fetches the raw reservations table from an object bucket, loads CSV
//! files into polars DataFrames, performs the deterministic train/test
//! split, and provides the cell-access and matrix-conversion helpers
//! the numeric stages build on.

pub mod bucket;
pub mod frame;
pub mod loader;
pub mod split;
pub mod values;

pub use bucket::{DirBucket, HttpBucket, ObjectStore};
pub use frame::{
    FeatureMatrix, FrameError, from_feature_matrix, label_column, numeric_column,
    to_feature_matrix,
};
pub use loader::{load_table, write_table};
pub use split::split_table;
pub use values::{any_to_f64, any_to_string, format_numeric, parse_f64};
