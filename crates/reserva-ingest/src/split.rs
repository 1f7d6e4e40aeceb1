//! Deterministic train/test split.

use polars::prelude::{DataFrame, UInt32Chunked};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use reserva_model::{PipelineError, Result};

/// Shuffle rows with a seeded RNG and split: the training table takes
/// `floor(n * train_ratio)` rows, the test table the remainder.
/// Identical input and seed reproduce identical splits.
pub fn split_table(
    df: &DataFrame,
    train_ratio: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(PipelineError::configuration(format!(
            "train_ratio must be in (0, 1), got {train_ratio}"
        )));
    }
    let n = df.height();
    let train_len = ((n as f64) * train_ratio).floor() as usize;
    if train_len == 0 || train_len == n {
        return Err(PipelineError::ingestion(format!(
            "cannot split {n} rows with train_ratio {train_ratio}: one side would be empty"
        )));
    }

    let mut indices: Vec<u32> = (0..n as u32).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_idx = UInt32Chunked::from_vec("split".into(), indices[..train_len].to_vec());
    let test_idx = UInt32Chunked::from_vec("split".into(), indices[train_len..].to_vec());
    let train = df.take(&train_idx).map_err(|err| {
        PipelineError::ingestion("cannot materialize training split").with_source(err)
    })?;
    let test = df.take(&test_idx).map_err(|err| {
        PipelineError::ingestion("cannot materialize test split").with_source(err)
    })?;
    tracing::info!(
        total = n,
        train = train.height(),
        test = test.height(),
        "table split into train/test sets"
    );
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, NamedFrom, Series};

    fn numbered_frame(n: i64) -> DataFrame {
        let columns: Vec<Column> =
            vec![Series::new("row".into(), (0..n).collect::<Vec<i64>>()).into()];
        DataFrame::new(columns).expect("frame")
    }

    #[test]
    fn twenty_rows_at_eighty_percent_split_sixteen_four() {
        let df = numbered_frame(20);
        let (train, test) = split_table(&df, 0.8, 42).expect("split");
        assert_eq!(train.height(), 16);
        assert_eq!(test.height(), 4);
    }

    #[test]
    fn same_seed_reproduces_the_split() {
        let df = numbered_frame(50);
        let (train_a, test_a) = split_table(&df, 0.7, 7).expect("split");
        let (train_b, test_b) = split_table(&df, 0.7, 7).expect("split");
        assert!(train_a.equals(&train_b));
        assert!(test_a.equals(&test_b));
    }

    #[test]
    fn different_seeds_shuffle_differently() {
        let df = numbered_frame(50);
        let (train_a, _) = split_table(&df, 0.7, 1).expect("split");
        let (train_b, _) = split_table(&df, 0.7, 2).expect("split");
        assert!(!train_a.equals(&train_b));
    }

    #[test]
    fn degenerate_ratio_is_rejected() {
        let df = numbered_frame(20);
        assert!(split_table(&df, 1.0, 42).is_err());
        assert!(split_table(&df, 0.0, 42).is_err());
    }
}
