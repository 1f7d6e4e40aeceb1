//! DataFrame to feature-matrix conversion.
//!
//! The numeric stages (balancing, selection, training) work on an
//! owned row-major matrix plus a label vector; this module converts a
//! fully-encoded DataFrame into that form and back. Feature order is
//! the DataFrame column order with the label removed, which downstream
//! tie-breaking relies on.

use polars::prelude::{AnyValue, Column, DataFrame, NamedFrom, PolarsResult, Series};
use thiserror::Error;

use crate::values::any_to_f64;

/// Conversion failures surfaced to the calling stage for wrapping.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("column `{0}` is missing from the table")]
    MissingColumn(String),
    #[error("column `{column}` has a non-numeric value at row {row}")]
    NonNumeric { column: String, row: usize },
    #[error("label column `{column}` has a non-class value at row {row}")]
    BadLabel { column: String, row: usize },
}

/// Row-major numeric view of a table: features plus integer class labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u32>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Extract every numeric value of one column.
pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>, FrameError> {
    let column = df
        .column(name)
        .map_err(|_| FrameError::MissingColumn(name.to_string()))?;
    let mut values = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let value = column.get(row).unwrap_or(AnyValue::Null);
        match any_to_f64(value) {
            Some(v) => values.push(v),
            None => {
                return Err(FrameError::NonNumeric {
                    column: name.to_string(),
                    row,
                });
            }
        }
    }
    Ok(values)
}

/// Extract the label column as integer class codes.
pub fn label_column(df: &DataFrame, name: &str) -> Result<Vec<u32>, FrameError> {
    let values = numeric_column(df, name)?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            if v.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&v) {
                Ok(v as u32)
            } else {
                Err(FrameError::BadLabel {
                    column: name.to_string(),
                    row,
                })
            }
        })
        .collect()
}

/// Convert a fully-numeric table into a [`FeatureMatrix`]. Feature
/// order follows the table's column order, label excluded.
pub fn to_feature_matrix(df: &DataFrame, label: &str) -> Result<FeatureMatrix, FrameError> {
    let feature_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .filter(|name| name != label)
        .collect();
    if !df.get_column_names().iter().any(|name| name.as_str() == label) {
        return Err(FrameError::MissingColumn(label.to_string()));
    }

    let mut columns = Vec::with_capacity(feature_names.len());
    for name in &feature_names {
        columns.push(numeric_column(df, name)?);
    }
    let labels = label_column(df, label)?;

    let mut rows = vec![Vec::with_capacity(feature_names.len()); df.height()];
    for column in &columns {
        for (row, value) in column.iter().enumerate() {
            rows[row].push(*value);
        }
    }

    Ok(FeatureMatrix {
        feature_names,
        rows,
        labels,
    })
}

/// Rebuild a DataFrame from a matrix: one f64 column per feature, the
/// label appended last as u32 codes.
pub fn from_feature_matrix(matrix: &FeatureMatrix, label: &str) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(matrix.n_features() + 1);
    for (idx, name) in matrix.feature_names.iter().enumerate() {
        let values: Vec<f64> = matrix.rows.iter().map(|row| row[idx]).collect();
        columns.push(Series::new(name.as_str().into(), values).into());
    }
    columns.push(Series::new(label.into(), matrix.labels.clone()).into());
    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        let columns: Vec<Column> = vec![
            Series::new("a".into(), vec![1.0f64, 2.0, 3.0]).into(),
            Series::new("b".into(), vec![10i64, 20, 30]).into(),
            Series::new("y".into(), vec![0i64, 1, 0]).into(),
        ];
        DataFrame::new(columns).expect("frame")
    }

    #[test]
    fn matrix_keeps_column_order_and_labels() {
        let matrix = to_feature_matrix(&sample_frame(), "y").expect("matrix");
        assert_eq!(matrix.feature_names, vec!["a", "b"]);
        assert_eq!(matrix.rows, vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]]);
        assert_eq!(matrix.labels, vec![0, 1, 0]);
    }

    #[test]
    fn missing_label_is_reported() {
        let err = to_feature_matrix(&sample_frame(), "missing").expect_err("must fail");
        assert!(matches!(err, FrameError::MissingColumn(name) if name == "missing"));
    }

    #[test]
    fn non_numeric_cell_is_reported_with_position() {
        let columns: Vec<Column> = vec![
            Series::new("a".into(), vec!["1", "x"]).into(),
            Series::new("y".into(), vec![0i64, 1]).into(),
        ];
        let df = DataFrame::new(columns).expect("frame");
        let err = to_feature_matrix(&df, "y").expect_err("must fail");
        assert!(matches!(
            err,
            FrameError::NonNumeric { ref column, row: 1 } if column == "a"
        ));
    }

    #[test]
    fn round_trips_through_dataframe() {
        let matrix = to_feature_matrix(&sample_frame(), "y").expect("matrix");
        let df = from_feature_matrix(&matrix, "y").expect("frame");
        let round = to_feature_matrix(&df, "y").expect("matrix again");
        assert_eq!(round, matrix);
    }
}
