//! Table cleaning and feature transformation.
//!
//! The preprocessor drops identifier columns, removes duplicate rows,
//! encodes categorical columns to dense integer codes, and corrects
//! heavily skewed numeric columns with a log(1+x) transform.
//!
//! Encodings are fitted on the training table only and returned to the
//! caller; the test table replays them verbatim and a category unseen
//! at fit time fails the run. Skewness is a per-table statistic, so
//! each table decides its own log transforms against the shared
//! threshold.

use std::collections::HashSet;

use polars::prelude::{AnyValue, DataFrame, DataType, NamedFrom, Series, UInt32Chunked};

use reserva_ingest::{any_to_string, numeric_column};
use reserva_model::{CategoryMap, Encodings, PipelineError, ProcessingConfig, Result};

use crate::has_column;

/// Cleans and transforms one table according to the configured column
/// roles.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: ProcessingConfig,
}

impl Preprocessor {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Preprocess the training table: clean, fit-and-apply categorical
    /// encodings, skew-correct. Returns the transformed table and the
    /// fitted encodings for replay on the test table.
    pub fn fit_transform(&self, df: DataFrame) -> Result<(DataFrame, Encodings)> {
        let mut df = self.clean(df)?;

        let mut encodings = Encodings::default();
        for column in self.columns_to_encode(&df)? {
            let values = string_column(&df, &column);
            let map = CategoryMap::fit(values.iter().cloned());
            tracing::info!(
                column = %column,
                distinct = map.len(),
                "categorical column encoded"
            );
            tracing::debug!(column = %column, mapping = ?map, "encoding fitted");
            apply_encoding(&mut df, &column, &values, &map)?;
            encodings.insert(column, map);
        }

        let df = self.skew_correct(df)?;
        Ok((df, encodings))
    }

    /// Preprocess the test table, replaying the training-derived
    /// encodings. Every encoded column must exist and every category
    /// must have been seen at fit time.
    pub fn transform_with(&self, df: DataFrame, encodings: &Encodings) -> Result<DataFrame> {
        let mut df = self.clean(df)?;

        for (column, map) in encodings.iter() {
            if !has_column(&df, column) {
                return Err(PipelineError::schema(column, "missing from table to encode"));
            }
            let values = string_column(&df, column);
            apply_encoding(&mut df, column, &values, map)?;
        }

        self.skew_correct(df)
    }

    /// Drop identifier columns and exact duplicate rows.
    fn clean(&self, df: DataFrame) -> Result<DataFrame> {
        let mut df = df;
        for column in &self.config.id_columns {
            if !has_column(&df, column) {
                return Err(PipelineError::schema(
                    column,
                    "identifier column missing from raw table",
                ));
            }
            df = df.drop(column).map_err(|err| {
                PipelineError::preprocessing(format!("cannot drop column `{column}`"))
                    .with_source(err)
            })?;
        }

        // Row-wise full-equality dedup, first occurrence kept.
        let before = df.height();
        let mut seen = HashSet::with_capacity(before);
        let mut keep: Vec<u32> = Vec::with_capacity(before);
        for row in 0..before {
            let key = df
                .get_columns()
                .iter()
                .map(|column| any_to_string(column.get(row).unwrap_or(AnyValue::Null)))
                .collect::<Vec<_>>()
                .join("\u{1f}");
            if seen.insert(key) {
                keep.push(row as u32);
            }
        }
        if keep.len() < before {
            let idx = UInt32Chunked::from_vec("row".into(), keep);
            df = df.take(&idx).map_err(|err| {
                PipelineError::preprocessing("cannot drop duplicate rows").with_source(err)
            })?;
            tracing::info!(dropped = before - df.height(), "duplicate rows removed");
        }
        Ok(df)
    }

    /// The categorical feature columns, plus the label column when its
    /// values are strings (class names encode like any other category).
    fn columns_to_encode(&self, df: &DataFrame) -> Result<Vec<String>> {
        let mut columns = Vec::with_capacity(self.config.categorical_features.len() + 1);
        for column in &self.config.categorical_features {
            if !has_column(df, column) {
                return Err(PipelineError::schema(
                    column,
                    "categorical column missing from table",
                ));
            }
            columns.push(column.clone());
        }
        let label = &self.config.label_column;
        if !has_column(df, label) {
            return Err(PipelineError::schema(label, "label column missing from table"));
        }
        let label_dtype = df
            .column(label)
            .map_err(|err| {
                PipelineError::preprocessing(format!("cannot access label column `{label}`"))
                    .with_source(err)
            })?
            .dtype()
            .clone();
        if label_dtype == DataType::String {
            columns.push(label.clone());
        }
        Ok(columns)
    }

    /// Apply log(1+x) to each numeric column whose sample skewness
    /// exceeds the configured threshold.
    fn skew_correct(&self, df: DataFrame) -> Result<DataFrame> {
        let mut df = df;
        let threshold = self.config.skewness_threshold;
        for column in &self.config.numerical_features {
            if !has_column(&df, column) {
                return Err(PipelineError::schema(
                    column,
                    "numerical column missing from table",
                ));
            }
            let values = numeric_column(&df, column).map_err(|err| {
                PipelineError::preprocessing(format!(
                    "cannot read numerical column `{column}`"
                ))
                .with_source(err)
            })?;
            let skew = sample_skewness(&values);
            if skew.abs() <= threshold {
                continue;
            }
            if values.iter().any(|&v| v <= -1.0) {
                return Err(PipelineError::preprocessing(format!(
                    "column `{column}` is skewed ({skew:.3}) but contains values <= -1, \
                     log(1+x) is undefined"
                )));
            }
            let transformed: Vec<f64> = values.iter().map(|&v| v.ln_1p()).collect();
            df.with_column(Series::new(column.as_str().into(), transformed))
                .map_err(|err| {
                    PipelineError::preprocessing(format!(
                        "cannot replace skew-corrected column `{column}`"
                    ))
                    .with_source(err)
                })?;
            tracing::info!(column = %column, skew, "log transform applied to skewed column");
        }
        Ok(df)
    }
}

/// Replace a column's values with their integer codes.
fn apply_encoding(
    df: &mut DataFrame,
    column: &str,
    values: &[String],
    map: &CategoryMap,
) -> Result<()> {
    let mut codes = Vec::with_capacity(values.len());
    for value in values {
        match map.code(value) {
            Some(code) => codes.push(code),
            None => {
                return Err(PipelineError::preprocessing(format!(
                    "column `{column}` has category `{value}` unseen at fit time"
                )));
            }
        }
    }
    df.with_column(Series::new(column.into(), codes))
        .map_err(|err| {
            PipelineError::preprocessing(format!("cannot replace encoded column `{column}`"))
                .with_source(err)
        })?;
    Ok(())
}

/// Every cell of a column in its canonical string form.
fn string_column(df: &DataFrame, name: &str) -> Vec<String> {
    let Ok(column) = df.column(name) else {
        return Vec::new();
    };
    (0..df.height())
        .map(|row| any_to_string(column.get(row).unwrap_or(AnyValue::Null)))
        .collect()
}

/// Bias-adjusted Fisher-Pearson sample skewness (the statistic pandas
/// reports). Zero for fewer than three values or zero variance.
pub fn sample_skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean = values.iter().sum::<f64>() / n_f;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n_f;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n_f;
    if m2 == 0.0 {
        return 0.0;
    }
    let g1 = m3 / m2.powf(1.5);
    g1 * (n_f * (n_f - 1.0)).sqrt() / (n_f - 2.0)
}
