//! Importance-based feature selection.

use polars::prelude::DataFrame;

use reserva_ingest::to_feature_matrix;
use reserva_learn::{ForestClassifier, ForestConfig};
use reserva_model::{FeatureSchema, PipelineError, Result};

use crate::has_column;

/// Rank features with a seeded bagged-forest fit and keep the top `k`.
///
/// Returns the projected training table and the selected schema
/// (features importance-descending, label appended last). Importance
/// ties break on original column order, so reruns with the same seed
/// and input select the same list in the same order.
pub fn select_features(
    df: &DataFrame,
    label_column: &str,
    k: usize,
    seed: u64,
) -> Result<(DataFrame, FeatureSchema)> {
    let matrix = to_feature_matrix(df, label_column).map_err(|err| {
        PipelineError::feature_selection("feature selection requires a fully numeric table")
            .with_source(err)
    })?;
    if k > matrix.n_features() {
        return Err(PipelineError::feature_selection(format!(
            "cannot select {k} features, table has only {}",
            matrix.n_features()
        )));
    }

    let config = ForestConfig {
        seed,
        ..ForestConfig::default()
    };
    let forest = ForestClassifier::fit(&matrix.rows, &matrix.labels, &config)
        .map_err(|err| {
            PipelineError::feature_selection("cannot fit ranking forest").with_source(err)
        })?;
    let importances = forest.feature_importances();

    let mut order: Vec<usize> = (0..matrix.n_features()).collect();
    order.sort_by(|&a, &b| importances[b].total_cmp(&importances[a]).then(a.cmp(&b)));

    let selected: Vec<String> = order[..k]
        .iter()
        .map(|&idx| matrix.feature_names[idx].clone())
        .collect();
    tracing::info!(k, features = ?selected, "top features selected by importance");
    for &idx in &order[..k] {
        tracing::debug!(
            feature = %matrix.feature_names[idx],
            importance = importances[idx],
            "feature importance"
        );
    }

    let schema = FeatureSchema::new(selected, label_column);
    let projected = apply_schema(df, &schema)?;
    Ok((projected, schema))
}

/// Project a table onto a selected schema: exactly the schema's
/// columns, in schema order, everything else dropped. A missing
/// selected column is a schema error.
pub fn apply_schema(df: &DataFrame, schema: &FeatureSchema) -> Result<DataFrame> {
    for column in schema.columns() {
        if !has_column(df, column) {
            return Err(PipelineError::schema(
                column,
                "selected feature missing from table",
            ));
        }
    }
    df.select(schema.columns()).map_err(|err| {
        PipelineError::feature_selection("cannot project table onto selected schema")
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, NamedFrom, Series};
    use reserva_model::ErrorKind;

    /// `signal` predicts the label perfectly, `noise` is constant,
    /// `mild` is weakly informative.
    fn frame() -> DataFrame {
        let n = 30usize;
        let signal: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 0.0 } else { 10.0 }).collect();
        let mild: Vec<f64> = (0..n).map(|i| f64::from((i % 3) as u8)).collect();
        let noise: Vec<f64> = vec![1.0; n];
        let y: Vec<i64> = (0..n).map(|i| (i % 2) as i64).collect();
        let columns: Vec<Column> = vec![
            Series::new("noise".into(), noise).into(),
            Series::new("signal".into(), signal).into(),
            Series::new("mild".into(), mild).into(),
            Series::new("y".into(), y).into(),
        ];
        DataFrame::new(columns).expect("frame")
    }

    #[test]
    fn selects_k_features_with_label_last() {
        let (selected, schema) = select_features(&frame(), "y", 2, 42).expect("select");
        assert_eq!(schema.features().len(), 2);
        assert_eq!(schema.columns().last(), Some(&"y"));
        assert_eq!(selected.width(), 3);
        assert_eq!(
            selected
                .get_column_names()
                .iter()
                .map(|name| name.as_str())
                .collect::<Vec<_>>(),
            schema.columns()
        );
    }

    #[test]
    fn perfect_predictor_ranks_first() {
        let (_, schema) = select_features(&frame(), "y", 1, 42).expect("select");
        assert_eq!(schema.features(), &["signal".to_string()]);
    }

    #[test]
    fn rerun_selects_identical_schema() {
        let (_, schema_a) = select_features(&frame(), "y", 2, 7).expect("select");
        let (_, schema_b) = select_features(&frame(), "y", 2, 7).expect("select");
        assert_eq!(schema_a, schema_b);
    }

    #[test]
    fn k_beyond_feature_count_fails() {
        let err = select_features(&frame(), "y", 4, 42).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::FeatureSelection);
    }

    #[test]
    fn missing_label_fails() {
        let err = select_features(&frame(), "absent", 1, 42).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::FeatureSelection);
    }

    #[test]
    fn schema_application_reorders_and_drops_extras() {
        let schema = FeatureSchema::new(vec!["mild".to_string(), "signal".to_string()], "y");
        let projected = apply_schema(&frame(), &schema).expect("apply");
        assert_eq!(
            projected
                .get_column_names()
                .iter()
                .map(|name| name.as_str())
                .collect::<Vec<_>>(),
            vec!["mild", "signal", "y"]
        );
    }

    #[test]
    fn schema_application_fails_on_missing_column() {
        let schema = FeatureSchema::new(vec!["gone".to_string()], "y");
        let err = apply_schema(&frame(), &schema).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
