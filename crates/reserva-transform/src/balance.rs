//! Class balancing by synthetic minority oversampling.
//!
//! For every class short of the majority count, synthetic rows are
//! interpolated between a randomly chosen class member and one of its
//! nearest same-class neighbors: `x + u * (neighbor - x)` with
//! `u ∈ [0, 1)`. The output has equal counts per class and only ever
//! grows the table. All feature columns must already be numeric, so
//! balancing runs after encoding.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use reserva_ingest::{from_feature_matrix, to_feature_matrix};
use reserva_model::{PipelineError, Result};

/// Neighbor pool size for interpolation partner selection.
const K_NEIGHBORS: usize = 5;

/// Oversample minority classes until every class matches the majority
/// count. Deterministic for a fixed seed.
pub fn balance(df: &DataFrame, label_column: &str, seed: u64) -> Result<DataFrame> {
    let matrix = to_feature_matrix(df, label_column).map_err(|err| {
        PipelineError::balancing("balancing requires a fully numeric table").with_source(err)
    })?;

    let mut by_class: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (row, &label) in matrix.labels.iter().enumerate() {
        by_class.entry(label).or_default().push(row);
    }
    if by_class.len() < 2 {
        return Err(PipelineError::balancing(format!(
            "label column `{label_column}` has {} distinct class(es); oversampling needs at least 2",
            by_class.len()
        )));
    }
    let majority = by_class.values().map(Vec::len).max().unwrap_or(0);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = matrix.rows.clone();
    let mut labels = matrix.labels.clone();

    for (&class, members) in &by_class {
        let deficit = majority - members.len();
        if deficit == 0 {
            continue;
        }
        if members.len() < 2 {
            return Err(PipelineError::balancing(format!(
                "class {class} has a single sample; cannot interpolate synthetic rows"
            )));
        }
        for _ in 0..deficit {
            let anchor = members[rng.gen_range(0..members.len())];
            let neighbor = nearest_neighbors(&matrix.rows, members, anchor)
                [rng.gen_range(0..K_NEIGHBORS.min(members.len() - 1))];
            let u: f64 = rng.r#gen();
            let synthetic: Vec<f64> = matrix.rows[anchor]
                .iter()
                .zip(&matrix.rows[neighbor])
                .map(|(&a, &b)| a + u * (b - a))
                .collect();
            rows.push(synthetic);
            labels.push(class);
        }
        tracing::info!(class, synthesized = deficit, "minority class oversampled");
    }

    let balanced = reserva_ingest::FeatureMatrix {
        feature_names: matrix.feature_names.clone(),
        rows,
        labels,
    };
    from_feature_matrix(&balanced, label_column)
        .map_err(|err| PipelineError::balancing("cannot rebuild balanced table").with_source(err))
}

/// Same-class neighbor indices of `anchor`, nearest first, self
/// excluded. Distance ties resolve by row index for determinism.
fn nearest_neighbors(rows: &[Vec<f64>], members: &[usize], anchor: usize) -> Vec<usize> {
    let mut candidates: Vec<(f64, usize)> = members
        .iter()
        .filter(|&&idx| idx != anchor)
        .map(|&idx| (squared_distance(&rows[anchor], &rows[idx]), idx))
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    candidates.into_iter().map(|(_, idx)| idx).collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| (x - y).powi(2)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, NamedFrom, Series};
    use reserva_ingest::label_column;
    use reserva_model::ErrorKind;

    fn imbalanced_frame() -> DataFrame {
        // 6 majority (class 0) vs 2 minority (class 1).
        let f1 = vec![0.0f64, 0.2, 0.4, 0.6, 0.8, 1.0, 10.0, 12.0];
        let f2 = vec![5.0f64, 5.1, 5.2, 5.3, 5.4, 5.5, 9.0, 9.5];
        let y = vec![0i64, 0, 0, 0, 0, 0, 1, 1];
        let columns: Vec<Column> = vec![
            Series::new("f1".into(), f1).into(),
            Series::new("f2".into(), f2).into(),
            Series::new("y".into(), y).into(),
        ];
        DataFrame::new(columns).expect("frame")
    }

    fn class_counts(df: &DataFrame) -> BTreeMap<u32, usize> {
        let labels = label_column(df, "y").expect("labels");
        let mut counts = BTreeMap::new();
        for label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn output_classes_are_exactly_balanced() {
        let balanced = balance(&imbalanced_frame(), "y", 42).expect("balance");
        let counts = class_counts(&balanced);
        assert_eq!(counts[&0], 6);
        assert_eq!(counts[&1], 6);
        assert_eq!(balanced.height(), 12);
    }

    #[test]
    fn synthetic_rows_stay_between_real_minority_points() {
        let df = imbalanced_frame();
        let balanced = balance(&df, "y", 42).expect("balance");
        let matrix = to_feature_matrix(&balanced, "y").expect("matrix");
        // Minority feature values span [10,12] and [9,9.5]; every
        // interpolated row must stay inside those segments.
        for (row, &label) in matrix.rows.iter().zip(&matrix.labels) {
            if label == 1 {
                assert!((10.0..=12.0).contains(&row[0]));
                assert!((9.0..=9.5).contains(&row[1]));
            }
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_table() {
        let df = imbalanced_frame();
        let a = balance(&df, "y", 9).expect("balance");
        let b = balance(&df, "y", 9).expect("balance");
        assert!(a.equals(&b));
    }

    #[test]
    fn single_class_is_a_balancing_error() {
        let columns: Vec<Column> = vec![
            Series::new("f1".into(), vec![1.0f64, 2.0]).into(),
            Series::new("y".into(), vec![0i64, 0]).into(),
        ];
        let df = DataFrame::new(columns).expect("frame");
        let err = balance(&df, "y", 42).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Balancing);
    }

    #[test]
    fn non_numeric_feature_is_a_balancing_error() {
        let columns: Vec<Column> = vec![
            Series::new("f1".into(), vec!["a", "b", "c"]).into(),
            Series::new("y".into(), vec![0i64, 1, 0]).into(),
        ];
        let df = DataFrame::new(columns).expect("frame");
        let err = balance(&df, "y", 42).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Balancing);
    }

    #[test]
    fn missing_label_is_a_balancing_error() {
        let columns: Vec<Column> = vec![Series::new("f1".into(), vec![1.0f64, 2.0]).into()];
        let df = DataFrame::new(columns).expect("frame");
        let err = balance(&df, "y", 42).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Balancing);
    }
}
