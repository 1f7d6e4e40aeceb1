//! Model evaluation.
//!
//! Binary classification metrics with label 1 as the positive class.
//! Zero-denominator precision, recall, and F1 are 0 by convention, so
//! a degenerate predictor scores 0 rather than poisoning the record
//! with NaN.

use polars::prelude::DataFrame;

use reserva_ingest::to_feature_matrix;
use reserva_learn::GbdtClassifier;
use reserva_model::{MetricsRecord, PipelineError, Result};

/// Confusion counts for the {0, 1} positive-1 convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(
            self.true_positives + self.true_negatives,
            self.total(),
        )
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Tally predictions against true labels. Any label other than 1
/// counts as negative.
pub fn confusion_counts(truth: &[u32], predicted: &[u32]) -> ConfusionCounts {
    let mut counts = ConfusionCounts::default();
    for (&actual, &guess) in truth.iter().zip(predicted) {
        match (actual == 1, guess == 1) {
            (true, true) => counts.true_positives += 1,
            (false, true) => counts.false_positives += 1,
            (true, false) => counts.false_negatives += 1,
            (false, false) => counts.true_negatives += 1,
        }
    }
    counts
}

/// The four-metric record for a prediction vector.
pub fn compute_metrics(truth: &[u32], predicted: &[u32]) -> MetricsRecord {
    let counts = confusion_counts(truth, predicted);
    MetricsRecord {
        accuracy: counts.accuracy(),
        precision: counts.precision(),
        recall: counts.recall(),
        f1_score: counts.f1(),
    }
}

/// Evaluate a fitted model on a held-out table.
///
/// The table's feature columns must match the model's training schema
/// exactly (names and order); a mismatch is an evaluation error.
pub fn evaluate(model: &GbdtClassifier, df: &DataFrame, label_column: &str) -> Result<MetricsRecord> {
    let matrix = to_feature_matrix(df, label_column).map_err(|err| {
        PipelineError::evaluation("held-out table is not fully numeric").with_source(err)
    })?;
    if matrix.feature_names != model.feature_names() {
        return Err(PipelineError::evaluation(format!(
            "held-out features {:?} do not match model features {:?}",
            matrix.feature_names,
            model.feature_names()
        )));
    }
    let predicted = model.predict(&matrix.rows);
    let metrics = compute_metrics(&matrix.labels, &predicted);
    tracing::info!(%metrics, rows = matrix.n_rows(), "model evaluated on held-out table");
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_confusion_quartet_scores_one_half_everywhere() {
        // TP=1, FP=1, FN=1, TN=1.
        let truth = vec![1, 0, 1, 0];
        let predicted = vec![1, 1, 0, 0];
        let metrics = compute_metrics(&truth, &predicted);
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 0.5);
        assert_eq!(metrics.f1_score, 0.5);
    }

    #[test]
    fn majority_class_predictor_has_zero_recall_on_minority_positives() {
        // Positives are the minority; the predictor always answers 0.
        let truth = vec![0, 0, 0, 1];
        let predicted = vec![0, 0, 0, 0];
        let metrics = compute_metrics(&truth, &predicted);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.f1_score, 0.0);
        assert_eq!(metrics.accuracy, 0.75);
    }

    #[test]
    fn perfect_predictions_score_one() {
        let truth = vec![1, 0, 1, 1, 0];
        let metrics = compute_metrics(&truth, &truth);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 1.0);
        assert_eq!(metrics.f1_score, 1.0);
    }

    #[test]
    fn counts_tally_each_quadrant() {
        let truth = vec![1, 1, 0, 0, 1];
        let predicted = vec![1, 0, 1, 0, 1];
        let counts = confusion_counts(&truth, &predicted);
        assert_eq!(
            counts,
            ConfusionCounts {
                true_positives: 2,
                false_positives: 1,
                false_negatives: 1,
                true_negatives: 1,
            }
        );
    }
}
