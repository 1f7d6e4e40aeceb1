//! The evaluation metrics record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Classification metrics for one evaluation run, each in `[0, 1]`.
///
/// Created once per run, immutable, logged to the tracker and returned
/// to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl MetricsRecord {
    /// Metric name/value pairs in a stable order, for tracker logging.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("accuracy".to_string(), self.accuracy),
            ("precision".to_string(), self.precision),
            ("recall".to_string(), self.recall),
            ("f1_score".to_string(), self.f1_score),
        ])
    }
}

impl std::fmt::Display for MetricsRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
            self.accuracy, self.precision, self.recall, self.f1_score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_has_all_four_metrics() {
        let record = MetricsRecord {
            accuracy: 0.5,
            precision: 0.5,
            recall: 0.5,
            f1_score: 0.5,
        };
        let map = record.to_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map["f1_score"], 0.5);
    }

    #[test]
    fn serializes_with_metric_names() {
        let record = MetricsRecord {
            accuracy: 0.9,
            precision: 0.8,
            recall: 0.7,
            f1_score: 0.75,
        };
        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"f1_score\":0.75"));
    }
}
