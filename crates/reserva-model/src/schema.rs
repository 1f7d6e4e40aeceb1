//! The selected feature schema.

use serde::{Deserialize, Serialize};

/// The column contract produced by feature selection: top-K feature
/// names in importance-descending order, label column last.
///
/// Once computed on the training table the schema is immutable and is
/// applied verbatim to the test table: same columns, same order,
/// everything else dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<String>,
    label: String,
}

impl FeatureSchema {
    pub fn new(features: Vec<String>, label: impl Into<String>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }

    /// Selected feature names, importance-descending.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// All schema columns in output order: features, then the label.
    pub fn columns(&self) -> Vec<&str> {
        self.features
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.label.as_str()))
            .collect()
    }

    /// Number of columns including the label.
    pub fn width(&self) -> usize {
        self.features.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_last_column() {
        let schema = FeatureSchema::new(
            vec!["lead_time".to_string(), "avg_price_per_room".to_string()],
            "booking_status",
        );
        assert_eq!(
            schema.columns(),
            vec!["lead_time", "avg_price_per_room", "booking_status"]
        );
        assert_eq!(schema.width(), 3);
    }
}
