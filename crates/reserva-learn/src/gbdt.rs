//! Gradient-boosted binary classifier.
//!
//! Logistic loss, second-order leaf values, shrinkage, optional row
//! subsampling per iteration. The fitted model is a plain serializable
//! value: base score, tree array, hyperparameters, and the feature
//! names it was trained on.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::LearnError;
use crate::tree::{GradientTreeBuilder, Tree, TreeConfig};

const LAMBDA: f64 = 1.0;
const PROBABILITY_FLOOR: f64 = 1e-6;

/// Hyperparameters of one boosted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) per iteration.
    pub subsample: f64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 5,
            min_samples_leaf: 10,
            subsample: 1.0,
        }
    }
}

impl GbdtParams {
    /// String form of every hyperparameter, for tracker logging.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("n_estimators".to_string(), self.n_estimators.to_string()),
            ("learning_rate".to_string(), self.learning_rate.to_string()),
            ("max_depth".to_string(), self.max_depth.to_string()),
            (
                "min_samples_leaf".to_string(),
                self.min_samples_leaf.to_string(),
            ),
            ("subsample".to_string(), self.subsample.to_string()),
        ])
    }
}

/// A fitted gradient-boosted binary classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtClassifier {
    feature_names: Vec<String>,
    params: GbdtParams,
    base_score: f64,
    trees: Vec<Tree>,
}

impl GbdtClassifier {
    /// Fit on a row-major matrix with labels in `{0, 1}`. Deterministic
    /// for a fixed seed.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[u32],
        feature_names: &[String],
        params: &GbdtParams,
        seed: u64,
    ) -> Result<Self, LearnError> {
        if x.is_empty() || y.is_empty() {
            return Err(LearnError::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(LearnError::LengthMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        if let Some(&bad) = y.iter().find(|&&label| label > 1) {
            return Err(LearnError::NonBinaryLabel { found: bad });
        }

        let n = x.len();
        let positives = y.iter().filter(|&&label| label == 1).count();
        let base_rate = (positives as f64 / n as f64)
            .clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
        let base_score = (base_rate / (1.0 - base_rate)).ln();

        let tree_config = TreeConfig {
            max_depth: params.max_depth,
            min_samples_leaf: params.min_samples_leaf,
        };
        let sample_len = ((n as f64) * params.subsample.clamp(0.0, 1.0)).round() as usize;
        let sample_len = sample_len.clamp(1, n);

        let mut rng = StdRng::seed_from_u64(seed);
        let mut raw_scores = vec![base_score; n];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut gradients = vec![0.0; n];
        let mut hessians = vec![0.0; n];

        for _ in 0..params.n_estimators {
            for i in 0..n {
                let p = sigmoid(raw_scores[i]);
                gradients[i] = p - f64::from(y[i]);
                hessians[i] = (p * (1.0 - p)).max(PROBABILITY_FLOOR);
            }

            let indices: Vec<usize> = if sample_len < n {
                let mut all: Vec<usize> = (0..n).collect();
                all.shuffle(&mut rng);
                all.truncate(sample_len);
                all.sort_unstable();
                all
            } else {
                (0..n).collect()
            };

            let tree = GradientTreeBuilder::new(x, &gradients, &hessians, tree_config, LAMBDA)
                .build(&indices);
            for (i, row) in x.iter().enumerate() {
                raw_scores[i] += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        tracing::debug!(
            trees = trees.len(),
            rows = n,
            features = feature_names.len(),
            "boosted classifier fitted"
        );
        Ok(Self {
            feature_names: feature_names.to_vec(),
            params: params.clone(),
            base_score,
            trees,
        })
    }

    /// Probability of the positive class for one feature row.
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        let mut raw = self.base_score;
        for tree in &self.trees {
            raw += self.params.learning_rate * tree.predict(row);
        }
        sigmoid(raw)
    }

    /// Hard 0/1 prediction at the 0.5 threshold.
    pub fn predict_row(&self, row: &[f64]) -> u32 {
        u32::from(self.predict_proba_row(row) >= 0.5)
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<u32> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// The feature columns, in order, this model expects at prediction
    /// time.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
