//! Bagged-tree classifier used for importance-based feature ranking.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::LearnError;
use crate::tree::{GiniTreeBuilder, Tree, TreeConfig, bootstrap_indices};

/// Forest growth settings. The defaults mirror a stock random-forest
/// classifier: 100 trees, sqrt-of-features split pools, unlimited depth
/// in practice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 16,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// A bagged ensemble of gini trees with model-intrinsic feature
/// importances (each feature's share of total impurity reduction).
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    trees: Vec<Tree>,
    n_classes: usize,
    importances: Vec<f64>,
}

impl ForestClassifier {
    /// Fit on a row-major feature matrix and integer class labels.
    /// Deterministic for a fixed config seed.
    pub fn fit(x: &[Vec<f64>], y: &[u32], config: &ForestConfig) -> Result<Self, LearnError> {
        if x.is_empty() || y.is_empty() {
            return Err(LearnError::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(LearnError::LengthMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        let n_classes = y.iter().max().copied().unwrap_or(0) as usize + 1;
        if n_classes < 2 {
            return Err(LearnError::SingleClass);
        }
        let n_features = x[0].len();
        let max_features = (n_features as f64).sqrt().floor().max(1.0) as usize;
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf,
        };

        let mut trees = Vec::with_capacity(config.n_trees);
        let mut importances = vec![0.0; n_features];
        let builder = GiniTreeBuilder::new(x, y, n_classes, tree_config, max_features);
        for tree_idx in 0..config.n_trees {
            // Per-tree seed keeps each tree's sampling independent of the
            // others while staying reproducible.
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(tree_idx as u64));
            let sample = bootstrap_indices(x.len(), &mut rng);
            trees.push(builder.build(&sample, &mut rng, &mut importances));
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for value in &mut importances {
                *value /= total;
            }
        } else {
            // Degenerate data with no useful split anywhere: fall back to a
            // uniform ranking rather than all-zero scores.
            let uniform = 1.0 / n_features as f64;
            importances.fill(uniform);
        }

        tracing::debug!(
            trees = trees.len(),
            features = n_features,
            classes = n_classes,
            "forest fitted"
        );
        Ok(Self {
            trees,
            n_classes,
            importances,
        })
    }

    /// Normalized importance per feature, in input feature order;
    /// non-negative and summing to 1.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Majority vote over the ensemble; vote ties resolve to the lower
    /// class id.
    pub fn predict_row(&self, row: &[f64]) -> u32 {
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            let class = tree.predict(row) as usize;
            if let Some(slot) = votes.get_mut(class) {
                *slot += 1;
            }
        }
        let mut best_class = 0usize;
        let mut best_votes = 0usize;
        for (class, &count) in votes.iter().enumerate() {
            if count > best_votes {
                best_class = class;
                best_votes = count;
            }
        }
        best_class as u32
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<u32> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}
