//! CART decision trees.
//!
//! One node-array tree type shared by the bagged forest (gini
//! classification splits) and the boosted ensemble (second-order
//! regression splits). Split search is exact greedy over midpoint
//! thresholds; ties break on the lower feature index, then the lower
//! threshold, so rebuilding from the same inputs yields the same tree.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A single tree node. Interior nodes route on `feature <= threshold`;
/// leaves carry `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub feature: u32,
    pub threshold: f64,
    pub left: u32,
    pub right: u32,
    pub value: Option<f64>,
}

impl Node {
    fn leaf(value: f64) -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some(value),
        }
    }
}

/// A decision tree stored as a node array, root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Route a feature row to its leaf value.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };
            if let Some(value) = node.value {
                return value;
            }
            let feature = node.feature as usize;
            let go_left = row.get(feature).is_some_and(|&v| v <= node.threshold);
            idx = if go_left {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, idx: usize) -> usize {
        match self.nodes.get(idx) {
            None => 0,
            Some(node) if node.value.is_some() => 1,
            Some(node) => {
                1 + self
                    .depth_from(node.left as usize)
                    .max(self.depth_from(node.right as usize))
            }
        }
    }
}

/// Growth limits shared by both builders.
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl SplitCandidate {
    /// Deterministic preference: higher gain, then lower feature index,
    /// then lower threshold.
    fn beats(&self, other: &SplitCandidate) -> bool {
        if self.gain != other.gain {
            return self.gain > other.gain;
        }
        if self.feature != other.feature {
            return self.feature < other.feature;
        }
        self.threshold < other.threshold
    }
}

const MIN_GAIN: f64 = 1e-12;

/// Midpoints between consecutive distinct values of one feature within
/// the node's rows.
fn midpoint_thresholds(x: &[Vec<f64>], indices: &[usize], feature: usize) -> Vec<f64> {
    let mut values: Vec<f64> = indices.iter().map(|&i| x[i][feature]).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    values
        .windows(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}

fn partition(
    x: &[Vec<f64>],
    indices: &[usize],
    feature: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &i in indices {
        if x[i][feature] <= threshold {
            left.push(i);
        } else {
            right.push(i);
        }
    }
    (left, right)
}

// ---------------------------------------------------------------------------
// Gini classification builder (bagged forest)
// ---------------------------------------------------------------------------

/// Builds a classification tree and accumulates weighted impurity
/// decrease per feature into `importances`.
pub struct GiniTreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u32],
    n_classes: usize,
    config: TreeConfig,
    /// Features examined per split; fewer than the full set decorrelates
    /// the bagged trees.
    max_features: usize,
    total_samples: usize,
}

impl<'a> GiniTreeBuilder<'a> {
    pub fn new(
        x: &'a [Vec<f64>],
        y: &'a [u32],
        n_classes: usize,
        config: TreeConfig,
        max_features: usize,
    ) -> Self {
        Self {
            x,
            y,
            n_classes,
            config,
            max_features: max_features.max(1),
            total_samples: x.len(),
        }
    }

    pub fn build(
        &self,
        indices: &[usize],
        rng: &mut StdRng,
        importances: &mut [f64],
    ) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes, rng, importances);
        Tree { nodes }
    }

    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        rng: &mut StdRng,
        importances: &mut [f64],
    ) -> u32 {
        let current = nodes.len() as u32;
        let counts = self.class_counts(indices);
        let node_gini = gini(&counts, indices.len());

        if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf
            || node_gini == 0.0
        {
            nodes.push(Node::leaf(majority_class(&counts)));
            return current;
        }

        let Some(split) = self.best_split(indices, node_gini, rng) else {
            nodes.push(Node::leaf(majority_class(&counts)));
            return current;
        };

        let (left, right) = partition(self.x, indices, split.feature, split.threshold);
        if left.len() < self.config.min_samples_leaf || right.len() < self.config.min_samples_leaf {
            nodes.push(Node::leaf(majority_class(&counts)));
            return current;
        }

        // Mean decrease in impurity, weighted by the node's share of the
        // training set.
        importances[split.feature] += indices.len() as f64 / self.total_samples as f64 * split.gain;

        nodes.push(Node {
            feature: split.feature as u32,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: None,
        });
        let left_idx = self.build_node(&left, depth + 1, nodes, rng, importances);
        let right_idx = self.build_node(&right, depth + 1, nodes, rng, importances);
        nodes[current as usize].left = left_idx;
        nodes[current as usize].right = right_idx;
        current
    }

    fn best_split(
        &self,
        indices: &[usize],
        node_gini: f64,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let n_features = self.x.first().map_or(0, Vec::len);
        let mut pool: Vec<usize> = (0..n_features).collect();
        if self.max_features < n_features {
            pool.shuffle(rng);
            pool.truncate(self.max_features);
            pool.sort_unstable();
        }

        let mut best: Option<SplitCandidate> = None;
        for feature in pool {
            for threshold in midpoint_thresholds(self.x, indices, feature) {
                let (left, right) = partition(self.x, indices, feature, threshold);
                if left.len() < self.config.min_samples_leaf
                    || right.len() < self.config.min_samples_leaf
                {
                    continue;
                }
                let left_counts = self.class_counts(&left);
                let right_counts = self.class_counts(&right);
                let weighted = (left.len() as f64 * gini(&left_counts, left.len())
                    + right.len() as f64 * gini(&right_counts, right.len()))
                    / indices.len() as f64;
                let gain = node_gini - weighted;
                if gain <= MIN_GAIN {
                    continue;
                }
                let candidate = SplitCandidate {
                    feature,
                    threshold,
                    gain,
                };
                if best.as_ref().is_none_or(|current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.y[i] as usize] += 1;
        }
        counts
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let mut impurity = 1.0;
    for &count in counts {
        let p = count as f64 / total as f64;
        impurity -= p * p;
    }
    impurity
}

fn majority_class(counts: &[usize]) -> f64 {
    let mut best_class = 0usize;
    let mut best_count = 0usize;
    for (class, &count) in counts.iter().enumerate() {
        if count > best_count {
            best_class = class;
            best_count = count;
        }
    }
    best_class as f64
}

// ---------------------------------------------------------------------------
// Second-order regression builder (boosting)
// ---------------------------------------------------------------------------

/// Builds a regression tree on gradient/hessian targets. Split gain is
/// `G_l^2/(H_l+lambda) + G_r^2/(H_r+lambda) - G^2/(H+lambda)`, leaf
/// value is `-G/(H+lambda)`.
pub struct GradientTreeBuilder<'a> {
    x: &'a [Vec<f64>],
    gradients: &'a [f64],
    hessians: &'a [f64],
    config: TreeConfig,
    lambda: f64,
}

impl<'a> GradientTreeBuilder<'a> {
    pub fn new(
        x: &'a [Vec<f64>],
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
        lambda: f64,
    ) -> Self {
        Self {
            x,
            gradients,
            hessians,
            config,
            lambda,
        }
    }

    pub fn build(&self, indices: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes);
        Tree { nodes }
    }

    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> u32 {
        let current = nodes.len() as u32;
        let leaf_value = self.leaf_value(indices);

        if depth >= self.config.max_depth || indices.len() < 2 * self.config.min_samples_leaf {
            nodes.push(Node::leaf(leaf_value));
            return current;
        }
        let Some(split) = self.best_split(indices) else {
            nodes.push(Node::leaf(leaf_value));
            return current;
        };
        let (left, right) = partition(self.x, indices, split.feature, split.threshold);
        if left.len() < self.config.min_samples_leaf || right.len() < self.config.min_samples_leaf {
            nodes.push(Node::leaf(leaf_value));
            return current;
        }

        nodes.push(Node {
            feature: split.feature as u32,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: None,
        });
        let left_idx = self.build_node(&left, depth + 1, nodes);
        let right_idx = self.build_node(&right, depth + 1, nodes);
        nodes[current as usize].left = left_idx;
        nodes[current as usize].right = right_idx;
        current
    }

    fn best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let n_features = self.x.first().map_or(0, Vec::len);
        let (g_parent, h_parent) = self.sums(indices);
        let parent_score = score(g_parent, h_parent, self.lambda);

        let mut best: Option<SplitCandidate> = None;
        for feature in 0..n_features {
            for threshold in midpoint_thresholds(self.x, indices, feature) {
                let (left, right) = partition(self.x, indices, feature, threshold);
                if left.len() < self.config.min_samples_leaf
                    || right.len() < self.config.min_samples_leaf
                {
                    continue;
                }
                let (g_left, h_left) = self.sums(&left);
                let (g_right, h_right) = self.sums(&right);
                let gain = score(g_left, h_left, self.lambda)
                    + score(g_right, h_right, self.lambda)
                    - parent_score;
                if gain <= MIN_GAIN {
                    continue;
                }
                let candidate = SplitCandidate {
                    feature,
                    threshold,
                    gain,
                };
                if best.as_ref().is_none_or(|current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        let mut g = 0.0;
        let mut h = 0.0;
        for &i in indices {
            g += self.gradients[i];
            h += self.hessians[i];
        }
        (g, h)
    }

    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let (g, h) = self.sums(indices);
        -g / (h + self.lambda)
    }
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

/// Bootstrap sample of `n` row indices, drawn with replacement.
pub fn bootstrap_indices(n: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn separable() -> (Vec<Vec<f64>>, Vec<u32>) {
        let x = vec![
            vec![0.0, 5.0],
            vec![1.0, 4.0],
            vec![2.0, 6.0],
            vec![10.0, 5.0],
            vec![11.0, 4.0],
            vec![12.0, 6.0],
        ];
        let y = vec![0, 0, 0, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn gini_tree_separates_clean_classes() {
        let (x, y) = separable();
        let config = TreeConfig {
            max_depth: 3,
            min_samples_leaf: 1,
        };
        let builder = GiniTreeBuilder::new(&x, &y, 2, config, 2);
        let mut rng = StdRng::seed_from_u64(42);
        let mut importances = vec![0.0; 2];
        let indices: Vec<usize> = (0..x.len()).collect();
        let tree = builder.build(&indices, &mut rng, &mut importances);

        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(tree.predict(row) as u32, label);
        }
        // All separation comes from the first feature.
        assert!(importances[0] > 0.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn rebuild_is_deterministic() {
        let (x, y) = separable();
        let config = TreeConfig {
            max_depth: 4,
            min_samples_leaf: 1,
        };
        let indices: Vec<usize> = (0..x.len()).collect();

        let builder = GiniTreeBuilder::new(&x, &y, 2, config, 1);
        let mut imp_a = vec![0.0; 2];
        let mut imp_b = vec![0.0; 2];
        let tree_a = builder.build(&indices, &mut StdRng::seed_from_u64(9), &mut imp_a);
        let tree_b = builder.build(&indices, &mut StdRng::seed_from_u64(9), &mut imp_b);
        assert_eq!(tree_a, tree_b);
        assert_eq!(imp_a, imp_b);
    }

    #[test]
    fn gradient_tree_moves_leaves_against_the_gradient() {
        let x = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
        let gradients = vec![1.0, 1.0, -1.0, -1.0];
        let hessians = vec![0.25, 0.25, 0.25, 0.25];
        let config = TreeConfig {
            max_depth: 2,
            min_samples_leaf: 1,
        };
        let tree = GradientTreeBuilder::new(&x, &gradients, &hessians, config, 1.0).build(&[0, 1, 2, 3]);

        // Positive gradients push the leaf value down, negative up.
        assert!(tree.predict(&[0.5]) < 0.0);
        assert!(tree.predict(&[10.5]) > 0.0);
    }

    #[test]
    fn depth_limit_is_respected() {
        let (x, y) = separable();
        let config = TreeConfig {
            max_depth: 1,
            min_samples_leaf: 1,
        };
        let builder = GiniTreeBuilder::new(&x, &y, 2, config, 2);
        let indices: Vec<usize> = (0..x.len()).collect();
        let mut importances = vec![0.0; 2];
        let tree = builder.build(&indices, &mut StdRng::seed_from_u64(1), &mut importances);
        assert!(tree.depth() <= 2);
    }
}
