//! CART decision tree for classification.
//!
//! Trees split on Gini impurity with midpoint thresholds between
//! adjacent distinct feature values, and store a class-probability
//! distribution at each leaf. Feature subsampling per node is driven by
//! the caller-supplied RNG so forests stay reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Hyperparameters controlling tree growth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum samples required to split a node.
    pub min_samples_split: usize,
    /// Minimum samples required in each child of a split.
    pub min_samples_leaf: usize,
    /// Number of candidate features considered per node.
    pub max_features: usize,
}

/// A node of a fitted tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Terminal node holding a class-probability distribution.
    Leaf { distribution: Vec<f64> },
    /// Binary split: `feature <= threshold` goes left.
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A fitted CART classification tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
    n_classes: usize,
}

impl DecisionTree {
    /// Fit a tree on the given rows.
    ///
    /// `x` must be non-empty and rectangular, and every label in `y`
    /// must be `< n_classes`; the owning forest validates this before
    /// delegating here.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let indices: Vec<usize> = (0..x.len()).collect();
        let root = build_node(x, y, &indices, n_classes, params, 0, rng);
        DecisionTree { root, n_classes }
    }

    /// Number of classes this tree predicts over.
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Class-probability distribution for a single feature vector.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Gini impurity of a class-count vector: `1 - Σ p_i²`.
pub fn gini(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn leaf_from_counts(counts: &[usize]) -> TreeNode {
    let total: usize = counts.iter().sum();
    let total = total.max(1) as f64;
    TreeNode::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
    }
}

fn build_node(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    n_classes: usize,
    params: &TreeParams,
    depth: usize,
    rng: &mut StdRng,
) -> TreeNode {
    let counts = class_counts(y, indices, n_classes);
    let n_present = counts.iter().filter(|&&c| c > 0).count();

    if depth >= params.max_depth || indices.len() < params.min_samples_split || n_present <= 1 {
        return leaf_from_counts(&counts);
    }

    let n_features = x[0].len();
    let mut candidates: Vec<usize> = (0..n_features).collect();
    candidates.shuffle(rng);
    candidates.truncate(params.max_features.clamp(1, n_features));

    let parent_impurity = gini(&counts);
    let mut best: Option<(f64, usize, f64)> = None;
    for &feature in &candidates {
        if let Some((impurity, threshold)) =
            best_split_for_feature(x, y, indices, feature, n_classes, params)
        {
            if best.is_none_or(|(b, _, _)| impurity < b) {
                best = Some((impurity, feature, threshold));
            }
        }
    }

    match best {
        Some((impurity, feature, threshold)) if impurity < parent_impurity => {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| x[i][feature] <= threshold);
            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(build_node(
                    x,
                    y,
                    &left_indices,
                    n_classes,
                    params,
                    depth + 1,
                    rng,
                )),
                right: Box::new(build_node(
                    x,
                    y,
                    &right_indices,
                    n_classes,
                    params,
                    depth + 1,
                    rng,
                )),
            }
        }
        _ => leaf_from_counts(&counts),
    }
}

/// Best `(weighted impurity, threshold)` for one feature, found with a
/// single sorted sweep maintaining left/right class counts.
fn best_split_for_feature(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    feature: usize,
    n_classes: usize,
    params: &TreeParams,
) -> Option<(f64, f64)> {
    let mut samples: Vec<(f64, usize)> = indices.iter().map(|&i| (x[i][feature], y[i])).collect();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = samples.len();
    if n < 2 {
        return None;
    }
    let mut left = vec![0usize; n_classes];
    let mut right = vec![0usize; n_classes];
    for &(_, class) in &samples {
        right[class] += 1;
    }

    let mut best: Option<(f64, f64)> = None;
    for i in 0..n - 1 {
        let (value, class) = samples[i];
        left[class] += 1;
        right[class] -= 1;

        let next_value = samples[i + 1].0;
        if next_value <= value {
            // No decision boundary between equal values.
            continue;
        }

        let left_n = i + 1;
        let right_n = n - left_n;
        if left_n < params.min_samples_leaf || right_n < params.min_samples_leaf {
            continue;
        }

        let weighted =
            (left_n as f64 * gini(&left) + right_n as f64 * gini(&right)) / n as f64;
        if best.is_none_or(|(b, _)| weighted < b) {
            best = Some((weighted, (value + next_value) / 2.0));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: 8,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[4, 0]), 0.0);
        assert!((gini(&[2, 2]) - 0.5).abs() < 1e-12);
        assert_eq!(gini(&[]), 0.0);
    }

    #[test]
    fn test_learns_one_dimensional_threshold() {
        // Class 0 below 10, class 1 above.
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();

        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::fit(&x, &y, 2, &params(), &mut rng);

        assert_eq!(tree.predict_proba(&[3.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[15.0]), &[0.0, 1.0]);
    }

    #[test]
    fn test_max_depth_zero_yields_prior() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![0, 0, 0, 1];
        let zero_depth = TreeParams {
            max_depth: 0,
            ..params()
        };

        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::fit(&x, &y, 2, &zero_depth, &mut rng);

        let dist = tree.predict_proba(&[2.0]);
        assert!((dist[0] - 0.75).abs() < 1e-12);
        assert!((dist[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![(i % 7) as f64, (i % 3) as f64]).collect();
        let y: Vec<usize> = (0..30).map(|i| i % 3).collect();

        let mut rng = StdRng::seed_from_u64(11);
        let tree = DecisionTree::fit(&x, &y, 3, &params(), &mut rng);

        let dist = tree.predict_proba(&[4.0, 1.0]);
        let sum: f64 = dist.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
