use serde::{Deserialize, Serialize};

use super::{DecisionTree, Split, TreeNode};
use crate::ml::TrainSet;
use crate::ml::error::ModelError;

/// Growth limits for CART training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Grow a Gini-impurity decision tree.
///
/// Thresholds sit halfway between consecutive distinct feature values.
/// Feature ties resolve to the lowest feature index, so training is
/// deterministic without a seed.
pub fn train_tree(dataset: &TrainSet, options: &TreeOptions) -> Result<DecisionTree, ModelError> {
    let dim = dataset.validate()?;
    let mut builder = Builder {
        data: dataset,
        options,
        nodes: Vec::new(),
        importance_raw: vec![0.0f64; dim],
    };
    let all: Vec<usize> = (0..dataset.x.len()).collect();
    builder.grow(all, 0);

    let total: f64 = builder.importance_raw.iter().sum();
    let importances = builder
        .importance_raw
        .iter()
        .map(|&value| if total > 0.0 { (value / total) as f32 } else { 0.0 })
        .collect();
    let tree = DecisionTree {
        feature_len: dim,
        max_depth: options.max_depth,
        nodes: builder.nodes,
        importances,
    };
    tree.validate().map_err(ModelError::Invalid)?;
    Ok(tree)
}

struct Builder<'a> {
    data: &'a TrainSet,
    options: &'a TreeOptions,
    nodes: Vec<TreeNode>,
    importance_raw: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature_index: usize,
    threshold: f32,
    /// Weighted child impurity, `n_left * gini_left + n_right * gini_right`.
    weighted_impurity: f64,
}

impl Builder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let samples = indices.len();
        let positives = indices.iter().filter(|&&i| self.data.y[i] == 1).count();
        let impurity = gini(positives, samples);
        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode {
            samples,
            positives,
            impurity: impurity as f32,
            depth,
            split: None,
        });

        if depth >= self.options.max_depth
            || samples < self.options.min_samples_split.max(2)
            || impurity <= 0.0
        {
            return node_idx;
        }
        // Zero-gain splits are kept: interactions only pay off one level down.
        let Some(best) = self.best_split(&indices) else {
            return node_idx;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.data.x[i][best.feature_index] <= best.threshold);
        self.importance_raw[best.feature_index] +=
            (impurity * samples as f64 - best.weighted_impurity).max(0.0);

        let left_idx = self.grow(left, depth + 1);
        let right_idx = self.grow(right, depth + 1);
        self.nodes[node_idx].split = Some(Split {
            feature_index: best.feature_index,
            threshold: best.threshold,
            left: left_idx,
            right: right_idx,
        });
        node_idx
    }

    fn best_split(&self, indices: &[usize]) -> Option<Candidate> {
        let n = indices.len();
        let total_pos = indices.iter().filter(|&&i| self.data.y[i] == 1).count();
        let min_leaf = self.options.min_samples_leaf.max(1);
        let dim = self.importance_raw.len();

        let mut best: Option<Candidate> = None;
        let mut column: Vec<(f32, u8)> = Vec::with_capacity(n);
        for feature_index in 0..dim {
            column.clear();
            column.extend(
                indices
                    .iter()
                    .map(|&i| (self.data.x[i][feature_index], self.data.y[i])),
            );
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0usize;
            for split_at in 1..n {
                left_pos += usize::from(column[split_at - 1].1);
                let (lo, hi) = (column[split_at - 1].0, column[split_at].0);
                if lo == hi {
                    continue;
                }
                let left_n = split_at;
                let right_n = n - split_at;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let weighted = left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(total_pos - left_pos, right_n);
                if best.is_none_or(|current| weighted < current.weighted_impurity) {
                    best = Some(Candidate {
                        feature_index,
                        threshold: midpoint(lo, hi),
                        weighted_impurity: weighted,
                    });
                }
            }
        }
        best
    }
}

fn gini(positives: usize, samples: usize) -> f64 {
    if samples == 0 {
        return 0.0;
    }
    let p = positives as f64 / samples as f64;
    2.0 * p * (1.0 - p)
}

fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi { lo } else { mid }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_like() -> TrainSet {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for a in 0..2 {
            for b in 0..2 {
                for _ in 0..5 {
                    x.push(vec![a as f32, b as f32, 0.0]);
                    y.push(u8::from(a != b));
                }
            }
        }
        TrainSet { x, y }
    }

    #[test]
    fn fits_interaction_with_depth_two() {
        let data = xor_like();
        let tree = train_tree(&data, &TreeOptions::default()).unwrap();
        for (row, &label) in data.x.iter().zip(&data.y) {
            assert_eq!(tree.predict_proba(row), f32::from(label));
        }
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.importances[2], 0.0);
        let sum: f32 = tree.importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn respects_max_depth() {
        let data = xor_like();
        let options = TreeOptions {
            max_depth: 1,
            ..TreeOptions::default()
        };
        let tree = train_tree(&data, &options).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.predict_proba(&[0.0, 1.0, 0.0]), 0.5);
        assert!(tree.importances.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn single_threshold_split_uses_midpoint() {
        let data = TrainSet {
            x: vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]],
            y: vec![0, 0, 1, 1],
        };
        let tree = train_tree(&data, &TreeOptions::default()).unwrap();
        let split = tree.nodes[0].split.as_ref().unwrap();
        assert_eq!(split.threshold, 2.5);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.importances, vec![1.0]);
    }

    #[test]
    fn min_samples_leaf_blocks_small_children() {
        let data = TrainSet {
            x: vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]],
            y: vec![1, 0, 0, 0],
        };
        let options = TreeOptions {
            min_samples_leaf: 2,
            ..TreeOptions::default()
        };
        let tree = train_tree(&data, &options).unwrap();
        for node in &tree.nodes {
            assert!(node.samples >= 2);
        }
    }

    #[test]
    fn midpoint_never_reaches_upper_value() {
        assert_eq!(midpoint(1.0, 2.0), 1.5);
        let lo = 1.0f32;
        let hi = f32::from_bits(lo.to_bits() + 1);
        assert_eq!(midpoint(lo, hi), lo);
    }
}
