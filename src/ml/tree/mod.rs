//! CART decision tree classifier for the binary churn target.
//!
//! Nodes live in a flat arena; children always have larger indices than their
//! parent, so the tree serializes as plain JSON and cannot contain cycles.

use serde::{Deserialize, Serialize};

mod train;
pub use train::{TreeOptions, train_tree};

/// Split rule of an internal node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub feature_index: usize,
    /// Rows with `feature <= threshold` go left.
    pub threshold: f32,
    pub left: usize,
    pub right: usize,
}

/// Tree node with the training statistics that reached it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub samples: usize,
    pub positives: usize,
    /// Gini impurity of the node.
    pub impurity: f32,
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<Split>,
}

impl TreeNode {
    /// Fraction of positive training rows, used as the leaf probability.
    pub fn positive_rate(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.positives as f32 / self.samples as f32
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }
}

/// Fitted decision tree; node `0` is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub feature_len: usize,
    pub max_depth: usize,
    pub nodes: Vec<TreeNode>,
    /// Normalized Gini importance per feature.
    pub importances: Vec<f32>,
}

impl DecisionTree {
    /// Validate arena links and dimensions.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if self.importances.len() != self.feature_len {
            return Err("importances length mismatch".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            let Some(split) = &node.split else {
                continue;
            };
            if split.feature_index >= self.feature_len {
                return Err(format!("node {idx} splits on unknown feature {}", split.feature_index));
            }
            for child in [split.left, split.right] {
                if child <= idx || child >= self.nodes.len() {
                    return Err(format!("node {idx} has invalid child {child}"));
                }
            }
            if !split.threshold.is_finite() {
                return Err(format!("node {idx} has a non-finite threshold"));
            }
        }
        Ok(())
    }

    /// Index of the leaf reached by a feature vector.
    pub fn leaf_index(&self, features: &[f32]) -> usize {
        let mut idx = 0usize;
        while let Some(split) = self.nodes.get(idx).and_then(|node| node.split.as_ref()) {
            let value = features.get(split.feature_index).copied().unwrap_or(0.0);
            idx = if value <= split.threshold {
                split.left
            } else {
                split.right
            };
        }
        idx
    }

    pub fn predict_proba(&self, features: &[f32]) -> f32 {
        self.nodes
            .get(self.leaf_index(features))
            .map(TreeNode::positive_rate)
            .unwrap_or(0.0)
    }

    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Features ranked by importance, highest first, skipping zeros.
    pub fn ranked_importances(&self) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self
            .importances
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, value)| *value > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> DecisionTree {
        DecisionTree {
            feature_len: 2,
            max_depth: 1,
            nodes: vec![
                TreeNode {
                    samples: 4,
                    positives: 2,
                    impurity: 0.5,
                    depth: 0,
                    split: Some(Split {
                        feature_index: 1,
                        threshold: 0.5,
                        left: 1,
                        right: 2,
                    }),
                },
                TreeNode {
                    samples: 2,
                    positives: 0,
                    impurity: 0.0,
                    depth: 1,
                    split: None,
                },
                TreeNode {
                    samples: 2,
                    positives: 2,
                    impurity: 0.0,
                    depth: 1,
                    split: None,
                },
            ],
            importances: vec![0.0, 1.0],
        }
    }

    #[test]
    fn predict_follows_threshold() {
        let tree = stump();
        tree.validate().unwrap();
        assert_eq!(tree.predict_proba(&[9.0, 0.5]), 0.0);
        assert_eq!(tree.predict_proba(&[9.0, 0.6]), 1.0);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.ranked_importances(), vec![(1, 1.0)]);
    }

    #[test]
    fn validate_rejects_backward_links() {
        let mut tree = stump();
        if let Some(split) = tree.nodes[0].split.as_mut() {
            split.left = 0;
        }
        assert!(tree.validate().is_err());
    }
}
