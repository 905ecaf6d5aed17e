//! Evaluation metrics for the binary churn classifiers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Binary matrix from labels and hard predictions.
    pub fn from_binary(truth: &[u8], predicted: &[u8]) -> Self {
        let mut cm = Self::new(2);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(usize::from(t), usize::from(p));
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| u64::from(v)).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    /// Total number of true examples for the class.
    pub support: u32,
}

impl PerClassStats {
    /// Harmonic mean of precision and recall; zero when both are zero.
    pub fn f1(&self) -> f32 {
        let sum = self.precision + self.recall;
        if sum == 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / sum
        }
    }
}

/// Compute per-class precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f32;
        let mut fp = 0f32;
        let mut fn_ = 0f32;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f32;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f32;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        stats.push(PerClassStats {
            precision,
            recall,
            support,
        });
    }
    stats
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let mut correct = 0u64;
    for class_idx in 0..cm.n_classes {
        correct += u64::from(cm.get(class_idx, class_idx));
    }
    let total = cm.total();
    if total == 0 {
        0.0
    } else {
        (correct as f32) / (total as f32)
    }
}

/// F1 of the positive class (index `1`) of a binary confusion matrix.
pub fn binary_f1(cm: &ConfusionMatrix) -> f32 {
    precision_recall_by_class(cm)
        .get(1)
        .map(PerClassStats::f1)
        .unwrap_or(0.0)
}

/// Receiver operating characteristic points, starting at `(0, 0)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f32>,
    pub tpr: Vec<f32>,
    /// Score threshold per point; the first point uses `+inf`.
    pub thresholds: Vec<f32>,
}

impl RocCurve {
    /// Area under the curve by the trapezoid rule.
    pub fn auc(&self) -> f32 {
        auc(&self.fpr, &self.tpr)
    }

    pub fn len(&self) -> usize {
        self.fpr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fpr.is_empty()
    }
}

/// ROC curve for binary labels and positive-class scores.
///
/// Tied scores collapse into a single point. Returns an empty curve when
/// either class is absent.
pub fn roc_curve(truth: &[u8], scores: &[f32]) -> RocCurve {
    let n = truth.len().min(scores.len());
    let positives = truth[..n].iter().filter(|&&t| t == 1).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return RocCurve::default();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut curve = RocCurve {
        fpr: vec![0.0],
        tpr: vec![0.0],
        thresholds: vec![f32::INFINITY],
    };
    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &idx) in order.iter().enumerate() {
        if truth[idx] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let next_differs = order
            .get(pos + 1)
            .is_none_or(|&next| scores[next] != scores[idx]);
        if next_differs {
            curve.fpr.push(fp as f32 / negatives as f32);
            curve.tpr.push(tp as f32 / positives as f32);
            curve.thresholds.push(scores[idx]);
        }
    }
    curve
}

/// Trapezoid area under `(x, y)` points ordered by `x`.
pub fn auc(x: &[f32], y: &[f32]) -> f32 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}
