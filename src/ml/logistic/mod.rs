//! Binary logistic regression over encoded feature vectors.

use serde::{Deserialize, Serialize};

mod train;
pub use train::{TrainOptions, train_logistic};

/// Fitted weights; `predict_proba` returns the churn probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_len: usize,
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl LogisticModel {
    /// Validate dimensions and finiteness.
    pub fn validate(&self) -> Result<(), String> {
        if self.weights.len() != self.feature_len {
            return Err(format!(
                "weights length {} does not match feature_len {}",
                self.weights.len(),
                self.feature_len
            ));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err("weights must be finite".to_string());
        }
        Ok(())
    }

    /// Linear score before the sigmoid, accumulated in `f64` so extreme
    /// features with opposing weights cannot cancel into NaN.
    pub fn decision(&self, features: &[f32]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .fold(f64::from(self.bias), |acc, (w, x)| {
                acc + f64::from(*w) * f64::from(*x)
            })
    }

    /// Saturates to exactly 0 or 1 when the score overflows `f32`.
    pub fn predict_proba(&self, features: &[f32]) -> f32 {
        sigmoid(self.decision(features) as f32)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f32) -> f32 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
