use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{LogisticModel, sigmoid};
use crate::ml::TrainSet;
use crate::ml::error::ModelError;

/// Mini-batch gradient descent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f32,
    pub l2: f32,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 200,
            learning_rate: 0.1,
            l2: 1e-4,
            batch_size: 64,
            seed: 42,
        }
    }
}

/// Fit a binary logistic regression with L2 penalty on the weights.
pub fn train_logistic(
    dataset: &TrainSet,
    options: &TrainOptions,
) -> Result<LogisticModel, ModelError> {
    let dim = dataset.validate()?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut weights: Vec<f32> = (0..dim)
        .map(|_| (rng.random::<f32>() - 0.5) * 0.01)
        .collect();
    let mut bias = initial_bias(&dataset.y);

    let mut indices: Vec<usize> = (0..dataset.x.len()).collect();
    let batch_size = options.batch_size.max(1);
    let lr = options.learning_rate;
    let l2 = options.l2.max(0.0);

    let mut grad_w = vec![0.0f32; dim];
    for _epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        for chunk in indices.chunks(batch_size) {
            grad_w.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0f32;
            for &idx in chunk {
                let x = &dataset.x[idx];
                let z = weights.iter().zip(x).fold(bias, |acc, (w, v)| acc + w * v);
                let diff = sigmoid(z) - f32::from(dataset.y[idx]);
                for (g, v) in grad_w.iter_mut().zip(x) {
                    *g += diff * v;
                }
                grad_b += diff;
            }
            let inv = 1.0 / chunk.len() as f32;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= lr * (g * inv + l2 * *w);
            }
            bias -= lr * grad_b * inv;
        }
    }

    let model = LogisticModel {
        feature_len: dim,
        weights,
        bias,
    };
    model.validate().map_err(ModelError::Invalid)?;
    Ok(model)
}

/// Log-odds of the positive rate, so training starts at the prior.
fn initial_bias(labels: &[u8]) -> f32 {
    let positives = labels.iter().filter(|&&y| y == 1).count() as f32;
    let rate = (positives / labels.len().max(1) as f32).clamp(1e-3, 1.0 - 1e-3);
    (rate / (1.0 - rate)).ln()
}
