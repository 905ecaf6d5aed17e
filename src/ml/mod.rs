//! Machine learning building blocks for training and inference.
//!
//! The classifiers are small deterministic implementations that serialize to
//! plain JSON, so the service needs nothing but these types to load them.

mod error;
pub mod logistic;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
mod prediction;
pub mod tree;

pub use error::{ModelError, PredictError};
pub use pipeline::{Classifier, ModelKind, Pipeline};
pub use prediction::{CHURN_LABEL, Prediction, STAY_LABEL};
pub use preprocess::Preprocessor;

/// Encoded feature rows with binary labels.
#[derive(Debug, Clone, Default)]
pub struct TrainSet {
    pub x: Vec<Vec<f32>>,
    pub y: Vec<u8>,
}

impl TrainSet {
    /// Check shape and labels, returning the feature dimension.
    pub fn validate(&self) -> Result<usize, ModelError> {
        if self.x.is_empty() || self.y.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if self.x.len() != self.y.len() {
            return Err(ModelError::LengthMismatch {
                rows: self.x.len(),
                labels: self.y.len(),
            });
        }
        let dim = self.x[0].len();
        for (row, values) in self.x.iter().enumerate() {
            if values.len() != dim {
                return Err(ModelError::InconsistentRow {
                    row,
                    expected: dim,
                    found: values.len(),
                });
            }
        }
        if let Some(bad) = self.y.iter().find(|&&label| label > 1) {
            return Err(ModelError::Invalid(format!("label {bad} is not binary")));
        }
        let positives = self.y.iter().filter(|&&label| label == 1).count();
        if positives == 0 || positives == self.y.len() {
            return Err(ModelError::SingleClass);
        }
        Ok(dim)
    }
}
