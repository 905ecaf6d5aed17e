use serde::{Deserialize, Serialize};

use super::error::PredictError;

pub const CHURN_LABEL: &str = "Customer likely to churn";
pub const STAY_LABEL: &str = "Customer will stay";

/// Decision threshold on the churn probability.
pub const THRESHOLD: f64 = 0.5;

/// Response body of a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: u8,
    pub label: String,
    pub probability: f64,
}

impl Prediction {
    /// `prediction` is 1 iff `probability >= 0.5`.
    pub fn from_probability(probability: f64) -> Result<Self, PredictError> {
        if !probability.is_finite() {
            return Err(PredictError::NonFinite);
        }
        let probability = probability.clamp(0.0, 1.0);
        let prediction = u8::from(probability >= THRESHOLD);
        let label = if prediction == 1 { CHURN_LABEL } else { STAY_LABEL };
        Ok(Self {
            prediction,
            label: label.to_string(),
            probability,
        })
    }
}
