use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::dataset::UnsupportedValue;
use crate::ml::{ModelKind, PredictError};

/// Request failures and their HTTP mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No JSON body provided")]
    MissingBody,
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),
    #[error("JSON body must be an object")]
    NotAnObject,
    #[error("model must be \"logistic\" or \"tree\" or omitted")]
    UnknownModel,
    #[error("Requested model not available on server")]
    ModelUnavailable(ModelKind),
    #[error(transparent)]
    Inference(#[from] PredictError),
}

impl From<UnsupportedValue> for ApiError {
    fn from(err: UnsupportedValue) -> Self {
        Self::Inference(PredictError::from(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingBody | Self::MalformedBody(_) | Self::NotAnObject | Self::UnknownModel => {
                StatusCode::BAD_REQUEST
            }
            Self::ModelUnavailable(_) | Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Inference(err) => tracing::error!(error = %err, "Prediction failed"),
            Self::ModelUnavailable(kind) => {
                tracing::warn!(model = %kind, "Prediction requested for unavailable model")
            }
            _ => tracing::debug!(error = %self, "Rejected prediction request"),
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
