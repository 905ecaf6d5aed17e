use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::{Map, Value};

use super::error::ApiError;
use super::state::AppState;
use crate::dataset::RawRecord;
use crate::ml::{ModelKind, Prediction};

/// Request key selecting the model; never treated as a feature.
pub const MODEL_SELECTOR_KEY: &str = "_model";

/// `GET /`: liveness plus per-model load state.
pub async fn index(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "models_loaded": {
            "logistic": state.slot(ModelKind::Logistic).is_loaded(),
            "tree": state.slot(ModelKind::Tree).is_loaded(),
        }
    }))
}

/// `POST /predict`: score one customer record.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Prediction>, ApiError> {
    let mut fields = parse_body(&body)?;
    let kind = take_model_selector(&mut fields)?;
    let pipeline = state
        .pipeline(kind)
        .ok_or(ApiError::ModelUnavailable(kind))?;

    let record = RawRecord::from_json(&fields, state.schema())?;
    let probability = pipeline.predict_proba(&record)?;
    let prediction = Prediction::from_probability(probability)?;
    tracing::debug!(
        model = %kind,
        probability = prediction.probability,
        prediction = prediction.prediction,
        "Scored request"
    );
    Ok(Json(prediction))
}

/// Parse a non-empty JSON object; the content type is not checked.
fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MissingBody);
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|err| ApiError::MalformedBody(err.to_string()))?;
    match value {
        Value::Object(map) if map.is_empty() => Err(ApiError::MissingBody),
        Value::Object(map) => Ok(map),
        Value::Null => Err(ApiError::MissingBody),
        _ => Err(ApiError::NotAnObject),
    }
}

/// Remove `_model` from the body, defaulting to the logistic pipeline.
fn take_model_selector(fields: &mut Map<String, Value>) -> Result<ModelKind, ApiError> {
    match fields.remove(MODEL_SELECTOR_KEY) {
        None => Ok(ModelKind::Logistic),
        Some(Value::String(name)) => ModelKind::from_selector(&name).ok_or(ApiError::UnknownModel),
        Some(_) => Err(ApiError::UnknownModel),
    }
}
