mod support;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use churnkit::dataset::SCHEMA_FILE_NAME;
use churnkit::ml::{CHURN_LABEL, ModelKind, STAY_LABEL};
use churnkit::server::{AppState, build_router};
use churnkit::training::run_training;
use serde_json::{Value, json};
use support::{churn_csv, customer_body, models_dir, settings_with_dataset};
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

/// Train into a fresh directory; `prepare` may remove files before loading.
fn trained_app(prepare: impl FnOnce(&Path)) -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let settings = settings_with_dataset(dir.path(), &churn_csv(180));
    run_training(&settings).unwrap();
    let models = models_dir(dir.path());
    prepare(&models);
    let state = AppState::load(&models);
    (dir, build_router(Arc::new(state)))
}

async fn post_raw(app: &Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let req = Request::post("/predict")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: &Router, body: &Value) -> (StatusCode, Value) {
    post_raw(app, serde_json::to_vec(body).unwrap()).await
}

fn assert_consistent(body: &Value) {
    let probability = body["probability"].as_f64().unwrap();
    let prediction = body["prediction"].as_u64().unwrap();
    assert!((0.0..=1.0).contains(&probability));
    assert_eq!(prediction, u64::from(probability >= 0.5));
    let expected = if prediction == 1 { CHURN_LABEL } else { STAY_LABEL };
    assert_eq!(body["label"], expected);
}

#[tokio::test]
async fn index_reports_loaded_models() {
    let (_dir, app) = trained_app(|_| {});
    let req = Request::get("/").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({"status": "ok", "models_loaded": {"logistic": true, "tree": true}})
    );
}

#[tokio::test]
async fn predicts_with_both_models() {
    let (_dir, app) = trained_app(|_| {});
    for model in [None, Some("logistic"), Some("tree")] {
        let (status, body) = post_json(&app, &customer_body(model)).await;
        assert_eq!(status, StatusCode::OK, "{model:?}: {body}");
        assert_consistent(&body);
    }
}

#[tokio::test]
async fn default_model_is_logistic() {
    let (_dir, app) = trained_app(|_| {});
    let (_, implicit) = post_json(&app, &customer_body(None)).await;
    let (_, explicit) = post_json(&app, &customer_body(Some("logistic"))).await;
    assert_eq!(implicit, explicit);
}

#[tokio::test]
async fn key_order_does_not_change_the_prediction() {
    let (_dir, app) = trained_app(|_| {});
    let forward = r#"{"gender":"Male","tenure":40,"Contract":"Two year","MonthlyCharges":30.5,"TotalCharges":1220,"SeniorCitizen":0,"Partner":"Yes","PaymentMethod":"Mailed check"}"#;
    let reversed = r#"{"PaymentMethod":"Mailed check","Partner":"Yes","SeniorCitizen":0,"TotalCharges":1220,"MonthlyCharges":30.5,"Contract":"Two year","tenure":40,"gender":"Male"}"#;
    let (_, a) = post_raw(&app, forward).await;
    let (_, b) = post_raw(&app, reversed).await;
    assert_eq!(a, b);
    assert_consistent(&a);
}

#[tokio::test]
async fn unknown_model_is_bad_request() {
    let (_dir, app) = trained_app(|_| {});
    let (status, body) = post_json(&app, &customer_body(Some("randomforest"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], r#"model must be "logistic" or "tree" or omitted"#);
}

#[tokio::test]
async fn missing_or_malformed_body_is_bad_request() {
    let (_dir, app) = trained_app(|_| {});
    for raw in ["", "{}", "null"] {
        let (status, body) = post_raw(&app, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{raw:?}");
        assert_eq!(body["error"], "No JSON body provided");
    }
    for raw in ["{\"tenure\":", "[1, 2]", "\"text\""] {
        let (status, body) = post_raw(&app, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{raw:?}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn selector_only_body_uses_imputed_values() {
    let (_dir, app) = trained_app(|_| {});
    let (status, body) = post_json(&app, &json!({"_model": "logistic"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_consistent(&body);
}

#[tokio::test]
async fn unavailable_model_fails_only_for_that_model() {
    let (_dir, app) = trained_app(|models| {
        std::fs::remove_file(models.join(ModelKind::Tree.file_name())).unwrap();
    });
    let (status, body) = post_json(&app, &customer_body(Some("tree"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Requested model not available on server");

    let (status, body) = post_json(&app, &customer_body(Some("logistic"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_consistent(&body);

    let req = Request::get("/").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    let index: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(index["models_loaded"]["tree"], false);
    assert_eq!(index["models_loaded"]["logistic"], true);
}

#[tokio::test]
async fn bad_field_values_are_inference_errors() {
    let (_dir, app) = trained_app(|_| {});

    let mut body = customer_body(None);
    body["tenure"] = json!("a long time");
    let (status, response) = post_json(&app, &body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response["error"].as_str().unwrap().contains("tenure"));

    let mut body = customer_body(None);
    body["Contract"] = json!(["Two year"]);
    let (status, _) = post_json(&app, &body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn lenient_values_are_accepted() {
    let (_dir, app) = trained_app(|_| {});
    let mut body = customer_body(Some("tree"));
    body["SeniorCitizen"] = json!(true);
    body["gender"] = json!(7);
    body["PaymentMethod"] = json!("Carrier pigeon");
    body["unused"] = json!({"nested": 1});
    body["MonthlyCharges"] = Value::Null;
    let (status, response) = post_json(&app, &body).await;
    assert_eq!(status, StatusCode::OK, "{response}");
    assert_consistent(&response);
}

#[tokio::test]
async fn without_schema_request_keys_are_used_verbatim() {
    let (_dir, app) = trained_app(|models| {
        std::fs::remove_file(models.join(SCHEMA_FILE_NAME)).unwrap();
    });
    let (status, body) = post_json(&app, &customer_body(None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_consistent(&body);

    let mut partial = customer_body(None);
    partial.as_object_mut().unwrap().remove("Contract");
    let (status, body) = post_json(&app, &partial).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "columns are missing: Contract");
}

#[tokio::test]
async fn huge_numeric_inputs_still_yield_probabilities() {
    let (_dir, app) = trained_app(|_| {});
    for value in [1e38, 1e40, 1e300, -1e300] {
        for model in ["logistic", "tree"] {
            let mut body = customer_body(Some(model));
            body["tenure"] = json!(value);
            body["MonthlyCharges"] = json!(value);
            body["TotalCharges"] = json!(value);
            let (status, response) = post_json(&app, &body).await;
            assert_eq!(status, StatusCode::OK, "{model} {value}: {response}");
            assert_consistent(&response);
        }
    }
}
