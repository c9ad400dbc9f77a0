mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{service_with, AmountRule, ConstantLabel};
use fraud_check::web::{self, page::EMPTY_HISTORY_MESSAGE};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const SHOPCO_FORM: &str = "merchant=ShopCo&category=grocery&amt=42.50&lat=40.0&long=-75.0\
&merch_lat=40.1&merch_long=-75.1&hour=14&day=5&month=3&gender=Female&cc_num=4111111111111111";

fn app(log_path: &Path) -> Router {
    web::router(Arc::new(service_with(
        Arc::new(AmountRule::new(1000.0)),
        log_path,
    )))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_index_without_log_shows_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let (status, html) = send(app(&dir.path().join("log.csv")), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Fraud Detection System"));
    assert!(html.contains(EMPTY_HISTORY_MESSAGE));
    assert!(html.contains("name=\"cc_num\""));
}

#[tokio::test]
async fn test_form_submission_renders_verdict_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("log.csv");
    let app = app(&log_path);

    let (status, html) = send(app.clone(), post_form(SHOPCO_FORM)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Prediction: Legitimate Transaction"));
    assert!(html.contains("<td>ShopCo</td>"));
    assert!(!html.contains(EMPTY_HISTORY_MESSAGE));
    assert!(log_path.exists());

    // A later page load shows the same history
    let (_, first) = send(app.clone(), get("/")).await;
    let (_, second) = send(app, get("/")).await;
    assert_eq!(first, second);
    assert!(first.contains("<td>ShopCo</td>"));
}

#[tokio::test]
async fn test_form_missing_fields_shows_error() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("log.csv");

    let (status, html) = send(
        app(&log_path),
        post_form("merchant=&category=grocery&amt=&gender=Male&cc_num="),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(html.contains("Please fill all required fields!"));
    assert!(html.contains(EMPTY_HISTORY_MESSAGE));
    assert!(!log_path.exists());
}

#[tokio::test]
async fn test_form_malformed_number_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("log.csv");

    let (status, _) = send(
        app(&log_path),
        post_form("merchant=a&category=b&cc_num=1&amt=lots"),
    )
    .await;

    assert!(status.is_client_error());
    assert!(!log_path.exists());
}

#[tokio::test]
async fn test_api_predict_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir.path().join("log.csv"));

    let (status, body) = send(
        app.clone(),
        post_json(serde_json::json!({
            "merchant": "Corner Store",
            "category": "shopping_net",
            "amt": 2500.0,
            "gender": "Male",
            "cc_num": "5500000000000004"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let submission: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(submission["verdict"], "Fraudulent Transaction");
    assert_eq!(submission["distance_km"], 0.0);
    assert_eq!(submission["features"]["cc_num"], 6);
    assert_eq!(submission["record"]["result"], "Fraudulent Transaction");

    let (status, body) = send(app, get("/api/history")).await;
    assert_eq!(status, StatusCode::OK);
    let history: Value = serde_json::from_str(&body).unwrap();
    let records = history["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["merchant"], "Corner Store");
    assert_eq!(records[0]["hour"], 12);
}

#[tokio::test]
async fn test_api_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        app(&dir.path().join("log.csv")),
        post_json(serde_json::json!({ "merchant": "ShopCo", "hour": 30 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["kind"], "validation");
}

#[tokio::test]
async fn test_api_inference_error() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("log.csv");
    let app = web::router(Arc::new(service_with(Arc::new(ConstantLabel(9)), &log_path)));

    let (status, body) = send(
        app,
        post_json(serde_json::json!({ "merchant": "a", "category": "b", "cc_num": "1" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["kind"], "inference");
    assert!(!log_path.exists());
}

#[tokio::test]
async fn test_empty_history_api() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(app(&dir.path().join("log.csv")), get("/api/history")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"records":[]}"#);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir.path().join("log.csv"));

    let (status, body) = send(app.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["model"], "amount_rule");

    send(app.clone(), post_form(SHOPCO_FORM)).await;

    let (status, body) = send(app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let metrics: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(metrics["submissions_processed"], 1);
    assert_eq!(metrics["fraud_verdicts"], 0);
}
