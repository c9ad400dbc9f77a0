//! Request handlers

use crate::form::SubmissionForm;
use crate::service::{FraudService, Submission, SubmissionError};
use crate::types::LogRecord;
use crate::web::page::{self, HistoryView, Outcome, PageView};
use axum::extract::{Form, Json, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

type AppState = State<Arc<FraudService>>;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub kind: &'static str,
    pub error: String,
}

impl ApiError {
    fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            error: message,
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        let (status, kind) = match &e {
            SubmissionError::Invalid(_) => (StatusCode::BAD_REQUEST, "validation"),
            SubmissionError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference"),
            SubmissionError::Log(_) => (StatusCode::INTERNAL_SERVER_ERROR, "log"),
        };
        Self {
            status,
            kind,
            error: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub records: Vec<LogRecord>,
}

/// Run a blocking closure against the service off the async runtime
async fn blocking<T, F>(service: Arc<FraudService>, f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&FraudService) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| {
            error!(error = %e, "Blocking task failed");
            format!("Internal error: {e}")
        })
}

async fn load_history(service: Arc<FraudService>) -> HistoryView {
    match blocking(service, |s| s.history()).await {
        Ok(result) => result.into(),
        Err(message) => HistoryView::Unavailable(message),
    }
}

pub async fn index(State(service): AppState) -> Html<String> {
    let form = SubmissionForm::default();
    let history = load_history(service).await;
    Html(page::render(&PageView {
        form: &form,
        outcome: None,
        history,
    }))
}

pub async fn predict_form(State(service): AppState, Form(form): Form<SubmissionForm>) -> Response {
    let submitted = form.clone();
    let result = blocking(service.clone(), move |s| s.submit(&submitted)).await;

    let (status, outcome) = match result {
        Ok(Ok(submission)) => (StatusCode::OK, Outcome::Checked(submission)),
        Ok(Err(SubmissionError::Invalid(e))) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Outcome::Rejected(e.to_string()))
        }
        Ok(Err(e)) => (StatusCode::INTERNAL_SERVER_ERROR, Outcome::Failed(e.to_string())),
        Err(message) => (StatusCode::INTERNAL_SERVER_ERROR, Outcome::Failed(message)),
    };

    let history = load_history(service).await;
    let html = page::render(&PageView {
        form: &form,
        outcome: Some(outcome),
        history,
    });
    (status, Html(html)).into_response()
}

pub async fn predict_json(
    State(service): AppState,
    Json(form): Json<SubmissionForm>,
) -> Result<Json<Submission>, ApiError> {
    let submission = blocking(service, move |s| s.submit(&form))
        .await
        .map_err(ApiError::internal)??;
    Ok(Json(submission))
}

pub async fn history_json(State(service): AppState) -> Result<Json<HistoryResponse>, ApiError> {
    let records = blocking(service, |s| s.history())
        .await
        .map_err(ApiError::internal)?
        .map_err(|e| ApiError::internal(format!("{e:#}")))?
        .unwrap_or_default();
    Ok(Json(HistoryResponse { records }))
}

pub async fn health(State(service): AppState) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "fraud-check",
        "version": env!("CARGO_PKG_VERSION"),
        "model": service.model_name(),
    }))
}

pub async fn metrics(State(service): AppState) -> impl IntoResponse {
    Json(service.metrics().snapshot())
}
