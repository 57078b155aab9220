//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::{FromRequest, rejection::JsonRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// `From<beat_core::Error>` lets handlers use `?` on service calls; the
/// mapping below fixes the status code for each leg of the domain taxonomy.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("precondition failed: {0}")]
  PreconditionFailed(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("dependency unavailable: {0}")]
  Dependency(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<beat_core::Error> for ApiError {
  fn from(err: beat_core::Error) -> Self {
    use beat_core::Error as CoreError;
    match err {
      CoreError::UnitNotFound(_)
      | CoreError::AlertNotFound(_)
      | CoreError::PatrolNotFound(_) => ApiError::NotFound(err.to_string()),
      CoreError::SummaryNotReady(_) => ApiError::PreconditionFailed(err.to_string()),
      CoreError::InvalidCoordinates { .. }
      | CoreError::InvalidConfidence(_)
      | CoreError::InvalidResultCount => ApiError::BadRequest(err.to_string()),
      CoreError::Retrieval(source) | CoreError::Generation(source) => {
        ApiError::Dependency(source)
      }
      CoreError::Store(source) => ApiError::Store(source),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::PreconditionFailed(m) => (StatusCode::PRECONDITION_FAILED, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Dependency(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

// ─── Request body extractor ───────────────────────────────────────────────────

/// [`axum::Json`] with its rejection routed through [`ApiError`], so a
/// malformed body gets the same `{"error": ...}` shape as every other
/// failure (and a 400, not axum's 422).
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}
