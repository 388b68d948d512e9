//! Request-level error taxonomy.
//!
//! Generation failures never appear here: the quiz generator degrades to
//! stock content instead (see `generator`). Everything a caller can observe
//! as a failure maps to one of these variants.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0} not found")]
  NotFound(&'static str),
  #[error("missing or invalid credentials")]
  Unauthorized,
  #[error("insufficient role for this operation")]
  Forbidden,
  #[error("text extraction failed: {0}")]
  Extraction(String),
  #[error("store error: {0}")]
  Store(String),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::Extraction(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = Json(serde_json::json!({ "error": self.to_string() }));
    (status, body).into_response()
  }
}
