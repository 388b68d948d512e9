//! Router assembly: HTTP endpoints, static file serving for uploads, CORS,
//! and HTTP tracing.

use std::sync::Arc;

use axum::{
  routing::{get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  services::ServeDir,
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...` (admin + learner surfaces)
/// - Uploaded source files served read-only under `/uploads`
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  let uploads = ServeDir::new(&state.settings.upload_dir);

  Router::new()
    .route("/api/v1/health", get(http::http_health))
    // Admin surface
    .route("/api/v1/admin/documents", post(http::http_ingest_document))
    .route("/api/v1/admin/assignments", post(http::http_assign_document))
    .route("/api/v1/admin/learners", get(http::http_learner_roster))
    .route("/api/v1/admin/learners/:id/progress", get(http::http_learner_progress))
    .route("/api/v1/admin/documents/:id/status", get(http::http_document_status))
    // Learner surface
    .route("/api/v1/my/documents", get(http::http_my_documents))
    .route("/api/v1/my/scores", get(http::http_my_scores))
    .route("/api/v1/documents/:id/read", post(http::http_mark_read))
    .route("/api/v1/documents/:id/quiz", get(http::http_get_quiz))
    .route("/api/v1/quiz/progress", post(http::http_save_progress))
    .route("/api/v1/quiz/submit", post(http::http_submit_quiz))
    // Uploaded source files
    .nest_service("/uploads", uploads)
    // State + CORS + HTTP tracing
    .with_state(state)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}
