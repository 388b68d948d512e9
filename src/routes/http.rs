//! HTTP endpoint handlers. These are thin wrappers that authenticate the
//! caller once, gate by role where required, and forward to core logic.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::HeaderMap,
  Json,
};
use tracing::{info, instrument};

use crate::auth::{bearer_token, require_admin, IdentityService, UserInfo};
use crate::domain::AuthUser;
use crate::error::ApiError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

/// Resolve the bearer credential to a verified identity, once per request.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
  state.identity.authenticate(bearer_token(headers)?).await
}

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, headers, body), fields(title = %body.title))]
pub async fn http_ingest_document(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<IngestIn>,
) -> Result<Json<IngestOut>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  require_admin(&user)?;
  let out = logic::ingest_document(&state, &user, body).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, headers, body), fields(document_id = %body.document_id, learners = body.learner_ids.len()))]
pub async fn http_assign_document(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<AssignIn>,
) -> Result<Json<AssignOut>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  require_admin(&user)?;
  let assigned_count = logic::assign_document(&state, &body.document_id, &body.learner_ids).await?;
  Ok(Json(AssignOut { assigned_count }))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_learner_roster(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<UserInfo>>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  require_admin(&user)?;
  Ok(Json(state.identity.learners().await))
}

#[instrument(level = "info", skip(state, headers), fields(learner_id = %id))]
pub async fn http_learner_progress(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Result<Json<LearnerProgressOut>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  require_admin(&user)?;
  Ok(Json(logic::learner_progress(&state, &id).await?))
}

#[instrument(level = "info", skip(state, headers), fields(document_id = %id))]
pub async fn http_document_status(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Result<Json<DocumentStatusOut>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  require_admin(&user)?;
  Ok(Json(logic::document_status(&state, &id).await?))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_my_documents(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<DocumentProgressOut>>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  Ok(Json(logic::learner_documents(&state, &user.id).await?))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_my_scores(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<ScoreOut>>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  Ok(Json(logic::learner_scores(&state, &user.id).await?))
}

#[instrument(level = "info", skip(state, headers), fields(document_id = %id))]
pub async fn http_mark_read(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Result<Json<MarkedReadOut>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  logic::mark_read(&state, &user, &id).await?;
  info!(target: "lms_backend", learner = %user.id, document_id = %id, "document marked read");
  Ok(Json(MarkedReadOut { marked: true }))
}

#[instrument(level = "info", skip(state, headers), fields(document_id = %id))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(id): Path<String>,
) -> Result<Json<QuizOut>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  Ok(Json(logic::quiz_for_document(&state, &user, &id).await?))
}

#[instrument(level = "info", skip(state, headers, body), fields(quiz_id = %body.quiz_id, answered = body.answers.len()))]
pub async fn http_save_progress(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<SaveProgressIn>,
) -> Result<Json<SavedOut>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  logic::save_progress(&state, &user, &body.quiz_id, body.answers).await?;
  Ok(Json(SavedOut { saved: true }))
}

#[instrument(level = "info", skip(state, headers, body), fields(quiz_id = %body.quiz_id, answered = body.answers.len()))]
pub async fn http_submit_quiz(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, ApiError> {
  let user = authenticate(&state, &headers).await?;
  let out = logic::submit_quiz(&state, &user, &body.quiz_id, body.answers).await?;
  info!(target: "quiz", quiz_id = %body.quiz_id, score = %format!("{:.1}", out.score), "HTTP submit evaluated");
  Ok(Json(out))
}
