//! Request/response DTOs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::UserInfo;
use crate::domain::{AnswerMap, Question};

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct IngestIn {
  pub title: String,
  #[serde(default)]
  pub description: String,
  /// Stored-file reference; the extractor resolves it to text.
  pub file: String,
}
#[derive(Serialize)]
pub struct IngestOut {
  pub document_id: String,
  pub quiz_id: String,
  pub question_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AssignIn {
  pub document_id: String,
  pub learner_ids: Vec<String>,
}
#[derive(Serialize)]
pub struct AssignOut {
  pub assigned_count: usize,
}

#[derive(Serialize)]
pub struct MarkedReadOut {
  pub marked: bool,
}

/// Quiz delivery: the questions plus whatever the learner already saved.
#[derive(Serialize)]
pub struct QuizOut {
  pub quiz_id: String,
  pub questions: Vec<Question>,
  pub saved_answers: Option<AnswerMap>,
  pub is_completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveProgressIn {
  pub quiz_id: String,
  pub answers: AnswerMap,
}
#[derive(Serialize)]
pub struct SavedOut {
  pub saved: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
  pub quiz_id: String,
  pub answers: AnswerMap,
}
#[derive(Serialize)]
pub struct SubmitOut {
  pub score: f32,
  pub correct: usize,
  pub total: usize,
}

/// One assigned document as a learner (or an admin looking at a learner)
/// sees it.
#[derive(Serialize)]
pub struct DocumentProgressOut {
  pub document_id: String,
  pub title: String,
  pub description: String,
  pub file: String,
  pub is_read: bool,
  pub read_at: Option<DateTime<Utc>>,
  pub is_quiz_completed: bool,
  pub quiz_completed_at: Option<DateTime<Utc>>,
  pub score: Option<f32>,
}

#[derive(Serialize)]
pub struct LearnerProgressOut {
  pub user: UserInfo,
  pub documents: Vec<DocumentProgressOut>,
}

#[derive(Serialize)]
pub struct LearnerStatusOut {
  pub learner_id: String,
  pub name: String,
  pub email: String,
  pub is_read: bool,
  pub read_at: Option<DateTime<Utc>>,
  pub is_quiz_completed: bool,
  pub quiz_completed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct DocumentStatusOut {
  pub title: String,
  pub total_assignments: usize,
  pub read_count: usize,
  pub completed_count: usize,
  pub learners: Vec<LearnerStatusOut>,
}

#[derive(Serialize)]
pub struct ScoreOut {
  pub title: String,
  pub score: f32,
  pub submitted_at: DateTime<Utc>,
  pub total_questions: usize,
}
