//! Domain models persisted by the store: documents, quizzes, assignments,
//! submissions, plus the verified caller identity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role claim attached to a verified caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Admin,
  Employee,
}

/// Verified identity produced once at the request boundary.
/// Core operations receive this value and never re-derive it.
#[derive(Clone, Debug)]
pub struct AuthUser {
  pub id: String,
  pub role: Role,
}

/// Where did the quiz content come from?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizSource {
  Generated, // produced by the LLM and validated
  Stock,     // deterministic fallback content
}

/// One multiple-choice question. This exact field naming is both the
/// LLM-response contract and the persisted schema; it must round-trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub question: String,
  /// Exactly 4 distinct options.
  pub options: Vec<String>,
  /// Equals one element of `options`.
  pub answer: String,
}

/// An assignable piece of reading material. Immutable after ingestion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  /// Stored-file reference resolved by the text extractor.
  pub file: String,
  pub owner: String,
  pub created_at: DateTime<Utc>,
}

/// The question set tied to one document (1:1). Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quiz {
  pub id: String,
  pub document_id: String,
  pub questions: Vec<Question>,
  pub source: QuizSource,
  pub created_at: DateTime<Utc>,
}

/// Links one learner to one document. Unique per (learner, document) pair;
/// created idempotently and never deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assignment {
  pub learner_id: String,
  pub document_id: String,
  pub is_read: bool,
  #[serde(default)]
  pub read_at: Option<DateTime<Utc>>,
  pub is_quiz_completed: bool,
  #[serde(default)]
  pub quiz_completed_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

/// Answers keyed by stringified 0-based question index.
pub type AnswerMap = HashMap<String, String>;

/// One learner's answers and score for one quiz. Unique per (learner, quiz)
/// pair; progress saves and the final submit upsert the same record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Submission {
  pub learner_id: String,
  pub quiz_id: String,
  #[serde(default)]
  pub in_progress_answers: Option<AnswerMap>,
  #[serde(default)]
  pub final_answers: Option<AnswerMap>,
  #[serde(default)]
  pub score: Option<f32>,
  #[serde(default)]
  pub submitted_at: Option<DateTime<Utc>>,
}
