//! Core behaviors behind the HTTP handlers:
//!
//!   - Document ingestion (extract text, generate the quiz once, persist)
//!   - Assignment tracker (idempotent assign, mark-read, mark-completed)
//!   - Submission engine (save progress, score and submit)
//!   - Progress queries (per-learner and per-document joins)

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::IdentityService;
use crate::domain::{AnswerMap, Assignment, AuthUser, Document, Quiz};
use crate::error::ApiError;
use crate::extract::TextExtractor;
use crate::protocol::{
  DocumentProgressOut, DocumentStatusOut, IngestIn, IngestOut, LearnerProgressOut,
  LearnerStatusOut, QuizOut, ScoreOut, SubmitOut,
};
use crate::state::AppState;
use crate::store::Store;

/// Ingest a document: extract its text, generate the quiz once, persist
/// document then quiz. Extraction failure aborts the request; generation
/// never does (worst case the quiz carries stock content).
#[instrument(level = "info", skip(state, req), fields(title = %req.title, file = %req.file, owner = %owner.id))]
pub async fn ingest_document(
  state: &AppState,
  owner: &AuthUser,
  req: IngestIn,
) -> Result<IngestOut, ApiError> {
  let text = state.extractor.extract(&req.file).await?;
  let outcome = state.generator.generate(&text, state.settings.question_count).await;

  let doc = Document {
    id: Uuid::new_v4().to_string(),
    title: req.title,
    description: req.description,
    file: req.file,
    owner: owner.id.clone(),
    created_at: Utc::now(),
  };
  let quiz = Quiz {
    id: Uuid::new_v4().to_string(),
    document_id: doc.id.clone(),
    questions: outcome.questions,
    source: outcome.source,
    created_at: Utc::now(),
  };

  state.store.insert_document(doc.clone()).await?;
  state.store.insert_quiz(quiz.clone()).await?;
  info!(
    target: "quiz",
    document_id = %doc.id,
    quiz_id = %quiz.id,
    questions = quiz.questions.len(),
    source = ?quiz.source,
    "document ingested"
  );

  Ok(IngestOut {
    document_id: doc.id,
    quiz_id: quiz.id,
    question_count: quiz.questions.len(),
  })
}

/// Link a document to a set of learners. Pairs that already exist are
/// skipped; re-assigning is not an error. Returns how many links were newly
/// created.
#[instrument(level = "info", skip(state, learner_ids), fields(%document_id, requested = learner_ids.len()))]
pub async fn assign_document(
  state: &AppState,
  document_id: &str,
  learner_ids: &[String],
) -> Result<usize, ApiError> {
  if state.store.find_document(document_id).await?.is_none() {
    return Err(ApiError::NotFound("document"));
  }

  let mut fresh: Vec<Assignment> = Vec::new();
  for learner_id in learner_ids {
    if fresh.iter().any(|a| a.learner_id == *learner_id) {
      continue;
    }
    if state.store.find_assignment(learner_id, document_id).await?.is_some() {
      continue;
    }
    fresh.push(Assignment {
      learner_id: learner_id.clone(),
      document_id: document_id.to_string(),
      is_read: false,
      read_at: None,
      is_quiz_completed: false,
      quiz_completed_at: None,
      created_at: Utc::now(),
    });
  }

  let created = fresh.len();
  if !fresh.is_empty() {
    state.store.insert_assignments(fresh).await?;
  }
  info!(target: "lms_backend", %document_id, created, "assignments created");
  Ok(created)
}

/// Mark an assigned document as read. The learner must have been assigned
/// the document first.
#[instrument(level = "info", skip(state), fields(learner = %user.id, %document_id))]
pub async fn mark_read(
  state: &AppState,
  user: &AuthUser,
  document_id: &str,
) -> Result<(), ApiError> {
  if state.store.mark_assignment_read(&user.id, document_id).await? {
    Ok(())
  } else {
    Err(ApiError::NotFound("assignment"))
  }
}

/// Deliver the quiz for a document together with the caller's saved
/// progress, if any.
#[instrument(level = "info", skip(state), fields(learner = %user.id, %document_id))]
pub async fn quiz_for_document(
  state: &AppState,
  user: &AuthUser,
  document_id: &str,
) -> Result<QuizOut, ApiError> {
  let quiz = state
    .store
    .find_quiz_by_document(document_id)
    .await?
    .ok_or(ApiError::NotFound("quiz"))?;
  let submission = state.store.find_submission(&user.id, &quiz.id).await?;

  Ok(QuizOut {
    quiz_id: quiz.id,
    questions: quiz.questions,
    saved_answers: submission.as_ref().and_then(|s| s.in_progress_answers.clone()),
    is_completed: submission.as_ref().is_some_and(|s| s.score.is_some()),
  })
}

/// Save in-progress answers. Never computes a score and never touches the
/// assignment; repeated saves overwrite each other (last write wins).
#[instrument(level = "info", skip(state, answers), fields(learner = %user.id, %quiz_id, answered = answers.len()))]
pub async fn save_progress(
  state: &AppState,
  user: &AuthUser,
  quiz_id: &str,
  answers: AnswerMap,
) -> Result<(), ApiError> {
  if state.store.find_quiz(quiz_id).await?.is_none() {
    return Err(ApiError::NotFound("quiz"));
  }
  state.store.upsert_submission_progress(&user.id, quiz_id, answers).await
}

/// Score the final answers, persist the submission, and flip the
/// assignment's completion flag.
///
/// The two writes are independent single-record upserts, not a transaction.
/// A crash between them leaves the score recorded but the assignment flag
/// stale; progress reads treat a set score as authoritative (see
/// `quiz_for_document`).
#[instrument(level = "info", skip(state, answers), fields(learner = %user.id, %quiz_id, answered = answers.len()))]
pub async fn submit_quiz(
  state: &AppState,
  user: &AuthUser,
  quiz_id: &str,
  answers: AnswerMap,
) -> Result<SubmitOut, ApiError> {
  let quiz = state
    .store
    .find_quiz(quiz_id)
    .await?
    .ok_or(ApiError::NotFound("quiz"))?;

  let total = quiz.questions.len();
  let correct = quiz
    .questions
    .iter()
    .enumerate()
    .filter(|(i, q)| answers.get(&i.to_string()).is_some_and(|a| *a == q.answer))
    .count();
  let score = if total == 0 { 0.0 } else { correct as f32 / total as f32 * 100.0 };

  state
    .store
    .upsert_submission_final(&user.id, quiz_id, answers, score)
    .await?;

  if !state
    .store
    .mark_assignment_quiz_completed(&user.id, &quiz.document_id)
    .await?
  {
    warn!(
      target: "lms_backend",
      learner = %user.id,
      document_id = %quiz.document_id,
      "submission recorded but no assignment to mark completed"
    );
  }

  info!(
    target: "quiz",
    learner = %user.id,
    %quiz_id,
    correct,
    total,
    score = %format!("{score:.1}"),
    "quiz submitted"
  );
  Ok(SubmitOut { score, correct, total })
}

/// Per-learner progress: every assigned document with read/quiz state and
/// the score when one exists. Stale assignments (missing document) are
/// skipped rather than failing the whole view.
#[instrument(level = "info", skip(state), fields(%learner_id))]
pub async fn learner_documents(
  state: &AppState,
  learner_id: &str,
) -> Result<Vec<DocumentProgressOut>, ApiError> {
  let mut out = Vec::new();
  for a in state.store.assignments_for_learner(learner_id).await? {
    let Some(doc) = state.store.find_document(&a.document_id).await? else {
      warn!(target: "lms_backend", document_id = %a.document_id, "assignment references missing document; skipping");
      continue;
    };
    let submission = match state.store.find_quiz_by_document(&doc.id).await? {
      Some(quiz) => state.store.find_submission(learner_id, &quiz.id).await?,
      None => None,
    };
    out.push(DocumentProgressOut {
      document_id: doc.id,
      title: doc.title,
      description: doc.description,
      file: doc.file,
      is_read: a.is_read,
      read_at: a.read_at,
      is_quiz_completed: a.is_quiz_completed,
      quiz_completed_at: a.quiz_completed_at,
      score: submission.and_then(|s| s.score),
    });
  }
  Ok(out)
}

/// Admin view of one learner: identity record plus the per-document
/// progress join.
#[instrument(level = "info", skip(state), fields(%learner_id))]
pub async fn learner_progress(
  state: &AppState,
  learner_id: &str,
) -> Result<LearnerProgressOut, ApiError> {
  let user = state
    .identity
    .user_info(learner_id)
    .await
    .ok_or(ApiError::NotFound("user"))?;
  let documents = learner_documents(state, learner_id).await?;
  Ok(LearnerProgressOut { user, documents })
}

/// Admin view of one document: read/completion counts plus per-learner
/// detail. Learners the identity service no longer knows are skipped.
#[instrument(level = "info", skip(state), fields(%document_id))]
pub async fn document_status(
  state: &AppState,
  document_id: &str,
) -> Result<DocumentStatusOut, ApiError> {
  let doc = state
    .store
    .find_document(document_id)
    .await?
    .ok_or(ApiError::NotFound("document"))?;

  let mut learners = Vec::new();
  for a in state.store.assignments_for_document(document_id).await? {
    let Some(user) = state.identity.user_info(&a.learner_id).await else {
      continue;
    };
    learners.push(LearnerStatusOut {
      learner_id: a.learner_id,
      name: user.name,
      email: user.email,
      is_read: a.is_read,
      read_at: a.read_at,
      is_quiz_completed: a.is_quiz_completed,
      quiz_completed_at: a.quiz_completed_at,
    });
  }

  Ok(DocumentStatusOut {
    title: doc.title,
    total_assignments: learners.len(),
    read_count: learners.iter().filter(|l| l.is_read).count(),
    completed_count: learners.iter().filter(|l| l.is_quiz_completed).count(),
    learners,
  })
}

/// Completed scores for one learner, joined to quiz size and document title.
/// In-progress-only submissions and stale joins are skipped.
#[instrument(level = "info", skip(state), fields(%learner_id))]
pub async fn learner_scores(
  state: &AppState,
  learner_id: &str,
) -> Result<Vec<ScoreOut>, ApiError> {
  let mut out = Vec::new();
  for s in state.store.submissions_for_learner(learner_id).await? {
    let (Some(score), Some(submitted_at)) = (s.score, s.submitted_at) else {
      continue;
    };
    let Some(quiz) = state.store.find_quiz(&s.quiz_id).await? else {
      continue;
    };
    let Some(doc) = state.store.find_document(&quiz.document_id).await? else {
      continue;
    };
    out.push(ScoreOut {
      title: doc.title,
      score,
      submitted_at,
      total_questions: quiz.questions.len(),
    });
  }
  out.sort_by_key(|s| s.submitted_at);
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use crate::auth::TokenBankIdentity;
  use crate::config::{Prompts, Settings, UserCfg};
  use crate::domain::{Question, QuizSource, Role};
  use crate::extract::FsTextExtractor;
  use crate::generator::QuizGenerator;
  use crate::store::{MemStore, Store};

  fn test_state() -> AppState {
    AppState {
      settings: Settings { port: 0, upload_dir: ".".into(), question_count: 5 },
      store: Arc::new(MemStore::new()),
      identity: Arc::new(TokenBankIdentity::new(vec![UserCfg {
        token: "tok-emp".into(),
        id: "e1".into(),
        name: "Eve".into(),
        email: "eve@example.com".into(),
        role: Role::Employee,
      }])),
      extractor: Arc::new(FsTextExtractor::new(".")),
      generator: QuizGenerator::new(None, Prompts::default()),
    }
  }

  fn learner() -> AuthUser {
    AuthUser { id: "e1".into(), role: Role::Employee }
  }

  fn answers(pairs: &[(&str, &str)]) -> AnswerMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
  }

  async fn seed_document(state: &AppState, questions: Vec<Question>) -> (String, String) {
    let doc = Document {
      id: Uuid::new_v4().to_string(),
      title: "Safety handbook".into(),
      description: String::new(),
      file: "handbook.txt".into(),
      owner: "a1".into(),
      created_at: Utc::now(),
    };
    let quiz = Quiz {
      id: Uuid::new_v4().to_string(),
      document_id: doc.id.clone(),
      questions,
      source: QuizSource::Stock,
      created_at: Utc::now(),
    };
    state.store.insert_document(doc.clone()).await.unwrap();
    state.store.insert_quiz(quiz.clone()).await.unwrap();
    (doc.id, quiz.id)
  }

  fn one_question() -> Vec<Question> {
    vec![Question {
      question: "2+2?".into(),
      options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
      answer: "4".into(),
    }]
  }

  #[tokio::test]
  async fn assign_is_idempotent() {
    let state = test_state();
    let (doc_id, _) = seed_document(&state, one_question()).await;

    let first = assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();
    let second = assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(state.store.assignments_for_document(&doc_id).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn assign_dedupes_within_one_request() {
    let state = test_state();
    let (doc_id, _) = seed_document(&state, one_question()).await;

    let created = assign_document(&state, &doc_id, &["e1".into(), "e1".into(), "e2".into()])
      .await
      .unwrap();
    assert_eq!(created, 2);
  }

  #[tokio::test]
  async fn assign_unknown_document_is_not_found() {
    let state = test_state();
    assert!(matches!(
      assign_document(&state, "missing", &["e1".into()]).await,
      Err(ApiError::NotFound("document"))
    ));
  }

  #[tokio::test]
  async fn mark_read_requires_an_assignment() {
    let state = test_state();
    let (doc_id, _) = seed_document(&state, one_question()).await;

    assert!(matches!(
      mark_read(&state, &learner(), &doc_id).await,
      Err(ApiError::NotFound("assignment"))
    ));

    assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();
    mark_read(&state, &learner(), &doc_id).await.unwrap();

    let a = state.store.find_assignment("e1", &doc_id).await.unwrap().unwrap();
    assert!(a.is_read);
    assert!(a.read_at.is_some());
  }

  #[tokio::test]
  async fn save_progress_round_trips_without_score() {
    let state = test_state();
    let (doc_id, quiz_id) = seed_document(&state, one_question()).await;

    let saved = answers(&[("0", "3")]);
    save_progress(&state, &learner(), &quiz_id, saved.clone()).await.unwrap();

    let quiz = quiz_for_document(&state, &learner(), &doc_id).await.unwrap();
    assert_eq!(quiz.saved_answers, Some(saved));
    assert!(!quiz.is_completed);
  }

  #[tokio::test]
  async fn save_progress_unknown_quiz_is_not_found() {
    let state = test_state();
    assert!(matches!(
      save_progress(&state, &learner(), "missing", answers(&[])).await,
      Err(ApiError::NotFound("quiz"))
    ));
  }

  #[tokio::test]
  async fn one_question_scenario_end_to_end() {
    let state = test_state();
    let (doc_id, quiz_id) = seed_document(&state, one_question()).await;
    assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();

    let result = submit_quiz(&state, &learner(), &quiz_id, answers(&[("0", "4")]))
      .await
      .unwrap();
    assert_eq!(result.score, 100.0);
    assert_eq!(result.correct, 1);
    assert_eq!(result.total, 1);

    let a = state.store.find_assignment("e1", &doc_id).await.unwrap().unwrap();
    assert!(a.is_quiz_completed);
    assert!(a.quiz_completed_at.is_some());

    let s = state.store.find_submission("e1", &quiz_id).await.unwrap().unwrap();
    assert!(s.in_progress_answers.is_none());
    assert_eq!(s.score, Some(100.0));
  }

  #[tokio::test]
  async fn scoring_counts_exact_matches_only() {
    let state = test_state();
    let questions = vec![
      Question {
        question: "Q1".into(),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        answer: "A".into(),
      },
      Question {
        question: "Q2".into(),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        answer: "B".into(),
      },
      Question {
        question: "Q3".into(),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        answer: "C".into(),
      },
      Question {
        question: "Q4".into(),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        answer: "D".into(),
      },
    ];
    let (doc_id, quiz_id) = seed_document(&state, questions).await;
    assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();

    // One exact match, one wrong, one case mismatch, one missing.
    let result = submit_quiz(
      &state,
      &learner(),
      &quiz_id,
      answers(&[("0", "A"), ("1", "D"), ("2", "c")]),
    )
    .await
    .unwrap();
    assert_eq!(result.correct, 1);
    assert_eq!(result.total, 4);
    assert_eq!(result.score, 25.0);
  }

  #[tokio::test]
  async fn empty_quiz_scores_zero_without_fault() {
    let state = test_state();
    let (doc_id, quiz_id) = seed_document(&state, Vec::new()).await;
    assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();

    let result = submit_quiz(&state, &learner(), &quiz_id, answers(&[])).await.unwrap();
    assert_eq!(result.score, 0.0);
    assert_eq!(result.total, 0);
  }

  #[tokio::test]
  async fn submit_unknown_quiz_is_not_found() {
    let state = test_state();
    assert!(matches!(
      submit_quiz(&state, &learner(), "missing", answers(&[])).await,
      Err(ApiError::NotFound("quiz"))
    ));
  }

  #[tokio::test]
  async fn progress_save_after_submit_keeps_the_score() {
    let state = test_state();
    let (doc_id, quiz_id) = seed_document(&state, one_question()).await;
    assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();

    submit_quiz(&state, &learner(), &quiz_id, answers(&[("0", "4")])).await.unwrap();
    save_progress(&state, &learner(), &quiz_id, answers(&[("0", "3")])).await.unwrap();

    let s = state.store.find_submission("e1", &quiz_id).await.unwrap().unwrap();
    assert_eq!(s.score, Some(100.0));

    let quiz = quiz_for_document(&state, &learner(), &doc_id).await.unwrap();
    assert!(quiz.is_completed);
  }

  #[tokio::test]
  async fn learner_documents_include_score_when_available() {
    let state = test_state();
    let (doc_id, quiz_id) = seed_document(&state, one_question()).await;
    assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();

    let before = learner_documents(&state, "e1").await.unwrap();
    assert_eq!(before.len(), 1);
    assert!(before[0].score.is_none());

    submit_quiz(&state, &learner(), &quiz_id, answers(&[("0", "4")])).await.unwrap();

    let after = learner_documents(&state, "e1").await.unwrap();
    assert_eq!(after[0].score, Some(100.0));
    assert_eq!(after[0].document_id, doc_id);
  }

  #[tokio::test]
  async fn stale_assignment_is_skipped_in_progress_view() {
    let state = test_state();
    // Assignment whose document was never persisted.
    state
      .store
      .insert_assignments(vec![Assignment {
        learner_id: "e1".into(),
        document_id: "gone".into(),
        is_read: false,
        read_at: None,
        is_quiz_completed: false,
        quiz_completed_at: None,
        created_at: Utc::now(),
      }])
      .await
      .unwrap();

    assert!(learner_documents(&state, "e1").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn document_status_counts_reads_and_completions() {
    let state = test_state();
    let (doc_id, quiz_id) = seed_document(&state, one_question()).await;
    // e1 is in the identity bank, "ghost" is not and must be skipped.
    assign_document(&state, &doc_id, &["e1".into(), "ghost".into()]).await.unwrap();
    mark_read(&state, &learner(), &doc_id).await.unwrap();
    submit_quiz(&state, &learner(), &quiz_id, answers(&[("0", "4")])).await.unwrap();

    let status = document_status(&state, &doc_id).await.unwrap();
    assert_eq!(status.total_assignments, 1);
    assert_eq!(status.read_count, 1);
    assert_eq!(status.completed_count, 1);
    assert_eq!(status.learners[0].learner_id, "e1");
  }

  #[tokio::test]
  async fn learner_scores_list_completed_only() {
    let state = test_state();
    let (doc_id, quiz_id) = seed_document(&state, one_question()).await;
    assign_document(&state, &doc_id, &["e1".into()]).await.unwrap();

    save_progress(&state, &learner(), &quiz_id, answers(&[("0", "3")])).await.unwrap();
    assert!(learner_scores(&state, "e1").await.unwrap().is_empty());

    submit_quiz(&state, &learner(), &quiz_id, answers(&[("0", "4")])).await.unwrap();
    let scores = learner_scores(&state, "e1").await.unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].score, 100.0);
    assert_eq!(scores[0].total_questions, 1);
    assert_eq!(scores[0].title, "Safety handbook");
  }

  #[tokio::test]
  async fn learner_progress_requires_known_user() {
    let state = test_state();
    assert!(matches!(
      learner_progress(&state, "ghost").await,
      Err(ApiError::NotFound("user"))
    ));
    let view = learner_progress(&state, "e1").await.unwrap();
    assert_eq!(view.user.name, "Eve");
    assert!(view.documents.is_empty());
  }
}
