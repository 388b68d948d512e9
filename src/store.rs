//! Persistence seam: four logical collections (documents, quizzes,
//! assignments, submissions) behind a trait, with an in-memory reference
//! implementation.
//!
//! Guarantees callers rely on:
//!   - single-record upserts keyed by the unique pair are atomic
//!     (`MemStore` holds the collection write lock for the whole
//!     find-and-patch)
//!   - no multi-record transaction exists; see `logic::submit_quiz` for the
//!     documented consistency gap that follows

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{AnswerMap, Assignment, Document, Quiz, Submission};
use crate::error::ApiError;

#[async_trait]
pub trait Store: Send + Sync {
  async fn insert_document(&self, doc: Document) -> Result<(), ApiError>;
  async fn find_document(&self, id: &str) -> Result<Option<Document>, ApiError>;

  async fn insert_quiz(&self, quiz: Quiz) -> Result<(), ApiError>;
  async fn find_quiz(&self, id: &str) -> Result<Option<Quiz>, ApiError>;
  async fn find_quiz_by_document(&self, document_id: &str) -> Result<Option<Quiz>, ApiError>;

  async fn insert_assignments(&self, batch: Vec<Assignment>) -> Result<(), ApiError>;
  async fn find_assignment(
    &self,
    learner_id: &str,
    document_id: &str,
  ) -> Result<Option<Assignment>, ApiError>;
  async fn assignments_for_learner(&self, learner_id: &str) -> Result<Vec<Assignment>, ApiError>;
  async fn assignments_for_document(&self, document_id: &str)
    -> Result<Vec<Assignment>, ApiError>;
  /// Set is_read/read_at on the matching pair. Returns false when no
  /// assignment matches.
  async fn mark_assignment_read(
    &self,
    learner_id: &str,
    document_id: &str,
  ) -> Result<bool, ApiError>;
  /// Set is_quiz_completed/quiz_completed_at on the matching pair. Returns
  /// false when no assignment matches.
  async fn mark_assignment_quiz_completed(
    &self,
    learner_id: &str,
    document_id: &str,
  ) -> Result<bool, ApiError>;

  async fn find_submission(
    &self,
    learner_id: &str,
    quiz_id: &str,
  ) -> Result<Option<Submission>, ApiError>;
  async fn submissions_for_learner(&self, learner_id: &str)
    -> Result<Vec<Submission>, ApiError>;
  /// Upsert only the in-progress answers for the pair. Score and final
  /// answers are left untouched.
  async fn upsert_submission_progress(
    &self,
    learner_id: &str,
    quiz_id: &str,
    answers: AnswerMap,
  ) -> Result<(), ApiError>;
  /// Upsert the final answers, score and submitted_at for the pair, clearing
  /// any in-progress answers. Overwrites a prior completed record.
  async fn upsert_submission_final(
    &self,
    learner_id: &str,
    quiz_id: &str,
    answers: AnswerMap,
    score: f32,
  ) -> Result<(), ApiError>;
}

/// In-memory store. Assignments and submissions are keyed by their unique
/// (learner, other-id) pair, which is what makes the upserts "one record per
/// pair, ever".
#[derive(Default)]
pub struct MemStore {
  documents: RwLock<HashMap<String, Document>>,
  quizzes: RwLock<HashMap<String, Quiz>>,
  assignments: RwLock<HashMap<(String, String), Assignment>>,
  submissions: RwLock<HashMap<(String, String), Submission>>,
}

impl MemStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn pair(a: &str, b: &str) -> (String, String) {
  (a.to_string(), b.to_string())
}

#[async_trait]
impl Store for MemStore {
  async fn insert_document(&self, doc: Document) -> Result<(), ApiError> {
    self.documents.write().await.insert(doc.id.clone(), doc);
    Ok(())
  }

  async fn find_document(&self, id: &str) -> Result<Option<Document>, ApiError> {
    Ok(self.documents.read().await.get(id).cloned())
  }

  async fn insert_quiz(&self, quiz: Quiz) -> Result<(), ApiError> {
    self.quizzes.write().await.insert(quiz.id.clone(), quiz);
    Ok(())
  }

  async fn find_quiz(&self, id: &str) -> Result<Option<Quiz>, ApiError> {
    Ok(self.quizzes.read().await.get(id).cloned())
  }

  async fn find_quiz_by_document(&self, document_id: &str) -> Result<Option<Quiz>, ApiError> {
    Ok(
      self
        .quizzes
        .read()
        .await
        .values()
        .find(|q| q.document_id == document_id)
        .cloned(),
    )
  }

  async fn insert_assignments(&self, batch: Vec<Assignment>) -> Result<(), ApiError> {
    let mut assignments = self.assignments.write().await;
    for a in batch {
      assignments.insert(pair(&a.learner_id, &a.document_id), a);
    }
    Ok(())
  }

  async fn find_assignment(
    &self,
    learner_id: &str,
    document_id: &str,
  ) -> Result<Option<Assignment>, ApiError> {
    Ok(self.assignments.read().await.get(&pair(learner_id, document_id)).cloned())
  }

  async fn assignments_for_learner(&self, learner_id: &str) -> Result<Vec<Assignment>, ApiError> {
    let mut out: Vec<Assignment> = self
      .assignments
      .read()
      .await
      .values()
      .filter(|a| a.learner_id == learner_id)
      .cloned()
      .collect();
    out.sort_by_key(|a| a.created_at);
    Ok(out)
  }

  async fn assignments_for_document(
    &self,
    document_id: &str,
  ) -> Result<Vec<Assignment>, ApiError> {
    let mut out: Vec<Assignment> = self
      .assignments
      .read()
      .await
      .values()
      .filter(|a| a.document_id == document_id)
      .cloned()
      .collect();
    out.sort_by_key(|a| a.created_at);
    Ok(out)
  }

  async fn mark_assignment_read(
    &self,
    learner_id: &str,
    document_id: &str,
  ) -> Result<bool, ApiError> {
    let mut assignments = self.assignments.write().await;
    match assignments.get_mut(&pair(learner_id, document_id)) {
      Some(a) => {
        a.is_read = true;
        a.read_at = Some(Utc::now());
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn mark_assignment_quiz_completed(
    &self,
    learner_id: &str,
    document_id: &str,
  ) -> Result<bool, ApiError> {
    let mut assignments = self.assignments.write().await;
    match assignments.get_mut(&pair(learner_id, document_id)) {
      Some(a) => {
        a.is_quiz_completed = true;
        a.quiz_completed_at = Some(Utc::now());
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn find_submission(
    &self,
    learner_id: &str,
    quiz_id: &str,
  ) -> Result<Option<Submission>, ApiError> {
    Ok(self.submissions.read().await.get(&pair(learner_id, quiz_id)).cloned())
  }

  async fn submissions_for_learner(
    &self,
    learner_id: &str,
  ) -> Result<Vec<Submission>, ApiError> {
    Ok(
      self
        .submissions
        .read()
        .await
        .values()
        .filter(|s| s.learner_id == learner_id)
        .cloned()
        .collect(),
    )
  }

  async fn upsert_submission_progress(
    &self,
    learner_id: &str,
    quiz_id: &str,
    answers: AnswerMap,
  ) -> Result<(), ApiError> {
    let mut submissions = self.submissions.write().await;
    let entry = submissions
      .entry(pair(learner_id, quiz_id))
      .or_insert_with(|| Submission {
        learner_id: learner_id.to_string(),
        quiz_id: quiz_id.to_string(),
        ..Submission::default()
      });
    entry.in_progress_answers = Some(answers);
    Ok(())
  }

  async fn upsert_submission_final(
    &self,
    learner_id: &str,
    quiz_id: &str,
    answers: AnswerMap,
    score: f32,
  ) -> Result<(), ApiError> {
    let mut submissions = self.submissions.write().await;
    let entry = submissions
      .entry(pair(learner_id, quiz_id))
      .or_insert_with(|| Submission {
        learner_id: learner_id.to_string(),
        quiz_id: quiz_id.to_string(),
        ..Submission::default()
      });
    entry.final_answers = Some(answers);
    entry.in_progress_answers = None;
    entry.score = Some(score);
    entry.submitted_at = Some(Utc::now());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap as Map;

  fn answers(pairs: &[(&str, &str)]) -> AnswerMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Map<_, _>>()
  }

  #[tokio::test]
  async fn progress_upsert_inserts_then_updates_same_record() {
    let store = MemStore::new();
    store
      .upsert_submission_progress("u1", "q1", answers(&[("0", "A")]))
      .await
      .unwrap();
    store
      .upsert_submission_progress("u1", "q1", answers(&[("0", "B"), ("1", "C")]))
      .await
      .unwrap();

    let s = store.find_submission("u1", "q1").await.unwrap().expect("submission");
    assert_eq!(s.in_progress_answers, Some(answers(&[("0", "B"), ("1", "C")])));
    assert!(s.score.is_none());
    assert_eq!(store.submissions_for_learner("u1").await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn final_upsert_clears_progress_and_sets_score() {
    let store = MemStore::new();
    store
      .upsert_submission_progress("u1", "q1", answers(&[("0", "A")]))
      .await
      .unwrap();
    store
      .upsert_submission_final("u1", "q1", answers(&[("0", "A")]), 100.0)
      .await
      .unwrap();

    let s = store.find_submission("u1", "q1").await.unwrap().expect("submission");
    assert!(s.in_progress_answers.is_none());
    assert_eq!(s.score, Some(100.0));
    assert!(s.submitted_at.is_some());
  }

  #[tokio::test]
  async fn progress_after_final_keeps_the_score() {
    let store = MemStore::new();
    store
      .upsert_submission_final("u1", "q1", answers(&[("0", "A")]), 75.0)
      .await
      .unwrap();
    store
      .upsert_submission_progress("u1", "q1", answers(&[("0", "B")]))
      .await
      .unwrap();

    let s = store.find_submission("u1", "q1").await.unwrap().expect("submission");
    assert_eq!(s.score, Some(75.0));
    assert_eq!(s.in_progress_answers, Some(answers(&[("0", "B")])));
  }

  #[tokio::test]
  async fn mark_read_reports_missing_pair() {
    let store = MemStore::new();
    assert!(!store.mark_assignment_read("u1", "d1").await.unwrap());
  }
}
