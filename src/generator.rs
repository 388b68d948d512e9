//! Quiz generation: raw document text in, validated questions out.
//!
//! The defining property here is "never fail": every transport error, parse
//! error, or validation wipeout degrades to the stock question list. Callers
//! observe which path ran through `GenOutcome::source`, never through an
//! error value.

use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::config::Prompts;
use crate::domain::{Question, QuizSource};
use crate::llm::ChatModel;
use crate::seeds::stock_questions;
use crate::util::{fill_template, trunc_for_log};

/// Input text is cut to this many characters before prompting, to respect
/// the model's input limits.
const TEXT_CAP: usize = 3000;

/// Questions plus the path that produced them.
#[derive(Clone, Debug)]
pub struct GenOutcome {
  pub questions: Vec<Question>,
  pub source: QuizSource,
}

impl GenOutcome {
  fn stock(count: usize) -> Self {
    let mut questions = stock_questions();
    questions.truncate(count);
    Self { questions, source: QuizSource::Stock }
  }
}

#[derive(Clone)]
pub struct QuizGenerator {
  model: Option<ChatModel>,
  prompts: Prompts,
}

impl QuizGenerator {
  pub fn new(model: Option<ChatModel>, prompts: Prompts) -> Self {
    Self { model, prompts }
  }

  /// Generate up to `count` questions from `text`. Never empty, never an
  /// error; the worst case is stock content.
  #[instrument(level = "info", skip(self, text), fields(text_len = text.len(), count))]
  pub async fn generate(&self, text: &str, count: usize) -> GenOutcome {
    let count = count.max(1);

    let Some(model) = &self.model else {
      info!(target: "quiz", count, "LLM disabled (no LLM_API_KEY); serving stock questions");
      return GenOutcome::stock(count);
    };

    let prefix: String = text.chars().take(TEXT_CAP).collect();
    let user = fill_template(
      &self.prompts.quiz_user_template,
      &[("count", &count.to_string()), ("text", &prefix)],
    );

    let raw = match model.chat_plain(&self.prompts.quiz_system, &user, 0.5).await {
      Ok(r) => r,
      Err(e) => {
        error!(target: "quiz", error = %e, "model call failed; serving stock questions");
        return GenOutcome::stock(count);
      }
    };

    match parse_questions(&raw) {
      Some(mut questions) if !questions.is_empty() => {
        questions.truncate(count);
        info!(target: "quiz", produced = questions.len(), "generated quiz accepted");
        GenOutcome { questions, source: QuizSource::Generated }
      }
      _ => {
        warn!(target: "quiz", preview = %trunc_for_log(&raw, 160), "model output unusable; serving stock questions");
        GenOutcome::stock(count)
      }
    }
  }
}

/// Wire shape of one generated item, before validation.
#[derive(Deserialize)]
struct RawQuestion {
  question: String,
  options: Vec<String>,
  answer: String,
}

/// Slice the JSON array out of a possibly prose-wrapped response and keep
/// only well-formed items, in their original order. None means the response
/// held no parseable array at all.
fn parse_questions(raw: &str) -> Option<Vec<Question>> {
  let slice = match (raw.find('['), raw.rfind(']')) {
    (Some(start), Some(end)) if start < end => &raw[start..=end],
    _ => raw,
  };

  let items: Vec<serde_json::Value> = serde_json::from_str(slice)
    .or_else(|_| serde_json::from_str(raw))
    .ok()?;

  Some(
    items
      .into_iter()
      .filter_map(|v| serde_json::from_value::<RawQuestion>(v).ok())
      .filter_map(validate)
      .collect(),
  )
}

/// A usable item has a non-empty prompt, exactly 4 distinct options, and an
/// answer equal to one of them.
fn validate(raw: RawQuestion) -> Option<Question> {
  if raw.question.trim().is_empty() {
    return None;
  }
  if raw.options.len() != 4 {
    return None;
  }
  for i in 0..raw.options.len() {
    for j in (i + 1)..raw.options.len() {
      if raw.options[i] == raw.options[j] {
        return None;
      }
    }
  }
  if !raw.options.iter().any(|o| *o == raw.answer) {
    return None;
  }
  Some(Question { question: raw.question, options: raw.options, answer: raw.answer })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gen_without_model() -> QuizGenerator {
    QuizGenerator::new(None, Prompts::default())
  }

  const GOOD: &str = r#"[
    {"question": "What color is the sky?", "options": ["Blue", "Green", "Red", "Black"], "answer": "Blue"},
    {"question": "2+2?", "options": ["3", "4", "5", "6"], "answer": "4"}
  ]"#;

  #[test]
  fn well_formed_array_passes_through_in_order() {
    let qs = parse_questions(GOOD).expect("parse");
    assert_eq!(qs.len(), 2);
    assert_eq!(qs[0].question, "What color is the sky?");
    assert_eq!(qs[1].answer, "4");
  }

  #[test]
  fn array_wrapped_in_prose_is_sliced_out() {
    let wrapped = format!("Here are your questions:\n{}\nHope that helps!", GOOD);
    let qs = parse_questions(&wrapped).expect("parse");
    assert_eq!(qs.len(), 2);
  }

  #[test]
  fn non_json_response_yields_none() {
    assert!(parse_questions("Sorry, I cannot help with that.").is_none());
    assert!(parse_questions("").is_none());
  }

  #[test]
  fn malformed_items_are_dropped_not_fatal() {
    let mixed = r#"[
      {"question": "Valid?", "options": ["A", "B", "C", "D"], "answer": "A"},
      {"question": "Only three options", "options": ["A", "B", "C"], "answer": "A"},
      {"question": "Answer not an option", "options": ["A", "B", "C", "D"], "answer": "E"},
      {"question": "Duplicate options", "options": ["A", "A", "C", "D"], "answer": "A"},
      {"options": ["A", "B", "C", "D"], "answer": "A"},
      {"question": "", "options": ["A", "B", "C", "D"], "answer": "A"}
    ]"#;
    let qs = parse_questions(mixed).expect("parse");
    assert_eq!(qs.len(), 1);
    assert_eq!(qs[0].question, "Valid?");
  }

  #[test]
  fn non_string_option_drops_the_item() {
    let qs = parse_questions(
      r#"[{"question": "Q?", "options": ["A", "B", "C", 4], "answer": "A"}]"#,
    )
    .expect("parse");
    assert!(qs.is_empty());
  }

  #[tokio::test]
  async fn no_model_serves_stock_deterministically() {
    let g = gen_without_model();
    let first = g.generate("any text", 5).await;
    let second = g.generate("any text", 5).await;
    assert_eq!(first.source, QuizSource::Stock);
    assert_eq!(first.questions, second.questions);
    assert_eq!(first.questions.len(), 5);
  }

  #[tokio::test]
  async fn stock_is_sliced_to_requested_count() {
    let g = gen_without_model();
    let out = g.generate("text", 2).await;
    assert_eq!(out.questions.len(), 2);
    assert_eq!(out.questions, stock_questions()[..2].to_vec());
  }

  #[tokio::test]
  async fn stock_is_clamped_to_list_length() {
    let g = gen_without_model();
    let out = g.generate("text", 50).await;
    assert_eq!(out.questions.len(), stock_questions().len());
  }

  #[tokio::test]
  async fn zero_count_is_bumped_to_one() {
    let g = gen_without_model();
    let out = g.generate("text", 0).await;
    assert_eq!(out.questions.len(), 1);
  }

  #[test]
  fn stock_list_is_well_formed() {
    for q in stock_questions() {
      assert!(validate(RawQuestion {
        question: q.question.clone(),
        options: q.options.clone(),
        answer: q.answer.clone(),
      })
      .is_some(), "stock question failed validation: {}", q.question);
    }
  }
}
