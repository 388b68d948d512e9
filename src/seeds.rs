//! Stock quiz content: the deterministic fallback used when generation is
//! unavailable or returns nothing usable.

use crate::domain::Question;

/// Fixed list of well-formed questions. Slicing to a requested count happens
/// in the generator; the list is never padded beyond what exists here.
pub fn stock_questions() -> Vec<Question> {
  let q = |question: &str, options: [&str; 4], answer: &str| Question {
    question: question.into(),
    options: options.iter().map(|s| s.to_string()).collect(),
    answer: answer.into(),
  };

  vec![
    q(
      "What is the main purpose of this document?",
      ["To inform", "To entertain", "To persuade", "To confuse"],
      "To inform",
    ),
    q(
      "Which of the following is NOT mentioned in the document?",
      ["Key concepts", "Important dates", "Contact information", "Fictional characters"],
      "Fictional characters",
    ),
    q(
      "What should readers do after reading this document?",
      ["Forget about it", "Take action", "Share with friends", "Ignore completely"],
      "Take action",
    ),
    q(
      "How many main sections does this document have?",
      ["One", "Two", "Three", "Four"],
      "Three",
    ),
    q(
      "What is the recommended approach mentioned in the document?",
      ["Quick reading", "Thorough analysis", "Skimming", "Ignoring"],
      "Thorough analysis",
    ),
  ]
}
