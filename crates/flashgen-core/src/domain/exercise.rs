//! Cloze exercises generated from a flashcard.

use serde::{Deserialize, Serialize};

use super::PromptRequest;

/// Placeholder the companion uses in place of the practised word.
const BLANK: char = '_';

/// Outcome of checking a learner's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerVerdict {
    Correct,
    Incorrect,
}

/// A generated sentence paired with the flashcard it was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub front_text: String,
    pub back_text: String,
    /// Sentence with the front-side word replaced by `_`.
    pub sentence: String,
}

impl Exercise {
    pub fn new(request: PromptRequest, sentence: impl Into<String>) -> Self {
        Self {
            front_text: request.front_text,
            back_text: request.back_text,
            sentence: sentence.into(),
        }
    }

    /// Whether the generated sentence actually contains a blank.
    #[must_use]
    pub fn has_blank(&self) -> bool {
        self.sentence.contains(BLANK)
    }

    /// Check an answer against the front side.
    ///
    /// Whitespace around the answer is ignored and the comparison is
    /// case-insensitive. The front side is compared as stored.
    #[must_use]
    pub fn check_answer(&self, answer: &str) -> AnswerVerdict {
        if answer.trim().to_lowercase() == self.front_text.to_lowercase() {
            AnswerVerdict::Correct
        } else {
            AnswerVerdict::Incorrect
        }
    }
}
