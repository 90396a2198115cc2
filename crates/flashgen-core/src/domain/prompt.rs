//! Prompt request value passed to the companion service.

use serde::{Deserialize, Serialize};

/// A request for a custom exercise built from one flashcard.
///
/// Immutable value; constructed per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// Front side of the flashcard (the word being practised).
    pub front_text: String,
    /// Back side of the flashcard (its translation or definition).
    pub back_text: String,
}

impl PromptRequest {
    /// Create a new prompt request.
    pub fn new(front_text: impl Into<String>, back_text: impl Into<String>) -> Self {
        Self {
            front_text: front_text.into(),
            back_text: back_text.into(),
        }
    }
}
