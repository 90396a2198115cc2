//! Transport contract for the companion service.
//!
//! Route constants and the JSON bodies exchanged with the companion. Keep
//! these free of client/server framework types so both the runtime client
//! and the test stub can share them.

pub mod prompt;

pub use prompt::{PROMPT_PATH, PromptRequestBody, PromptResponseBody, RESPONSE_FIELD};
