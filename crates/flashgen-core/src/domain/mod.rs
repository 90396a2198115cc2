//! Domain types for the companion inference service.

mod exercise;
mod prompt;
mod service;

pub use exercise::{AnswerVerdict, Exercise};
pub use prompt::PromptRequest;
pub use service::ServiceState;
