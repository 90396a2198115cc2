//! Core domain types and port definitions for flashgen.
//!
//! This crate holds everything the companion-service subsystem shares
//! between adapters: the service state machine vocabulary, the prompt
//! request/response contract, the error taxonomy, configuration, and the
//! port traits that the runtime crate implements. It has no process or
//! network code of its own.

pub mod config;
pub mod contracts;
pub mod domain;
pub mod paths;
pub mod ports;

// Re-export commonly used types for convenience
pub use config::{
    CompanionConfig, ConfigError, DEFAULT_COMPANION_HOST, DEFAULT_COMPANION_PORT,
    DEFAULT_INTERPRETER, DEFAULT_PROMPT_PATH,
};
pub use domain::{AnswerVerdict, Exercise, PromptRequest, ServiceState};
pub use paths::{PathError, default_script_path};
pub use ports::{
    CompanionOutputSink, ErrorKind, OutputStream, PortInspector, PromptError, PromptResult,
    SupervisorError,
};
