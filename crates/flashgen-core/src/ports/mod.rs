//! Port definitions (trait abstractions) and the error taxonomy.
//!
//! Ports define the interfaces that the supervisor expects from the
//! operating system and from the log destination. They contain no
//! implementation details.
//!
//! # Error propagation
//!
//! - Probe and supervisor failures surface as [`ServiceState`] values;
//!   [`SupervisorError`] only describes *why* the last transition failed.
//! - Client and bridge failures surface as the `Err` side of
//!   [`PromptResult`], which callers must branch on before using any text.

pub mod output_sink;
pub mod port_inspector;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ServiceState;

pub use output_sink::{CompanionOutputSink, OutputStream};
pub use port_inspector::PortInspector;

/// Message shown to the user when an exercise cannot be produced.
pub const UNAVAILABLE_MESSAGE: &str = "exercise generation unavailable";

/// Outcome of one exercise request: `Ok` carries the generated sentence.
pub type PromptResult = Result<String, PromptError>;

/// Why a supervisor operation did not reach `Running`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SupervisorError {
    /// The child process could not be started.
    #[error("Failed to launch companion: {0}")]
    LaunchError(String),

    /// The process started but never answered within the attempt budget.
    #[error("Companion did not answer health probes after {attempts} attempts on port {port}")]
    HealthCheckTimeout {
        /// Port that was probed.
        port: u16,
        /// Number of probes made.
        attempts: u32,
    },
}

/// Failure of one prompt exchange.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    /// Transport-level failure, error status, or an unparseable body.
    #[error("Network error: {0}")]
    Network(String),

    /// The body parsed but did not carry the expected field.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No answer within the deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The request was abandoned before completing.
    #[error("Request cancelled")]
    Cancelled,

    /// The supervisor does not consider the companion usable.
    #[error("Companion service is {0}")]
    ServiceUnavailable(ServiceState),

    /// A blocking wait was requested from inside an async runtime.
    #[error("Blocking exercise request issued from inside an async runtime")]
    BlockingInAsyncContext,

    /// The bridge was handed a current-thread runtime, which nothing drives
    /// while the caller waits.
    #[error("Blocking exercise requests need a multi-thread runtime")]
    CurrentThreadRuntime,
}

/// Flat category of a [`PromptError`], for callers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkError,
    ProtocolError,
    Timeout,
    Cancelled,
    ServiceUnavailable,
    BlockingInAsyncContext,
    CurrentThreadRuntime,
}

impl PromptError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::NetworkError,
            Self::Protocol(_) => ErrorKind::ProtocolError,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            Self::BlockingInAsyncContext => ErrorKind::BlockingInAsyncContext,
            Self::CurrentThreadRuntime => ErrorKind::CurrentThreadRuntime,
        }
    }

    /// Text to show in place of an exercise.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        UNAVAILABLE_MESSAGE
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NetworkError => "NetworkError",
            Self::ProtocolError => "ProtocolError",
            Self::Timeout => "Timeout",
            Self::Cancelled => "Cancelled",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::BlockingInAsyncContext => "BlockingInAsyncContext",
            Self::CurrentThreadRuntime => "CurrentThreadRuntime",
        };
        f.write_str(name)
    }
}
