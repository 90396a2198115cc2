//! CLI-specific error types and exit codes.

use flashgen_core::{ConfigError, PromptError, ServiceState};
use flashgen_runtime::CompanionServiceError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be built or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The companion never reached a usable state.
    #[error("Companion is {state}: {reason}")]
    NotRunning { state: ServiceState, reason: String },

    /// The exercise request failed.
    #[error("{}: {0}", .0.user_message())]
    Unavailable(PromptError),

    /// IO error (terminal, signal handler).
    #[error("IO error: {0}")]
    Io(String),
}

impl CliError {
    /// Map error to an exit code (see sysexits.h).
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 78, // EX_CONFIG
            Self::NotRunning { .. } | Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74, // EX_IOERR
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<CompanionServiceError> for CliError {
    fn from(err: CompanionServiceError) -> Self {
        match err {
            CompanionServiceError::Config(e) => e.into(),
            CompanionServiceError::Runtime(e) => Self::Io(e.to_string()),
            CompanionServiceError::Client(e) => Self::Unavailable(e),
            CompanionServiceError::Interrupt(e) => Self::Io(e.to_string()),
            CompanionServiceError::BlockingInAsyncContext => {
                Self::Unavailable(PromptError::BlockingInAsyncContext)
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
