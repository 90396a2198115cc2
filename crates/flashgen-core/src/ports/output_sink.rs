//! Output sink port for the companion's standard streams.
//!
//! This port abstracts where child stdout/stderr lines go, so the
//! supervisor can forward them to tracing, a ring buffer, or nowhere.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which standard stream a line was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Port for appending companion output lines to a sink.
///
/// Called from reader tasks; implementations must not block.
pub trait CompanionOutputSink: Send + Sync {
    /// Append a line (without trailing newline).
    fn append(&self, stream: OutputStream, line: String);
}
