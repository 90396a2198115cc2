//! Bounded in-memory capture of companion output.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use flashgen_core::{CompanionOutputSink, OutputStream};
use serde::{Deserialize, Serialize};

/// Maximum number of lines kept in the ring buffer.
pub const MAX_OUTPUT_LINES: usize = 1000;

/// A single line of companion output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub timestamp: DateTime<Utc>,
    pub stream: OutputStream,
    pub line: String,
}

/// Ring buffer storing recent output lines.
#[derive(Debug)]
pub struct OutputLog {
    lines: Mutex<VecDeque<OutputLine>>,
    capacity: usize,
}

impl OutputLog {
    /// Create a log holding up to [`MAX_OUTPUT_LINES`] lines.
    pub fn new() -> Self {
        Self::with_capacity(MAX_OUTPUT_LINES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Add a line, removing the oldest if at capacity.
    pub fn push(&self, stream: OutputStream, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(OutputLine {
            timestamp: Utc::now(),
            stream,
            line,
        });
    }

    /// The most recent `limit` lines, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<OutputLine> {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = lines.len().saturating_sub(limit);
        lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for OutputLog {
    fn default() -> Self {
        Self::new()
    }
}

impl CompanionOutputSink for OutputLog {
    fn append(&self, stream: OutputStream, line: String) {
        self.push(stream, line);
    }
}
