//! Shared types for companion process management.

use std::io;
use std::process::ExitStatus;

use serde::Serialize;
use tokio::process::Child;
use tracing::debug;

/// A companion process the supervisor spawned and therefore owns.
///
/// Adopted listeners (already running before the supervisor looked) never
/// get a `ManagedProcess`.
#[derive(Debug)]
pub struct ManagedProcess {
    pid: Option<u32>,
    child: Child,
}

impl ManagedProcess {
    pub(crate) fn new(child: Child) -> Self {
        Self {
            pid: child.id(),
            child,
        }
    }

    /// PID recorded at spawn time.
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit status if the process has already exited (reaps it).
    pub(crate) fn exit_status(&mut self) -> Option<ExitStatus> {
        match self.child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                debug!(pid = ?self.pid, error = %e, "Failed to poll companion exit status");
                None
            }
        }
    }

    /// Force-kill (SIGKILL on Unix) and reap the process.
    pub(crate) async fn terminate(mut self) -> io::Result<ExitStatus> {
        if let Some(status) = self.exit_status() {
            return Ok(status);
        }
        self.child.start_kill()?;
        self.child.wait().await
    }
}

/// Which listeners `stop` may signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopPolicy {
    /// Only the spawned child or its descendants.
    #[default]
    OwnedOnly,
    /// Whatever is listening on the port, owned or not.
    AnyListener,
}

/// Result of a stop request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// These PIDs were bound to the port and have been signaled.
    Stopped { pids: Vec<u32> },
    /// Nothing eligible was bound to the port. Informational, not an error.
    NoProcessFound,
}

impl StopOutcome {
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}

/// Point-in-time view of the companion port, as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortStatus {
    pub port: u16,
    /// Something holds a listening socket on the port.
    pub listening: bool,
    /// The health route answered HTTP.
    pub healthy: bool,
    /// PIDs holding the listening socket (may be empty when not permitted to see them).
    pub pids: Vec<u32>,
}
