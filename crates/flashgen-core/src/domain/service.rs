//! Operational status of the companion process as seen by the supervisor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The supervisor's view of the companion service.
///
/// Transitions:
/// - `NotRunning -> Starting` when the supervisor launches the child
/// - `Starting -> Running` once a liveness probe succeeds
/// - `Starting | Running -> Unresponsive` when probing fails after launch
/// - `Running -> NotRunning` when the supervisor stops it or it exits
///
/// Only the supervisor mutates this value; everyone else reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Nothing is serving the companion endpoint.
    #[default]
    NotRunning,
    /// A child was launched and is being probed.
    Starting,
    /// The endpoint answers HTTP requests.
    Running,
    /// Something is bound to the port (or was launched) but never answered.
    Unresponsive,
}

impl ServiceState {
    /// Whether requests may be sent to the companion in this state.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether a transition from `self` to `next` is one the supervisor may make.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotRunning, Self::Starting)
                | (Self::NotRunning, Self::Running | Self::Unresponsive)
                | (Self::Starting, Self::Running | Self::Unresponsive | Self::NotRunning)
                | (Self::Running, Self::Unresponsive | Self::NotRunning)
                | (Self::Unresponsive, Self::NotRunning | Self::Starting | Self::Running)
        )
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning => write!(f, "not running"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Unresponsive => write!(f, "unresponsive"),
        }
    }
}
