//! ProcessSupervisor: launches, watches, and tears down the companion.
//!
//! # Structure
//!
//! - `CompanionSupervisor` - ServiceState machine over one owned child
//! - `ManagedProcess` - handle to a child the supervisor spawned itself
//! - `OutputLog` - bounded ring buffer of recent child output
//! - `capture_output` - non-blocking stdout/stderr forwarding
//! - `shutdown` - PID signaling used at stop time

mod logs;
mod shutdown;
mod stream;
mod supervisor;
mod types;

pub use logs::{MAX_OUTPUT_LINES, OutputLine, OutputLog};
pub use shutdown::{is_process_alive, kill_pid};
pub use stream::capture_output;
pub use supervisor::CompanionSupervisor;
pub use types::{ManagedProcess, PortStatus, StopOutcome, StopPolicy};
