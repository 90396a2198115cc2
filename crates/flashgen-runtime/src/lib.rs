//! Runtime adapters for the flashgen companion service.
//!
//! - [`probe`]: socket-table and HTTP liveness checks
//! - [`process`]: the companion supervisor and its output capture
//! - [`client`]: the async prompt exchange
//! - [`bridge`]: blocking access to that exchange
//! - [`CompanionService`]: all of the above behind a blocking API

pub mod bridge;
pub mod client;
mod companion;
pub mod probe;
pub mod process;

pub use bridge::SyncBridge;
pub use client::InferenceClient;
pub use companion::{CompanionService, CompanionServiceError};
pub use probe::{
    SystemPortInspector, is_descendant_of, is_endpoint_healthy, is_port_listening, listening_pids,
};
pub use process::{
    CompanionSupervisor, ManagedProcess, OutputLine, OutputLog, PortStatus, StopOutcome,
    StopPolicy, capture_output, is_process_alive, kill_pid,
};
