//! PortProbe: "is something listening on port P, and does it answer HTTP?"
//!
//! Two layers:
//! - OS socket table inspection (no network traffic), in [`socket_table`]
//! - A best-effort HTTP exchange, in [`health`]
//!
//! Both fail closed: an unreadable socket table reads as "not listening",
//! a transport error reads as "not healthy".

mod ancestry;
mod health;
mod socket_table;

use std::time::Duration;

use async_trait::async_trait;
use flashgen_core::PortInspector;

pub use ancestry::is_descendant_of;
pub use health::is_endpoint_healthy;
pub use socket_table::{is_port_listening, listening_pids};

/// [`PortInspector`] backed by the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortInspector;

impl SystemPortInspector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PortInspector for SystemPortInspector {
    fn is_port_listening(&self, port: u16) -> bool {
        is_port_listening(port)
    }

    fn listening_pids(&self, port: u16) -> Vec<u32> {
        listening_pids(port)
    }

    fn is_owned_by(&self, pid: u32, owner: u32) -> bool {
        is_descendant_of(pid, owner)
    }

    async fn is_endpoint_healthy(&self, url: &str, timeout: Duration) -> bool {
        is_endpoint_healthy(url, timeout).await
    }
}
