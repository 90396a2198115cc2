//! Port inspection trait.
//!
//! Answers "is something listening on port P, who is it, and does it
//! answer HTTP?". The supervisor depends only on this trait so its state
//! machine can be exercised without real sockets.

use std::time::Duration;

use async_trait::async_trait;

/// OS-level and HTTP-level liveness queries for a TCP port.
///
/// # Failure semantics
///
/// Implementations fail closed: if the socket table cannot be read, the
/// port is reported as not listening and no PIDs are returned.
#[async_trait]
pub trait PortInspector: Send + Sync {
    /// Whether any process holds a listening socket on `port`.
    fn is_port_listening(&self, port: u16) -> bool;

    /// PIDs of processes holding a listening socket on `port`.
    fn listening_pids(&self, port: u16) -> Vec<u32>;

    /// Whether `pid` is `owner` itself or one of its descendants.
    fn is_owned_by(&self, pid: u32, owner: u32) -> bool;

    /// Whether an HTTP exchange with `url` completes within `timeout`.
    ///
    /// Any HTTP status counts as alive; only transport failures do not.
    async fn is_endpoint_healthy(&self, url: &str, timeout: Duration) -> bool;
}
