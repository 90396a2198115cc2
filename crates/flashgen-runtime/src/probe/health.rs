//! HTTP liveness probe.
//!
//! This module is intentionally minimal and has no supervisor logic.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

/// Check whether `url` answers an HTTP `GET` within `timeout`.
///
/// Any completed exchange counts, including 4xx/5xx: the companion has no
/// health route, so a 405 from the prompt route is proof of life. Only
/// transport failures (refused, reset, timeout) report `false`.
pub async fn is_endpoint_healthy(url: &str, timeout: Duration) -> bool {
    let client = match Client::builder().timeout(timeout).no_proxy().build() {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "Failed to build health probe client");
            return false;
        }
    };

    match client.get(url).send().await {
        Ok(response) => {
            debug!(%url, status = %response.status(), "Health probe answered");
            true
        }
        Err(e) => {
            debug!(%url, error = %e, "Health probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[tokio::test]
    async fn unbound_port_is_unhealthy() {
        // Grab a free port, then release it so nothing is listening there
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{port}/prompt/");
        assert!(!is_endpoint_healthy(&url, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn silent_listener_times_out_as_unhealthy() {
        // Accepts the connection (kernel backlog) but never writes a response
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/");
        assert!(!is_endpoint_healthy(&url, Duration::from_millis(300)).await);
        drop(listener);
    }
}
