//! SyncBridge: blocking-style access to the async prompt exchange.
//!
//! Blocking callers never drive an event loop themselves. The request runs
//! as a task on a runtime driven by its own worker threads, and the caller
//! parks on a `oneshot` receiver until that task reports. The deadline is
//! applied inside the task, so the receiver always gets an answer.
//!
//! ```text
//! caller thread                  worker runtime
//! ─────────────                  ──────────────
//! request_exercise_blocking ──►  spawn(submit + deadline)
//!   blocking_recv() ◄─────────── tx.send(PromptResult)
//! ```

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use flashgen_core::{PromptError, PromptRequest, PromptResult, ServiceState};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::InferenceClient;

/// Bridges [`InferenceClient`] to callers written in blocking style.
pub struct SyncBridge {
    client: InferenceClient,
    handle: Handle,
    timeout: Duration,
    service_state: Option<watch::Receiver<ServiceState>>,
    cancel_token: Mutex<CancellationToken>,
}

impl SyncBridge {
    /// Create a bridge running requests on `handle`.
    ///
    /// Blocking requests need `handle` to belong to a multi-thread runtime.
    /// A current-thread runtime is only driven while someone blocks on it,
    /// so [`Self::request_exercise_blocking`] refuses one with
    /// [`PromptError::CurrentThreadRuntime`].
    pub fn new(client: InferenceClient, handle: Handle, timeout: Duration) -> Self {
        Self {
            client,
            handle,
            timeout,
            service_state: None,
            cancel_token: Mutex::new(CancellationToken::new()),
        }
    }

    /// Refuse requests unless the supervisor reports `Running`.
    #[must_use]
    pub fn with_service_state(mut self, state: watch::Receiver<ServiceState>) -> Self {
        self.service_state = Some(state);
        self
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request an exercise, parking the current thread until it resolves.
    ///
    /// Returns within roughly `timeout` in every case. Called from inside a
    /// tokio runtime, it returns [`PromptError::BlockingInAsyncContext`]
    /// instead of stalling that runtime's worker.
    pub fn request_exercise_blocking(
        &self,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> PromptResult {
        if Handle::try_current().is_ok() {
            warn!("Blocking exercise request issued from an async context, use request_exercise");
            return Err(PromptError::BlockingInAsyncContext);
        }
        if self.handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
            warn!("Blocking exercise request on a current-thread runtime would never complete");
            return Err(PromptError::CurrentThreadRuntime);
        }
        self.check_service()?;

        let request = PromptRequest::new(front, back);
        let client = self.client.clone();
        let timeout = self.timeout;
        let cancel = self.current_token();
        let (tx, rx) = oneshot::channel();

        self.handle.spawn(async move {
            let result = submit_with_deadline(&client, request, timeout, &cancel).await;
            if tx.send(result).is_err() {
                debug!("Exercise caller went away before the result arrived");
            }
        });

        // A dropped sender means the runtime shut down under the task
        rx.blocking_recv().unwrap_or(Err(PromptError::Cancelled))
    }

    /// Async form of [`Self::request_exercise_blocking`].
    pub async fn request_exercise(
        &self,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> PromptResult {
        self.check_service()?;
        let request = PromptRequest::new(front, back);
        let cancel = self.current_token();
        submit_with_deadline(&self.client, request, self.timeout, &cancel).await
    }

    /// Fail every in-flight request with `Cancelled`.
    ///
    /// Requests issued afterwards are unaffected.
    pub fn cancel_pending(&self) {
        let mut token = self
            .cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
        info!("Pending exercise requests cancelled");
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_service(&self) -> Result<(), PromptError> {
        if let Some(state) = &self.service_state {
            let state = *state.borrow();
            if !state.is_available() {
                debug!(%state, "Companion unavailable, not sending request");
                return Err(PromptError::ServiceUnavailable(state));
            }
        }
        Ok(())
    }
}

async fn submit_with_deadline(
    client: &InferenceClient,
    request: PromptRequest,
    timeout: Duration,
    cancel: &CancellationToken,
) -> PromptResult {
    if let Ok(result) =
        tokio::time::timeout(timeout, client.submit_cancellable(request, cancel)).await
    {
        result
    } else {
        warn!(?timeout, "Exercise request exceeded its deadline");
        Err(PromptError::Timeout(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashgen_core::CompanionConfig;
    use std::net::TcpListener;
    use tokio::runtime::{Builder, Runtime};

    fn worker_runtime() -> Runtime {
        Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn client_for(port: u16) -> InferenceClient {
        InferenceClient::new(&CompanionConfig::default().with_port(port)).unwrap()
    }

    #[tokio::test]
    async fn blocking_call_inside_runtime_is_refused() {
        let bridge = SyncBridge::new(client_for(9), Handle::current(), Duration::from_secs(1));
        assert_eq!(
            bridge.request_exercise_blocking("run", "to run"),
            Err(PromptError::BlockingInAsyncContext)
        );
    }

    #[test]
    fn current_thread_handle_is_refused_instead_of_hanging() {
        let runtime = Builder::new_current_thread().enable_all().build().unwrap();
        let bridge = SyncBridge::new(
            client_for(9),
            runtime.handle().clone(),
            Duration::from_millis(200),
        );

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(bridge.request_exercise_blocking("run", "to run"));
        });

        let result = rx
            .recv_timeout(Duration::from_secs(3))
            .expect("bridge should return without a driven runtime");
        assert_eq!(result, Err(PromptError::CurrentThreadRuntime));
    }

    #[test]
    fn gated_bridge_refuses_when_not_running() {
        let runtime = worker_runtime();
        let (state_tx, state_rx) = watch::channel(ServiceState::Unresponsive);
        let bridge = SyncBridge::new(client_for(9), runtime.handle().clone(), Duration::from_secs(1))
            .with_service_state(state_rx);

        assert_eq!(
            bridge.request_exercise_blocking("run", "to run"),
            Err(PromptError::ServiceUnavailable(ServiceState::Unresponsive))
        );

        state_tx.send_replace(ServiceState::NotRunning);
        assert_eq!(
            bridge.request_exercise_blocking("run", "to run"),
            Err(PromptError::ServiceUnavailable(ServiceState::NotRunning))
        );
    }

    #[test]
    fn silent_server_yields_timeout_not_a_hang() {
        let runtime = worker_runtime();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let bridge = SyncBridge::new(
            client_for(port),
            runtime.handle().clone(),
            Duration::from_millis(300),
        );

        assert_eq!(
            bridge.request_exercise_blocking("run", "to run"),
            Err(PromptError::Timeout(Duration::from_millis(300)))
        );
    }

    #[tokio::test]
    async fn cancel_pending_fails_in_flight_request() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let bridge = SyncBridge::new(client_for(port), Handle::current(), Duration::from_secs(30));

        let (result, ()) = tokio::join!(bridge.request_exercise("run", "to run"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            bridge.cancel_pending();
        });
        assert_eq!(result, Err(PromptError::Cancelled));

        // A fresh token is in place for the next request
        assert!(!bridge.current_token().is_cancelled());
    }
}
