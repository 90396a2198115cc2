//! Companion supervisor: ServiceState machine over one owned child.
//!
//! The supervisor owns the process handle and the state internally, using
//! `tokio::sync::Mutex` for async-safe access. Callers only see
//! [`ServiceState`] values and [`StopOutcome`]s; failures never cross the
//! API as errors.
//!
//! Key design decisions:
//! - **Ownership is earned by spawning**: a listener found on the port is
//!   probed and adopted as Running/Unresponsive, but never recorded as owned
//! - **Re-probe at stop time**: `stop` resolves PIDs from the socket table
//!   when called and signals only those matching the owned PID (or its
//!   descendants)
//! - **Cancellable polling**: the post-launch health loop honors the
//!   supervisor's cancellation token

use std::process::Stdio;
use std::sync::Arc;

use flashgen_core::{
    CompanionConfig, CompanionOutputSink, PortInspector, ServiceState, SupervisorError,
};
use tokio::process::Command;
use tokio::sync::{Mutex, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::logs::{OutputLine, OutputLog};
use super::shutdown::kill_pid;
use super::stream::capture_output;
use super::types::{ManagedProcess, PortStatus, StopOutcome, StopPolicy};
use crate::probe::SystemPortInspector;

/// State guarded by the supervisor mutex.
#[derive(Debug, Default)]
struct Inner {
    /// Child we spawned, if any. At most one at a time.
    owned: Option<ManagedProcess>,
    /// Why the last launch or probe did not reach `Running`.
    last_error: Option<SupervisorError>,
}

/// Supervisor for the companion inference service.
///
/// # Example
///
/// ```ignore
/// let supervisor = CompanionSupervisor::system(config);
/// match supervisor.ensure_running().await {
///     ServiceState::Running => { /* send requests */ }
///     other => eprintln!("companion is {other}"),
/// }
/// supervisor.stop().await;
/// ```
pub struct CompanionSupervisor {
    config: CompanionConfig,
    inspector: Arc<dyn PortInspector>,
    sinks: Vec<Arc<dyn CompanionOutputSink>>,
    output: Arc<OutputLog>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ServiceState>,
    cancel_token: CancellationToken,
}

impl CompanionSupervisor {
    /// Create a supervisor probing through `inspector`.
    pub fn new(config: CompanionConfig, inspector: Arc<dyn PortInspector>) -> Self {
        let output = Arc::new(OutputLog::new());
        let log_sink: Arc<dyn CompanionOutputSink> = output.clone();
        let (state_tx, _) = watch::channel(ServiceState::NotRunning);
        Self {
            config,
            inspector,
            sinks: vec![log_sink],
            output,
            inner: Mutex::new(Inner::default()),
            state_tx,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Create a supervisor backed by the host OS.
    pub fn system(config: CompanionConfig) -> Self {
        Self::new(config, Arc::new(SystemPortInspector::new()))
    }

    /// Forward child output to an additional sink.
    #[must_use]
    pub fn with_output_sink(mut self, sink: Arc<dyn CompanionOutputSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub const fn config(&self) -> &CompanionConfig {
        &self.config
    }

    /// Receiver that always holds the latest state, readable without `.await`.
    pub fn watch_state(&self) -> watch::Receiver<ServiceState> {
        self.state_tx.subscribe()
    }

    /// Last published state, without refreshing.
    pub fn current_state(&self) -> ServiceState {
        *self.state_tx.borrow()
    }

    /// Current state, refreshed from the owned child's exit status.
    pub async fn state(&self) -> ServiceState {
        let mut inner = self.inner.lock().await;
        self.reap_exited(&mut inner);
        self.current_state()
    }

    /// PID of the child we spawned, if we still own one.
    pub async fn owned_pid(&self) -> Option<u32> {
        self.inner
            .lock()
            .await
            .owned
            .as_ref()
            .and_then(ManagedProcess::pid)
    }

    /// Why the last transition failed to reach `Running`.
    pub async fn last_error(&self) -> Option<SupervisorError> {
        self.inner.lock().await.last_error.clone()
    }

    /// The most recent `limit` output lines of spawned children.
    pub fn recent_output(&self, limit: usize) -> Vec<OutputLine> {
        self.output.recent(limit)
    }

    /// Probe the port without changing state or ownership.
    pub async fn port_status(&self) -> PortStatus {
        let port = self.config.port;
        let listening = self.inspector.is_port_listening(port);
        let healthy = self
            .inspector
            .is_endpoint_healthy(&self.config.health_url(), self.config.probe_timeout())
            .await;
        PortStatus {
            port,
            listening,
            healthy,
            pids: self.inspector.listening_pids(port),
        }
    }

    /// Abort any health polling in progress and refuse further launches.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Make sure the companion is serving, launching it if nothing listens.
    ///
    /// - Something already listening: probe it once and adopt the result
    ///   without taking ownership.
    /// - Nothing listening: spawn the configured interpreter + script, then
    ///   poll health up to the attempt budget.
    pub async fn ensure_running(&self) -> ServiceState {
        let mut inner = self.inner.lock().await;
        self.reap_exited(&mut inner);
        let port = self.config.port;

        if self.inspector.is_port_listening(port) {
            let state = self.probe_existing(&mut inner).await;
            self.set_state(state);
            return state;
        }

        if let Some(stale) = inner.owned.take() {
            warn!(pid = ?stale.pid(), port, "Owned companion is not listening, replacing it");
            if let Err(e) = stale.terminate().await {
                warn!(port, error = %e, "Failed to terminate stale companion");
            }
        }

        if self.cancel_token.is_cancelled() {
            debug!(port, "Supervisor cancelled, not launching companion");
            self.set_state(ServiceState::NotRunning);
            return ServiceState::NotRunning;
        }

        let managed = match self.launch() {
            Ok(managed) => managed,
            Err(e) => {
                warn!(port, error = %e, "Failed to launch companion");
                inner.last_error = Some(e);
                self.set_state(ServiceState::NotRunning);
                return ServiceState::NotRunning;
            }
        };

        info!(pid = ?managed.pid(), port, "Companion launched");
        inner.owned = Some(managed);
        inner.last_error = None;
        self.set_state(ServiceState::Starting);

        let state = self.await_health(&mut inner).await;
        self.set_state(state);
        state
    }

    /// Stop the companion if we own it. See [`Self::stop_with`].
    pub async fn stop(&self) -> StopOutcome {
        self.stop_with(StopPolicy::OwnedOnly).await
    }

    /// Kill the process(es) listening on the port, subject to `policy`.
    ///
    /// PIDs are resolved from the socket table at call time. Under
    /// [`StopPolicy::OwnedOnly`] a listener is signaled only if it is the
    /// spawned child or descends from it; anything else yields
    /// `NoProcessFound`. An owned child that never bound the port is still
    /// killed and reaped. Calling this repeatedly is harmless.
    pub async fn stop_with(&self, policy: StopPolicy) -> StopOutcome {
        let mut inner = self.inner.lock().await;
        let port = self.config.port;
        let owned = inner.owned.take();
        let owner_pid = owned.as_ref().and_then(ManagedProcess::pid);

        let listeners = self.inspector.listening_pids(port);
        let targets: Vec<u32> = match (policy, owner_pid) {
            (StopPolicy::AnyListener, _) => listeners,
            (StopPolicy::OwnedOnly, Some(owner)) => {
                let (ours, foreign): (Vec<u32>, Vec<u32>) = listeners
                    .into_iter()
                    .partition(|pid| self.inspector.is_owned_by(*pid, owner));
                if !foreign.is_empty() {
                    debug!(port, owner, ?foreign, "Leaving listeners we do not own alone");
                }
                ours
            }
            (StopPolicy::OwnedOnly, None) => {
                if !listeners.is_empty() {
                    debug!(port, ?listeners, "Port held by a process we did not spawn");
                }
                Vec::new()
            }
        };

        // The owned child is reaped through its handle below
        for pid in targets.iter().copied().filter(|pid| Some(*pid) != owner_pid) {
            info!(pid, port, "Killing companion process");
            if let Err(e) = kill_pid(pid).await {
                warn!(pid, port, error = %e, "Failed to kill companion process");
            }
        }

        if let Some(managed) = owned {
            match managed.terminate().await {
                Ok(status) => debug!(pid = ?owner_pid, %status, "Owned companion reaped"),
                Err(e) => warn!(pid = ?owner_pid, error = %e, "Failed to reap owned companion"),
            }
        }

        let next = if self.inspector.is_port_listening(port) {
            self.current_state()
        } else {
            ServiceState::NotRunning
        };
        self.set_state(next);

        if targets.is_empty() {
            info!(port, "No process found on port");
            StopOutcome::NoProcessFound
        } else {
            info!(port, pids = ?targets, "Companion stopped");
            StopOutcome::Stopped { pids: targets }
        }
    }

    fn launch(&self) -> Result<ManagedProcess, SupervisorError> {
        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(&self.config.script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            SupervisorError::LaunchError(format!(
                "{} {}: {e}",
                self.config.interpreter.display(),
                self.config.script.display()
            ))
        })?;

        capture_output(&mut child, self.config.port, &self.sinks);
        Ok(ManagedProcess::new(child))
    }

    /// Probe a listener that was already there when we looked.
    async fn probe_existing(&self, inner: &mut Inner) -> ServiceState {
        let port = self.config.port;
        match inner.owned.as_ref().and_then(ManagedProcess::pid) {
            Some(pid) => debug!(pid, port, "Owned companion is listening"),
            None => info!(port, "Found existing listener, adopting without ownership"),
        }

        let healthy = self
            .inspector
            .is_endpoint_healthy(&self.config.health_url(), self.config.probe_timeout())
            .await;

        if healthy {
            inner.last_error = None;
            ServiceState::Running
        } else {
            warn!(port, "Listener on companion port does not answer HTTP");
            inner.last_error = Some(SupervisorError::HealthCheckTimeout { port, attempts: 1 });
            ServiceState::Unresponsive
        }
    }

    /// Poll health after a launch, up to the configured budget.
    async fn await_health(&self, inner: &mut Inner) -> ServiceState {
        let port = self.config.port;
        let url = self.config.health_url();
        let attempts = self.config.health_attempts;
        info!(%url, attempts, "Waiting for companion to be ready");

        for attempt in 1..=attempts {
            let healthy = tokio::select! {
                () = self.cancel_token.cancelled() => {
                    warn!(port, attempt, "Health polling cancelled");
                    inner.last_error = Some(SupervisorError::HealthCheckTimeout {
                        port,
                        attempts: attempt - 1,
                    });
                    return ServiceState::Unresponsive;
                }
                healthy = async {
                    sleep(self.config.health_backoff()).await;
                    self.inspector
                        .is_endpoint_healthy(&url, self.config.probe_timeout())
                        .await
                } => healthy,
            };

            if healthy {
                info!(port, attempt, "Companion is ready");
                return ServiceState::Running;
            }

            if let Some(status) = inner.owned.as_mut().and_then(ManagedProcess::exit_status) {
                warn!(port, %status, "Companion exited before becoming ready");
                inner.owned = None;
                inner.last_error = Some(SupervisorError::LaunchError(format!(
                    "exited during startup with {status}"
                )));
                return ServiceState::NotRunning;
            }

            debug!(port, attempt, attempts, "Companion not ready yet, retrying");
        }

        warn!(port, attempts, "Companion never answered health probes");
        inner.last_error = Some(SupervisorError::HealthCheckTimeout { port, attempts });
        ServiceState::Unresponsive
    }

    /// Drop the owned child if it has exited on its own.
    fn reap_exited(&self, inner: &mut Inner) {
        if let Some(status) = inner.owned.as_mut().and_then(ManagedProcess::exit_status) {
            warn!(port = self.config.port, %status, "Companion exited unexpectedly");
            inner.owned = None;
            self.set_state(ServiceState::NotRunning);
        }
    }

    fn set_state(&self, next: ServiceState) {
        let previous = self.state_tx.send_replace(next);
        if previous != next {
            if !previous.can_transition_to(next) {
                debug!(from = %previous, to = %next, "Unusual state transition");
            }
            info!(port = self.config.port, from = %previous, to = %next, "Companion state changed");
        }
    }
}
