//! Blocking facade over supervisor and bridge, for UI-style callers.
//!
//! `CompanionService` owns a small multi-thread runtime. Supervisor calls
//! are driven with `block_on`; exercise requests go through the
//! [`SyncBridge`], gated on the supervisor's published state. Called from
//! inside an async runtime, every blocking method returns
//! [`CompanionServiceError::BlockingInAsyncContext`] instead of panicking.

use std::future::Future;
use std::io;
use std::time::Duration;

use flashgen_core::{
    CompanionConfig, ConfigError, Exercise, PromptError, PromptRequest, ServiceState,
    SupervisorError,
};
use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bridge::SyncBridge;
use crate::client::InferenceClient;
use crate::process::{CompanionSupervisor, OutputLine, PortStatus, StopOutcome, StopPolicy};

const WORKER_THREADS: usize = 2;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Why a [`CompanionService`] could not be built or driven.
#[derive(Debug, Error)]
pub enum CompanionServiceError {
    #[error("Invalid companion configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build worker runtime: {0}")]
    Runtime(#[from] io::Error),

    #[error("Failed to build inference client: {0}")]
    Client(PromptError),

    #[error("Failed to listen for Ctrl-C: {0}")]
    Interrupt(io::Error),

    #[error("Blocking companion call issued from inside an async runtime")]
    BlockingInAsyncContext,
}

/// The caller-facing companion API: ensure running, request, stop.
///
/// Every method blocks the calling thread. Drop the service, or call
/// [`Self::shutdown`], outside async code: the owned runtime cannot be
/// dropped from inside another one.
pub struct CompanionService {
    supervisor: CompanionSupervisor,
    bridge: SyncBridge,
    runtime: Runtime,
}

impl CompanionService {
    /// Build the service without touching the companion process.
    pub fn new(config: CompanionConfig) -> Result<Self, CompanionServiceError> {
        Self::with_supervisor(CompanionSupervisor::system(config))
    }

    /// Build around an existing supervisor (custom inspector or sinks).
    pub fn with_supervisor(supervisor: CompanionSupervisor) -> Result<Self, CompanionServiceError> {
        let config = supervisor.config();
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("flashgen-companion")
            .enable_all()
            .build()?;

        let client = InferenceClient::new(config).map_err(CompanionServiceError::Client)?;
        let bridge = SyncBridge::new(client, runtime.handle().clone(), config.request_timeout())
            .with_service_state(supervisor.watch_state());

        debug!(url = %config.prompt_url(), "Companion service ready");
        Ok(Self {
            supervisor,
            bridge,
            runtime,
        })
    }

    /// Build the service and bring the companion up (application startup).
    ///
    /// The returned service is usable whatever state was reached; check
    /// [`Self::state`].
    pub fn start(config: CompanionConfig) -> Result<Self, CompanionServiceError> {
        let service = Self::new(config)?;
        let state = service.ensure_running()?;
        info!(%state, "Companion service started");
        Ok(service)
    }

    pub const fn config(&self) -> &CompanionConfig {
        self.supervisor.config()
    }

    pub fn ensure_running(&self) -> Result<ServiceState, CompanionServiceError> {
        self.block_on(self.supervisor.ensure_running())
    }

    pub fn state(&self) -> Result<ServiceState, CompanionServiceError> {
        self.block_on(self.supervisor.state())
    }

    pub fn watch_state(&self) -> watch::Receiver<ServiceState> {
        self.supervisor.watch_state()
    }

    pub fn owned_pid(&self) -> Result<Option<u32>, CompanionServiceError> {
        self.block_on(self.supervisor.owned_pid())
    }

    pub fn last_error(&self) -> Result<Option<SupervisorError>, CompanionServiceError> {
        self.block_on(self.supervisor.last_error())
    }

    /// Listening/healthy/PIDs of the port, without adopting anything.
    pub fn port_status(&self) -> Result<PortStatus, CompanionServiceError> {
        self.block_on(self.supervisor.port_status())
    }

    /// Block until Ctrl-C, or until an owned companion exits on its own.
    ///
    /// The owned child is checked every `poll`. Returns the state at exit.
    pub fn run_until_interrupted(
        &self,
        poll: Duration,
    ) -> Result<ServiceState, CompanionServiceError> {
        self.block_on(async {
            let interrupted = tokio::signal::ctrl_c();
            tokio::pin!(interrupted);
            let mut ticker = tokio::time::interval(poll);
            loop {
                tokio::select! {
                    signal = &mut interrupted => {
                        if let Err(e) = signal {
                            return Err(CompanionServiceError::Interrupt(e));
                        }
                        info!("Interrupted, stopping companion");
                        return Ok(self.supervisor.current_state());
                    }
                    _ = ticker.tick() => {
                        let state = self.supervisor.state().await;
                        if state == ServiceState::NotRunning {
                            return Ok(state);
                        }
                    }
                }
            }
        })?
    }

    pub fn recent_output(&self, limit: usize) -> Vec<OutputLine> {
        self.supervisor.recent_output(limit)
    }

    /// Request the sentence for one flashcard. See [`SyncBridge`].
    pub fn request_exercise_blocking(
        &self,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<String, PromptError> {
        self.bridge.request_exercise_blocking(front, back)
    }

    /// Request a sentence and pair it with the card it was generated for.
    pub fn generate_exercise(&self, request: PromptRequest) -> Result<Exercise, PromptError> {
        let sentence = self
            .bridge
            .request_exercise_blocking(request.front_text.clone(), request.back_text.clone())?;
        Ok(Exercise::new(request, sentence))
    }

    pub fn cancel_pending(&self) {
        self.bridge.cancel_pending();
    }

    pub fn stop(&self) -> Result<StopOutcome, CompanionServiceError> {
        self.block_on(self.supervisor.stop())
    }

    pub fn stop_with(&self, policy: StopPolicy) -> Result<StopOutcome, CompanionServiceError> {
        self.block_on(self.supervisor.stop_with(policy))
    }

    /// Application exit: abandon pending requests, stop the companion, and
    /// wind down the worker runtime.
    ///
    /// From inside an async runtime the companion is not stopped; the
    /// worker runtime is released in the background and the owned child is
    /// killed when its handle drops.
    pub fn shutdown(self) -> Result<StopOutcome, CompanionServiceError> {
        self.bridge.cancel_pending();
        self.supervisor.cancel();
        let outcome = self.block_on(self.supervisor.stop());

        let Self {
            supervisor,
            bridge,
            runtime,
        } = self;
        drop((bridge, supervisor));
        match &outcome {
            Ok(outcome) => {
                info!(?outcome, "Companion service shut down");
                runtime.shutdown_timeout(SHUTDOWN_GRACE);
            }
            Err(_) => runtime.shutdown_background(),
        }
        outcome
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output, CompanionServiceError> {
        if Handle::try_current().is_ok() {
            warn!("Blocking companion call issued from an async context");
            return Err(CompanionServiceError::BlockingInAsyncContext);
        }
        Ok(self.runtime.block_on(future))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn free_port() -> u16 {
        TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = CompanionConfig::default().with_health_budget(0, 10);
        assert!(matches!(
            CompanionService::new(config),
            Err(CompanionServiceError::Config(ConfigError::ZeroHealthAttempts))
        ));
    }

    #[test]
    fn requests_are_refused_before_startup() {
        let config = CompanionConfig::default().with_port(free_port());
        let service = CompanionService::new(config).unwrap();

        assert_eq!(service.state().unwrap(), ServiceState::NotRunning);
        let err = service.request_exercise_blocking("run", "to run").unwrap_err();
        assert_eq!(err, PromptError::ServiceUnavailable(ServiceState::NotRunning));
        assert_eq!(err.user_message(), "exercise generation unavailable");
    }

    #[test]
    fn missing_interpreter_degrades_to_not_running() {
        let config = CompanionConfig::default()
            .with_port(free_port())
            .with_command("/nonexistent/python3", "server.py");
        let service = CompanionService::start(config).unwrap();

        assert_eq!(service.state().unwrap(), ServiceState::NotRunning);
        assert!(matches!(
            service.last_error().unwrap(),
            Some(SupervisorError::LaunchError(_))
        ));
        assert_eq!(service.shutdown().unwrap(), StopOutcome::NoProcessFound);
    }

    #[test]
    fn calls_from_async_code_are_refused_not_panicking() {
        let config = CompanionConfig::default().with_port(free_port());
        let service = CompanionService::new(config).unwrap();
        let caller = Builder::new_current_thread().enable_all().build().unwrap();

        caller.block_on(async {
            assert!(matches!(
                service.state(),
                Err(CompanionServiceError::BlockingInAsyncContext)
            ));
            assert!(matches!(
                service.ensure_running(),
                Err(CompanionServiceError::BlockingInAsyncContext)
            ));
            assert!(matches!(
                service.stop(),
                Err(CompanionServiceError::BlockingInAsyncContext)
            ));
            assert!(matches!(
                service.port_status(),
                Err(CompanionServiceError::BlockingInAsyncContext)
            ));
        });

        // Back on a plain thread the same service works
        assert_eq!(service.state().unwrap(), ServiceState::NotRunning);
        assert_eq!(service.shutdown().unwrap(), StopOutcome::NoProcessFound);
    }

    #[test]
    fn shutdown_from_async_code_does_not_panic() {
        let config = CompanionConfig::default().with_port(free_port());
        let service = CompanionService::new(config).unwrap();
        let caller = Builder::new_current_thread().enable_all().build().unwrap();

        let outcome = caller.block_on(async { service.shutdown() });
        assert!(matches!(
            outcome,
            Err(CompanionServiceError::BlockingInAsyncContext)
        ));
    }
}
