//! Companion service configuration.
//!
//! Defaults mirror the desktop app's fixed setup: a Python interpreter
//! running `server.py` from the app directory, listening on loopback
//! port 8000. Every field can be overridden from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contracts::PROMPT_PATH;
use crate::paths::{APP_DIR_RELATIVE, COMPANION_SCRIPT_NAME, default_script_path};

/// Default interpreter used to run the companion script.
pub const DEFAULT_INTERPRETER: &str = "/usr/bin/python3";

/// Default host the companion listens on.
pub const DEFAULT_COMPANION_HOST: &str = "127.0.0.1";

/// Default port the companion listens on.
pub const DEFAULT_COMPANION_PORT: u16 = 8000;

/// Default route for the exercise request.
pub const DEFAULT_PROMPT_PATH: &str = PROMPT_PATH;

/// Environment variable names.
pub mod env {
    pub const INTERPRETER: &str = "FLASHGEN_COMPANION_INTERPRETER";
    pub const SCRIPT: &str = "FLASHGEN_COMPANION_SCRIPT";
    pub const HOST: &str = "FLASHGEN_COMPANION_HOST";
    pub const PORT: &str = "FLASHGEN_COMPANION_PORT";
    pub const HEALTH_ATTEMPTS: &str = "FLASHGEN_COMPANION_HEALTH_ATTEMPTS";
    pub const REQUEST_TIMEOUT_SECS: &str = "FLASHGEN_COMPANION_REQUEST_TIMEOUT_SECS";
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Interpreter path cannot be empty")]
    EmptyInterpreter,

    #[error("Port should be >= 1024 (privileged ports require root), got {0}")]
    InvalidPort(u16),

    #[error("Host cannot be empty")]
    EmptyHost,

    #[error("Route {0:?} must start with '/'")]
    InvalidPath(String),

    #[error("Health attempt budget must be at least 1")]
    ZeroHealthAttempts,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },
}

/// How the companion is launched, where it listens, and how patiently it is probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Executable that runs the script (no arguments besides the script).
    pub interpreter: PathBuf,
    /// Script passed as the sole argument.
    pub script: PathBuf,
    /// Host the companion listens on.
    pub host: String,
    /// Port the companion listens on.
    pub port: u16,
    /// Route for `POST` exercise requests.
    pub prompt_path: String,
    /// Route probed with `GET` to decide liveness.
    pub health_path: String,
    /// Number of health probes after launch before giving up.
    pub health_attempts: u32,
    /// Pause between health probes.
    pub health_backoff_ms: u64,
    /// Timeout of a single health probe.
    pub probe_timeout_ms: u64,
    /// Deadline for one exercise request, end to end.
    pub request_timeout_secs: u64,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        let script = default_script_path()
            .unwrap_or_else(|_| PathBuf::from(APP_DIR_RELATIVE).join(COMPANION_SCRIPT_NAME));
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            script,
            host: DEFAULT_COMPANION_HOST.to_string(),
            port: DEFAULT_COMPANION_PORT,
            prompt_path: DEFAULT_PROMPT_PATH.to_string(),
            // The companion has no dedicated health route; a GET on the
            // prompt route answers 405, which is enough to prove it is alive.
            health_path: DEFAULT_PROMPT_PATH.to_string(),
            health_attempts: 30,
            health_backoff_ms: 500,
            probe_timeout_ms: 2_000,
            request_timeout_secs: 120,
        }
    }
}

impl CompanionConfig {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unset keys leave the current value in place.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(env::INTERPRETER) {
            self.interpreter = PathBuf::from(value);
        }
        if let Some(value) = lookup(env::SCRIPT) {
            self.script = PathBuf::from(value);
        }
        if let Some(value) = lookup(env::HOST) {
            self.host = value;
        }
        if let Some(value) = lookup(env::PORT) {
            self.port = parse_env(env::PORT, &value)?;
        }
        if let Some(value) = lookup(env::HEALTH_ATTEMPTS) {
            self.health_attempts = parse_env(env::HEALTH_ATTEMPTS, &value)?;
        }
        if let Some(value) = lookup(env::REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_env(env::REQUEST_TIMEOUT_SECS, &value)?;
        }
        Ok(self)
    }

    /// Set the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the interpreter and script used to launch the companion.
    #[must_use]
    pub fn with_command(
        mut self,
        interpreter: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
    ) -> Self {
        self.interpreter = interpreter.into();
        self.script = script.into();
        self
    }

    /// Set the health probe budget.
    #[must_use]
    pub const fn with_health_budget(mut self, attempts: u32, backoff_ms: u64) -> Self {
        self.health_attempts = attempts;
        self.health_backoff_ms = backoff_ms;
        self
    }

    /// Set the per-request deadline.
    #[must_use]
    pub const fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// `http://host:port`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Full URL of the exercise route.
    #[must_use]
    pub fn prompt_url(&self) -> String {
        format!("{}{}", self.base_url(), self.prompt_path)
    }

    /// Full URL probed for liveness.
    #[must_use]
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), self.health_path)
    }

    #[must_use]
    pub const fn health_backoff(&self) -> Duration {
        Duration::from_millis(self.health_backoff_ms)
    }

    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interpreter.as_os_str().is_empty() {
            return Err(ConfigError::EmptyInterpreter);
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        if self.port < 1024 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        for path in [&self.prompt_path, &self.health_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath(path.clone()));
            }
        }

        if self.health_attempts == 0 {
            return Err(ConfigError::ZeroHealthAttempts);
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("probe_timeout_ms"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("request_timeout_secs"));
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        debug!(key, value, "rejecting environment override");
        ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CompanionConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.interpreter, PathBuf::from("/usr/bin/python3"));
        assert!(config.script.ends_with("Language_app_qt/server.py"));
        assert_eq!(config.prompt_url(), "http://127.0.0.1:8000/prompt/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = CompanionConfig::default()
            .with_env_lookup(lookup(&[
                (env::PORT, "8123"),
                (env::INTERPRETER, "/opt/python/bin/python3"),
                (env::HEALTH_ATTEMPTS, " 5 "),
            ]))
            .unwrap();
        assert_eq!(config.port, 8123);
        assert_eq!(config.interpreter, PathBuf::from("/opt/python/bin/python3"));
        assert_eq!(config.health_attempts, 5);
        assert_eq!(config.host, DEFAULT_COMPANION_HOST);
    }

    #[test]
    fn test_invalid_env_value_is_rejected() {
        let err = CompanionConfig::default()
            .with_env_lookup(lookup(&[(env::PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key, .. } if key == env::PORT));
    }

    #[test]
    fn test_validation_rules() {
        let mut config = CompanionConfig::default().with_port(80);
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort(80)));

        config = CompanionConfig::default().with_health_budget(0, 100);
        assert_eq!(config.validate(), Err(ConfigError::ZeroHealthAttempts));

        config = CompanionConfig::default();
        config.prompt_path = "prompt/".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPath(_))));

        config = CompanionConfig::default().with_command("", "server.py");
        assert_eq!(config.validate(), Err(ConfigError::EmptyInterpreter));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: CompanionConfig = serde_json::from_str(r#"{"port": 9001}"#).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.health_path, "/prompt/");
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
    }
}
