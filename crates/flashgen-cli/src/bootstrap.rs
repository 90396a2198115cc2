//! CLI bootstrap: logging and configuration.
//!
//! Precedence, lowest first: built-in defaults, `FLASHGEN_COMPANION_*`
//! environment (a `.env` file is loaded by `main`), command-line flags.

use flashgen_core::CompanionConfig;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::parser::Cli;

/// Install the tracing subscriber on stderr.
///
/// `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Build and validate the companion configuration for this invocation.
pub fn companion_config(cli: &Cli) -> Result<CompanionConfig, CliError> {
    let config = apply_overrides(CompanionConfig::from_env()?, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(mut config: CompanionConfig, cli: &Cli) -> CompanionConfig {
    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(interpreter) = &cli.interpreter {
        config.interpreter.clone_from(interpreter);
    }
    if let Some(script) = &cli.script {
        config.script.clone_from(script);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "flashgen",
            "--port",
            "9001",
            "--script",
            "/srv/companion/server.py",
            "status",
        ]);
        let config = apply_overrides(CompanionConfig::default(), &cli);

        assert_eq!(config.port, 9001);
        assert_eq!(config.script, PathBuf::from("/srv/companion/server.py"));
        assert_eq!(config.prompt_url(), "http://127.0.0.1:9001/prompt/");
    }

    #[test]
    fn absent_flags_keep_config() {
        let base = CompanionConfig::default().with_port(8123);
        let mut cli = Cli::parse_from(["flashgen", "status"]);
        cli.port = None;
        cli.host = None;
        cli.interpreter = None;
        cli.script = None;

        assert_eq!(apply_overrides(base.clone(), &cli), base);
    }
}
