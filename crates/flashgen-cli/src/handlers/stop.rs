//! Stop command handler.

use anyhow::Result;
use flashgen_core::CompanionConfig;
use flashgen_runtime::{CompanionService, StopPolicy};

use crate::error::CliError;
use crate::presentation::describe_stop;

/// Stop the companion on the configured port.
///
/// A fresh invocation owns no process, so without `force` this only
/// reports. `force` kills whatever listens on the port.
pub fn execute(config: CompanionConfig, force: bool) -> Result<()> {
    let port = config.port;
    let service = CompanionService::new(config).map_err(CliError::from)?;

    let policy = if force {
        StopPolicy::AnyListener
    } else {
        StopPolicy::OwnedOnly
    };
    let outcome = service.stop_with(policy).map_err(CliError::from)?;
    println!("{}", describe_stop(&outcome, port));

    if !force && !outcome.is_stopped() {
        let status = service.port_status().map_err(CliError::from)?;
        if status.listening {
            println!("Port {port} is held by a process flashgen did not start in this run.");
            println!("Use 'flashgen stop --force' to kill it anyway.");
        }
    }
    Ok(())
}
