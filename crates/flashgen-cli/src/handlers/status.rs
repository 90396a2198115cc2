//! Status command handler.

use anyhow::Result;
use flashgen_core::CompanionConfig;
use flashgen_runtime::CompanionService;

use crate::error::CliError;
use crate::presentation::describe_port;

/// Probe the companion port. Never launches or adopts anything.
pub fn execute(config: CompanionConfig, json: bool) -> Result<()> {
    let service = CompanionService::new(config).map_err(CliError::from)?;
    let status = service.port_status().map_err(CliError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", describe_port(&status));
    }
    Ok(())
}
