//! Start command handler.
//!
//! Brings the companion up and keeps it supervised in the foreground until
//! Ctrl-C. A companion that was already listening is reused and left
//! running on exit.

use std::time::Duration;

use anyhow::Result;
use flashgen_core::{CompanionConfig, ServiceState};
use flashgen_runtime::CompanionService;

use crate::error::CliError;
use crate::presentation::describe_stop;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const OUTPUT_TAIL: usize = 20;

pub fn execute(config: CompanionConfig) -> Result<()> {
    let port = config.port;
    let service = CompanionService::start(config).map_err(CliError::from)?;
    let state = service.state().map_err(CliError::from)?;
    println!("Companion on port {port} is {state}");

    if state == ServiceState::NotRunning {
        print_output_tail(&service);
        let reason = service
            .last_error()
            .map_err(CliError::from)?
            .map_or_else(|| "no further detail".to_string(), |e| e.to_string());
        service.shutdown().map_err(CliError::from)?;
        return Err(CliError::NotRunning { state, reason }.into());
    }

    match service.owned_pid().map_err(CliError::from)? {
        Some(pid) => println!("Started companion (PID {pid})"),
        None => println!("Reusing the companion already on port {port}; it will be left running"),
    }
    if state == ServiceState::Unresponsive {
        println!("Warning: the companion is not answering HTTP yet");
    }
    println!("Press Ctrl-C to stop");

    let final_state = service
        .run_until_interrupted(POLL_INTERVAL)
        .map_err(CliError::from)?;
    if final_state == ServiceState::NotRunning {
        println!("Companion exited on its own");
        print_output_tail(&service);
    }

    let outcome = service.shutdown().map_err(CliError::from)?;
    println!("{}", describe_stop(&outcome, port));
    Ok(())
}

fn print_output_tail(service: &CompanionService) {
    for line in service.recent_output(OUTPUT_TAIL) {
        eprintln!("  [{}] {}", line.stream, line.line);
    }
}
