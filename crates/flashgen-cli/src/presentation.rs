//! Terminal formatting for command results.

use flashgen_core::{AnswerVerdict, Exercise};
use flashgen_runtime::{PortStatus, StopOutcome};

/// Multi-line human summary of a port probe.
pub fn describe_port(status: &PortStatus) -> String {
    let mut out = format!(
        "Port {}: {}",
        status.port,
        if status.listening {
            "listening"
        } else {
            "not listening"
        }
    );

    if status.listening {
        out.push_str(if status.healthy {
            "\nHTTP: answering"
        } else {
            "\nHTTP: not answering"
        });
        if status.pids.is_empty() {
            out.push_str("\nPIDs: (not visible)");
        } else {
            let pids: Vec<String> = status.pids.iter().map(u32::to_string).collect();
            out.push_str(&format!("\nPIDs: {}", pids.join(", ")));
        }
    }
    out
}

pub fn describe_stop(outcome: &StopOutcome, port: u16) -> String {
    match outcome {
        StopOutcome::Stopped { pids } => {
            let pids: Vec<String> = pids.iter().map(u32::to_string).collect();
            format!("Stopped companion on port {port} (PID {})", pids.join(", "))
        }
        StopOutcome::NoProcessFound => format!("No companion process found on port {port}"),
    }
}

pub fn describe_verdict(verdict: AnswerVerdict, exercise: &Exercise) -> String {
    match verdict {
        AnswerVerdict::Correct => "Correct!".to_string(),
        AnswerVerdict::Incorrect => format!("Not quite. The answer was \"{}\"", exercise.front_text),
    }
}
