//! Force-kill processes by PID (no `Child` handle available).

use std::io;

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

#[cfg(unix)]
use std::time::Duration;
#[cfg(unix)]
use tokio::time::sleep;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};

/// Check whether a PID belongs to a live (non-zombie) process.
///
/// A killed process we are not the parent of may linger as a zombie until
/// its parent reaps it; its sockets are already closed, so it counts as gone.
pub fn is_process_alive(pid: u32) -> bool {
    let mut system = System::new();
    let pid = Pid::from_u32(pid);
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    system.process(pid).is_some_and(|process| {
        !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
    })
}

/// Send SIGKILL to `pid` and wait for it to disappear.
///
/// # Strategy
/// 1. Send SIGKILL (the companion holds no state worth a graceful exit)
/// 2. Poll for up to 2 seconds until the process is gone or a zombie
///
/// # Returns
/// - `Ok(())` if the process was killed or already gone
/// - `Err` if signaling fails (excluding ESRCH) or the process survives
pub async fn kill_pid(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        kill_pid_unix(pid).await
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "PID signaling not implemented on this platform",
        ))
    }
}

#[cfg(unix)]
async fn kill_pid_unix(pid: u32) -> io::Result<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid pid {pid}")))?;
    let nix_pid = nix::unistd::Pid::from_raw(raw);

    match signal::kill(nix_pid, Signal::SIGKILL) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(()),
        Err(e) => return Err(io::Error::other(e)),
    }

    for _ in 0..20 {
        if !is_process_alive(pid) {
            return Ok(());
        }
        sleep(Duration::from_millis(100)).await;
    }

    Err(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("process {pid} did not exit after SIGKILL"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;

    #[tokio::test]
    #[cfg(unix)]
    async fn kill_pid_handles_already_gone() {
        // Use a PID that's very unlikely to exist
        let result = kill_pid(999_999).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn kill_pid_terminates_process() {
        let mut child = Command::new("sleep")
            .arg("60")
            .spawn()
            .expect("failed to spawn sleep");

        let pid = child.id().expect("no PID");
        assert!(is_process_alive(pid));

        // Our own child turns into a zombie, which already counts as gone
        let result = kill_pid(pid).await;
        assert!(result.is_ok(), "kill_pid failed: {result:?}");

        let _ = child.wait().await;
        assert!(!is_process_alive(pid));
    }
}
