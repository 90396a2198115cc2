//! Async stream readers for companion output (non-UTF8-safe).
//!
//! The companion is an interpreter running third-party code and may emit
//! arbitrary bytes. `BufReader::lines()` would end the reader task on
//! invalid UTF-8, so lines are read as bytes and decoded lossily.

use std::sync::Arc;

use flashgen_core::{CompanionOutputSink, OutputStream};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tracing::{debug, info};

/// Attach to the child's stdout and stderr and forward each line to `sinks`.
///
/// Readers run as detached tasks: they never block the caller and end on
/// EOF or the first read error. Every line is also emitted under the
/// `companion` tracing target.
pub fn capture_output(child: &mut Child, port: u16, sinks: &[Arc<dyn CompanionOutputSink>]) {
    if let Some(stdout) = child.stdout.take() {
        spawn_stream_reader(stdout, port, OutputStream::Stdout, sinks.to_vec());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_stream_reader(stderr, port, OutputStream::Stderr, sinks.to_vec());
    }
}

fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    port: u16,
    kind: OutputStream,
    sinks: Vec<Arc<dyn CompanionOutputSink>>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    // Trim trailing newline(s)
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf).to_string();
                    info!(target: "companion", port, stream = %kind, "{}", line);
                    for sink in &sinks {
                        sink.append(kind, line.clone());
                    }
                }
                Err(e) => {
                    debug!(port, stream = %kind, error = %e, "output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(port, stream = %kind, "output reader task exiting");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::OutputLog;
    use std::process::Stdio;
    use std::time::Duration;
    use tokio::process::Command;

    #[tokio::test]
    #[cfg(unix)]
    async fn forwards_both_streams_including_invalid_utf8() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("printf 'hello\\r\\n'; printf 'bad \\377 byte\\n' 1>&2")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn sh");

        let log = Arc::new(OutputLog::new());
        let sinks: Vec<Arc<dyn CompanionOutputSink>> = vec![log.clone()];
        capture_output(&mut child, 0, &sinks);
        child.wait().await.unwrap();

        // Readers are detached; give them a moment to drain the pipes
        for _ in 0..50 {
            if log.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let lines = log.recent(10);
        assert_eq!(lines.len(), 2);
        assert!(
            lines
                .iter()
                .any(|l| l.stream == OutputStream::Stdout && l.line == "hello")
        );
        assert!(
            lines
                .iter()
                .any(|l| l.stream == OutputStream::Stderr && l.line.starts_with("bad "))
        );
    }
}
