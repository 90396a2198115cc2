//! Listening-socket discovery from the OS socket table.
//!
//! # Platform behavior
//! - **Linux**: parses `/proc/net/tcp{,6}` for sockets in the LISTEN state,
//!   then maps their inodes to PIDs through `/proc/<pid>/fd/*` links
//! - **Other Unix**: asks `lsof -t` for listeners on the port
//! - **Other**: reports nothing (conservative)
//!
//! No network call is made. Any read failure is treated as "nothing
//! listening" rather than an error.
#![cfg_attr(not(target_os = "linux"), allow(dead_code))]

#[cfg(target_os = "linux")]
pub use linux::{is_port_listening, listening_pids};

#[cfg(all(unix, not(target_os = "linux")))]
pub use lsof::{is_port_listening, listening_pids};

#[cfg(not(unix))]
pub fn is_port_listening(_port: u16) -> bool {
    false
}

#[cfg(not(unix))]
pub fn listening_pids(_port: u16) -> Vec<u32> {
    Vec::new()
}

/// One row of `/proc/net/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SocketEntry {
    port: u16,
    listening: bool,
    inode: u64,
}

/// `st` column value for `TCP_LISTEN`.
const TCP_LISTEN: &str = "0A";

/// Parse a `/proc/net/tcp` style table (header line first).
fn parse_table(contents: &str) -> Vec<SocketEntry> {
    contents.lines().skip(1).filter_map(parse_line).collect()
}

// "  0: 0100007F:1F40 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000  0 41234 ..."
fn parse_line(line: &str) -> Option<SocketEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (_, port_hex) = fields.get(1)?.rsplit_once(':')?;
    let port = u16::from_str_radix(port_hex, 16).ok()?;
    let state = *fields.get(3)?;
    let inode = fields.get(9)?.parse().ok()?;
    Some(SocketEntry {
        port,
        listening: state.eq_ignore_ascii_case(TCP_LISTEN),
        inode,
    })
}

/// Extract the inode from a `socket:[12345]` fd link target.
fn socket_inode(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

#[cfg(target_os = "linux")]
mod linux {
    use std::collections::HashSet;
    use std::fs;
    use std::io;

    use tracing::debug;

    use super::{parse_table, socket_inode};

    const TCP_TABLES: [&str; 2] = ["/proc/net/tcp", "/proc/net/tcp6"];

    /// Inodes of sockets listening on `port`, across IPv4 and IPv6.
    fn listening_inodes(port: u16) -> io::Result<HashSet<u64>> {
        let mut inodes = HashSet::new();
        let mut last_error = None;
        let mut any_read = false;

        for table in TCP_TABLES {
            match fs::read_to_string(table) {
                Ok(contents) => {
                    any_read = true;
                    inodes.extend(
                        parse_table(&contents)
                            .into_iter()
                            .filter(|entry| entry.listening && entry.port == port)
                            .map(|entry| entry.inode),
                    );
                }
                Err(e) => {
                    debug!(table, error = %e, "Failed to read socket table");
                    last_error = Some(e);
                }
            }
        }

        match (any_read, last_error) {
            (false, Some(e)) => Err(e),
            _ => Ok(inodes),
        }
    }

    /// Check whether any socket is listening on `port`.
    pub fn is_port_listening(port: u16) -> bool {
        match listening_inodes(port) {
            Ok(inodes) => !inodes.is_empty(),
            Err(e) => {
                debug!(port, error = %e, "Socket table unavailable, assuming not listening");
                false
            }
        }
    }

    /// PIDs holding a listening socket on `port`.
    ///
    /// Processes whose fd table we cannot read (other users) are skipped.
    pub fn listening_pids(port: u16) -> Vec<u32> {
        let inodes = match listening_inodes(port) {
            Ok(inodes) if !inodes.is_empty() => inodes,
            Ok(_) => return Vec::new(),
            Err(e) => {
                debug!(port, error = %e, "Socket table unavailable");
                return Vec::new();
            }
        };

        let Ok(proc_dir) = fs::read_dir("/proc") else {
            return Vec::new();
        };

        let mut pids: Vec<u32> = proc_dir
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .filter(|pid| holds_any_socket(*pid, &inodes))
            .collect();

        pids.sort_unstable();
        pids.dedup();
        debug!(port, ?pids, "Resolved listening PIDs");
        pids
    }

    fn holds_any_socket(pid: u32, inodes: &HashSet<u64>) -> bool {
        let Ok(fds) = fs::read_dir(format!("/proc/{pid}/fd")) else {
            return false;
        };

        fds.filter_map(Result::ok).any(|fd| {
            fs::read_link(fd.path())
                .ok()
                .and_then(|target| socket_inode(&target.to_string_lossy()))
                .is_some_and(|inode| inodes.contains(&inode))
        })
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
mod lsof {
    use std::process::Command;

    use tracing::debug;

    /// Run `lsof -t` for listeners on `port`.
    ///
    /// `lsof` exits 1 when nothing matches, so only the output is trusted.
    fn lsof_pids(port: u16) -> Vec<u32> {
        let output = Command::new("lsof")
            .args(["-nP", &format!("-iTCP:{port}"), "-sTCP:LISTEN", "-t"])
            .output();

        match output {
            Ok(output) => {
                let mut pids: Vec<u32> = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .filter_map(|line| line.trim().parse().ok())
                    .collect();
                pids.sort_unstable();
                pids.dedup();
                pids
            }
            Err(e) => {
                debug!(port, error = %e, "lsof unavailable, assuming not listening");
                Vec::new()
            }
        }
    }

    pub fn is_port_listening(port: u16) -> bool {
        !lsof_pids(port).is_empty()
    }

    pub fn listening_pids(port: u16) -> Vec<u32> {
        lsof_pids(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    const SAMPLE: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:1F40 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 41234 1 0000000000000000 100 0 0 10 0
   1: 0100007F:1F40 0100007F:C350 01 00000000:00000000 00:00000000 00000000  1000        0 41240 1 0000000000000000 20 4 30 10 -1
   2: 00000000:0016 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 1500 1 0000000000000000 100 0 0 10 0
";

    #[test]
    fn parses_listen_rows() {
        let entries = parse_table(SAMPLE);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            SocketEntry {
                port: 8000,
                listening: true,
                inode: 41234
            }
        );
        // Established connection on the same port is not a listener
        assert!(!entries[1].listening);
        assert_eq!(entries[2].port, 22);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let table = "header\n   0: garbage\n\n";
        assert!(parse_table(table).is_empty());
    }

    #[test]
    fn socket_links_yield_inodes() {
        assert_eq!(socket_inode("socket:[41234]"), Some(41234));
        assert_eq!(socket_inode("pipe:[41234]"), None);
        assert_eq!(socket_inode("/dev/null"), None);
    }

    #[test]
    #[cfg(unix)]
    fn unbound_port_is_not_listening() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(!is_port_listening(port));
        assert!(listening_pids(port).is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn bound_listener_is_detected_with_our_pid() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(is_port_listening(port));
        assert!(listening_pids(port).contains(&std::process::id()));

        drop(listener);
        assert!(!is_port_listening(port));
    }
}
