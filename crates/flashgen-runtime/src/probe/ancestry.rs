//! Process ancestry checks used to verify ownership before signaling.

use sysinfo::{Pid, ProcessesToUpdate, System};

/// Upper bound on parent hops, guards against cycles in a racy snapshot.
const MAX_DEPTH: usize = 64;

/// Check whether `pid` is `ancestor` or one of its descendants.
///
/// Interpreters such as Flask's reloader bind the port from a child of the
/// process we spawned, so a plain PID comparison is too strict.
///
/// Returns `false` if either process is gone or the table cannot be read.
pub fn is_descendant_of(pid: u32, ancestor: u32) -> bool {
    if pid == ancestor {
        return true;
    }

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let mut current = Pid::from_u32(pid);
    for _ in 0..MAX_DEPTH {
        let Some(process) = system.process(current) else {
            return false;
        };
        let Some(parent) = process.parent() else {
            return false;
        };
        if parent.as_u32() == ancestor {
            return true;
        }
        if parent == current {
            return false;
        }
        current = parent;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_is_its_own_descendant() {
        let me = std::process::id();
        assert!(is_descendant_of(me, me));
    }

    #[test]
    #[cfg(unix)]
    fn spawned_child_descends_from_self() {
        let mut child = std::process::Command::new("sleep")
            .arg("5")
            .spawn()
            .expect("failed to spawn sleep");

        assert!(is_descendant_of(child.id(), std::process::id()));
        assert!(!is_descendant_of(std::process::id(), child.id()));

        let _ = child.kill();
        let _ = child.wait();
    }

    #[test]
    fn missing_process_is_not_a_descendant() {
        assert!(!is_descendant_of(999_999, std::process::id()));
    }
}
