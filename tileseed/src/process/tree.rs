use super::liveness::is_alive;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::{ProcessesToUpdate, System};
use thiserror::Error;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to send {signal} to process {pid}: {source}")]
    Signal {
        pid: u32,
        signal: Signal,
        #[source]
        source: Errno,
    },

    #[error("failed to spawn worker {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to check worker {pid}: {source}")]
    Wait {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

/// How a tree termination ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeKill {
    /// Every process signalled, children before parents
    pub signalled: Vec<u32>,
    /// Processes that ignored SIGTERM and were killed
    pub forced: Vec<u32>,
}

/// Terminate `root` and all of its descendants.
///
/// SIGTERM goes to the deepest descendants first and the root last, so no
/// parent can respawn a child that was already signalled. Whatever is still
/// alive after `grace` receives SIGKILL. Processes that exit on their own
/// in the meantime are not an error.
pub fn terminate_tree(root: u32, grace: Duration) -> Result<TreeKill, ProcessError> {
    let order = termination_order(root, &process_table());
    info!(root, processes = order.len(), "Terminating process tree");

    let mut signalled = Vec::with_capacity(order.len());
    for &pid in &order {
        if send(pid, Signal::SIGTERM)? {
            signalled.push(pid);
        }
    }

    let deadline = Instant::now() + grace;
    let mut survivors: Vec<u32> = signalled.clone();
    loop {
        survivors.retain(|&pid| is_alive(pid));
        if survivors.is_empty() || Instant::now() >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    let mut forced = Vec::new();
    for pid in survivors {
        warn!(pid, "Process ignored SIGTERM, killing");
        if send(pid, Signal::SIGKILL)? {
            forced.push(pid);
        }
    }

    Ok(TreeKill { signalled, forced })
}

/// Send `signal`, returning false when the process is already gone.
fn send(pid: u32, signal: Signal) -> Result<bool, ProcessError> {
    let Ok(raw) = i32::try_from(pid) else {
        return Ok(false);
    };
    match kill(Pid::from_raw(raw), signal) {
        Ok(()) => {
            debug!(pid, %signal, "Signal sent");
            Ok(true)
        }
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(ProcessError::Signal {
            pid,
            signal,
            source,
        }),
    }
}

/// Snapshot of `(pid, parent)` pairs for every process.
fn process_table() -> Vec<(u32, u32)> {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);
    system
        .processes()
        .iter()
        .filter_map(|(pid, process)| process.parent().map(|parent| (pid.as_u32(), parent.as_u32())))
        .collect()
}

/// Descendants of `root` in post-order (children before their parent),
/// ending with `root` itself.
pub(crate) fn termination_order(root: u32, table: &[(u32, u32)]) -> Vec<u32> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for &(pid, parent) in table {
        if pid != parent {
            children.entry(parent).or_default().push(pid);
        }
    }
    for list in children.values_mut() {
        list.sort_unstable();
    }

    let mut order = Vec::new();
    let mut visited = HashSet::new();
    // (pid, children expanded)
    let mut stack = vec![(root, false)];
    while let Some((pid, expanded)) = stack.pop() {
        if expanded {
            order.push(pid);
            continue;
        }
        if !visited.insert(pid) {
            continue;
        }
        stack.push((pid, true));
        if let Some(kids) = children.get(&pid) {
            for &kid in kids.iter().rev() {
                stack.push((kid, false));
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_lone_root() {
        assert_eq!(termination_order(10, &[(11, 1), (12, 1)]), vec![10]);
    }

    #[test]
    fn test_children_before_parents() {
        // 10 -> 11 -> 13, 10 -> 12
        let table = [(11, 10), (12, 10), (13, 11), (99, 1)];
        assert_eq!(termination_order(10, &table), vec![13, 11, 12, 10]);
    }

    #[test]
    fn test_cycles_do_not_loop() {
        let table = [(11, 10), (10, 11)];
        assert_eq!(termination_order(10, &table), vec![11, 10]);
    }

    #[test]
    fn test_terminate_tree_kills_shell_and_child() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("sleep 30 & wait")
            .spawn()
            .unwrap();
        let pid = child.id();
        // Let the shell fork its sleep.
        thread::sleep(Duration::from_millis(200));

        let result = terminate_tree(pid, Duration::from_secs(2)).unwrap();
        child.wait().unwrap();

        assert!(result.signalled.contains(&pid));
        assert!(result.signalled.len() >= 2, "sleep should be signalled too");
        for descendant in &result.signalled {
            if *descendant != pid {
                assert!(!is_alive(*descendant));
            }
        }
    }

    #[test]
    fn test_terminate_exited_process_is_noop() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        let result = terminate_tree(pid, Duration::from_millis(100)).unwrap();
        assert!(result.signalled.is_empty());
    }
}
