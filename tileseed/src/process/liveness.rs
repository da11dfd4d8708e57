use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

/// Whether `pid` names a running process.
///
/// Zombies count as dead: the process has exited and only its exit status
/// is waiting to be collected.
pub fn is_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    let target = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
    match system.process(target) {
        Some(process) => !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_own_process_is_alive() {
        assert!(is_alive(std::process::id()));
    }

    #[test]
    fn test_pid_zero_is_not_alive() {
        assert!(!is_alive(0));
    }

    #[test]
    fn test_reaped_child_is_not_alive() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert!(!is_alive(pid));
    }
}
