use super::ProcessError;
use std::fs::File;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use tracing::{debug, info, warn};

/// Environment variable carrying the JSON job description to a worker.
pub const JOB_ENV: &str = "TILESEED_JOB";

/// Launches detached worker processes.
///
/// Workers run in their own process group with stdin closed and both
/// output streams attached to the job's progress log. They outlive the
/// caller's request; see [`LaunchedWorker`] for how they are reaped.
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerLauncher {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Start a worker for `job_json`.
    pub fn launch(
        &self,
        job_json: &str,
        stdout: File,
        stderr: File,
    ) -> Result<LaunchedWorker, ProcessError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .env(JOB_ENV, job_json)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .process_group(0)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let pid = child.id();
        info!(pid, program = %self.program.display(), "Worker launched");
        Ok(LaunchedWorker {
            pid,
            child: Some(child),
        })
    }
}

/// A worker this process started.
///
/// Its exit status is not collected while the value is alive, so the pid
/// stays reserved for it and can be signalled safely. Dropping the value
/// hands the child to a background thread that reaps it.
#[derive(Debug)]
pub struct LaunchedWorker {
    pid: u32,
    child: Option<Child>,
}

impl LaunchedWorker {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether the worker has already exited.
    pub fn has_exited(&mut self) -> Result<bool, ProcessError> {
        let Some(child) = self.child.as_mut() else {
            return Ok(true);
        };
        match child.try_wait() {
            Ok(status) => Ok(status.is_some()),
            Err(source) => Err(ProcessError::Wait {
                pid: self.pid,
                source,
            }),
        }
    }
}

impl Drop for LaunchedWorker {
    fn drop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = self.pid;
        let reaper = thread::Builder::new()
            .name(format!("reap-{}", pid))
            .spawn(move || match child.wait() {
                Ok(status) => debug!(pid, %status, "Worker exited"),
                Err(e) => warn!(pid, error = %e, "Failed to collect worker exit status"),
            });
        if let Err(e) = reaper {
            warn!(pid, error = %e, "Failed to start reaper thread");
        }
    }
}
