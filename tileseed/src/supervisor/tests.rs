use super::*;
use crate::job::JobPaths;
use crate::status::ArtifactMetadata;
use crate::tileset::fixtures::wms_tileset;
use crate::tileset::{JsonRegistry, TilesetRegistry};
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::Instant;
use tempfile::TempDir;

fn supervisor(root: &Path, script: &str) -> JobSupervisor {
    JobSupervisor::new(
        LockStore::new(root),
        JobSpecBuilder::new(root, "tms"),
        WorkerLauncher::new("sh", vec!["-c".to_string(), script.to_string()]),
    )
    .with_stop_grace(Duration::from_secs(2))
}

fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

fn backups_of(dir: &Path, prefix: &str) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(&format!("{}_", prefix)))
        .collect()
}

fn dead_pid() -> u32 {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

#[test]
fn test_seed_launches_worker_and_records_pid() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("boston.progress_log"), "old run\n").unwrap();
    let supervisor = supervisor(temp.path(), "sleep 30");
    let tileset = wms_tileset(1, "boston");

    let outcome = supervisor.seed(&tileset).unwrap();
    assert_eq!(outcome, SeedOutcome::Started);

    let locks = LockStore::new(temp.path());
    let pid = match locks.read(&tileset.id).unwrap() {
        LockState::Pid(pid) => pid,
        other => panic!("expected pid in lock, got {}", other),
    };
    assert!(is_alive(pid));
    assert_eq!(backups_of(temp.path(), "boston.progress_log").len(), 1);

    assert_eq!(supervisor.stop(&tileset.id).unwrap(), StopOutcome::Stopped);
    assert_eq!(locks.read(&tileset.id).unwrap(), LockState::Absent);
    assert!(wait_for(|| !is_alive(pid)));
}

#[test]
fn test_second_seed_is_already_started() {
    let temp = TempDir::new().unwrap();
    let supervisor = supervisor(temp.path(), "sleep 30");
    let tileset = wms_tileset(1, "boston");

    assert_eq!(supervisor.seed(&tileset).unwrap(), SeedOutcome::Started);
    assert_eq!(
        supervisor.seed(&tileset).unwrap(),
        SeedOutcome::AlreadyStarted
    );

    supervisor.stop(&tileset.id).unwrap();
}

#[test]
fn test_invalid_tileset_is_unable_to_start_and_leaves_no_lock() {
    let temp = TempDir::new().unwrap();
    let supervisor = supervisor(temp.path(), "sleep 30");
    let mut tileset = wms_tileset(1, "boston");
    tileset.layer_zoom_start = 10;
    tileset.layer_zoom_stop = 5;

    let outcome = supervisor.seed(&tileset).unwrap();

    match outcome {
        SeedOutcome::UnableToStart { error } => assert!(error.contains("zoom start")),
        other => panic!("expected unable to start, got {:?}", other),
    }
    assert_eq!(
        LockStore::new(temp.path()).read(&tileset.id).unwrap(),
        LockState::Absent
    );
    assert!(!temp.path().join("boston.progress_log").exists());
}

#[test]
fn test_spawn_failure_releases_lock() {
    let temp = TempDir::new().unwrap();
    let supervisor = JobSupervisor::new(
        LockStore::new(temp.path()),
        JobSpecBuilder::new(temp.path(), "tms"),
        WorkerLauncher::new(temp.path().join("missing-binary"), Vec::new()),
    );
    let tileset = wms_tileset(1, "boston");

    assert!(supervisor.seed(&tileset).is_err());
    assert_eq!(
        LockStore::new(temp.path()).read(&tileset.id).unwrap(),
        LockState::Absent
    );
}

#[test]
fn test_seed_moves_stale_generating_output_aside() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("boston.generating"), "partial").unwrap();
    let supervisor = supervisor(temp.path(), "sleep 30");
    let tileset = wms_tileset(1, "boston");

    supervisor.seed(&tileset).unwrap();

    assert!(!temp.path().join("boston.generating").exists());
    assert_eq!(backups_of(temp.path(), "boston.generating").len(), 1);
    supervisor.stop(&tileset.id).unwrap();
}

#[test]
fn test_stop_without_lock() {
    let temp = TempDir::new().unwrap();
    let supervisor = supervisor(temp.path(), "true");
    assert_eq!(
        supervisor.stop(&JobKey::from(1)).unwrap(),
        StopOutcome::NotInProgress
    );
}

#[test]
fn test_stop_during_start_cancels() {
    let temp = TempDir::new().unwrap();
    let supervisor = supervisor(temp.path(), "true");
    let locks = LockStore::new(temp.path());
    let key = JobKey::from(1);
    assert!(matches!(
        locks.acquire(&key).unwrap(),
        AcquireOutcome::Acquired(_)
    ));

    assert_eq!(supervisor.stop(&key).unwrap(), StopOutcome::StartCancelled);
    assert_eq!(locks.read(&key).unwrap(), LockState::Absent);
}

#[test]
fn test_stop_cleans_up_dead_worker() {
    let temp = TempDir::new().unwrap();
    let supervisor = supervisor(temp.path(), "true");
    let key = JobKey::from(1);
    let locks = LockStore::new(temp.path());
    fs::write(locks.lock_path(&key), format!("{}\n", dead_pid())).unwrap();

    assert_eq!(supervisor.stop(&key).unwrap(), StopOutcome::CleanedUp);
    assert_eq!(locks.read(&key).unwrap(), LockState::Absent);
}

#[test]
fn test_stop_cleans_up_garbage_lock() {
    let temp = TempDir::new().unwrap();
    let supervisor = supervisor(temp.path(), "true");
    let key = JobKey::from(1);
    let locks = LockStore::new(temp.path());
    fs::write(locks.lock_path(&key), "not a pid").unwrap();

    assert_eq!(supervisor.stop(&key).unwrap(), StopOutcome::CleanedUp);
    assert_eq!(locks.read(&key).unwrap(), LockState::Absent);
}

#[test]
fn test_stop_terminates_descendants() {
    let temp = TempDir::new().unwrap();
    let pid_file = temp.path().join("grandchild.pid");
    let script = format!("sleep 30 & echo $! > {} ; wait", pid_file.display());
    let supervisor = supervisor(temp.path(), &script);
    let tileset = wms_tileset(1, "boston");

    assert_eq!(supervisor.seed(&tileset).unwrap(), SeedOutcome::Started);
    assert!(wait_for(|| fs::read_to_string(&pid_file)
        .map(|s| s.trim().parse::<u32>().is_ok())
        .unwrap_or(false)));
    let grandchild: u32 = fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(is_alive(grandchild));

    assert_eq!(supervisor.stop(&tileset.id).unwrap(), StopOutcome::Stopped);

    assert!(wait_for(|| !is_alive(grandchild)));
}

fn claim(locks: &LockStore, key: &JobKey) -> LockHandle {
    match locks.acquire(key).unwrap() {
        AcquireOutcome::Acquired(handle) => handle,
        AcquireOutcome::AlreadyLocked => panic!("lock should be free"),
    }
}

fn launch_script(root: &Path, script: &str) -> LaunchedWorker {
    let log = fs::File::create(root.join("worker.log")).unwrap();
    WorkerLauncher::new("sh", vec!["-c".to_string(), script.to_string()])
        .launch("{}", log.try_clone().unwrap(), log)
        .unwrap()
}

#[test]
fn test_worker_that_finished_before_handover_counts_as_started() {
    let temp = TempDir::new().unwrap();
    let supervisor = supervisor(temp.path(), "true");
    let locks = LockStore::new(temp.path());
    let key = JobKey::from(1);
    let handle = claim(&locks, &key);
    let script = format!("rm -f '{}'", locks.lock_path(&key).display());

    let mut worker = launch_script(temp.path(), &script);
    let deadline = Instant::now() + Duration::from_secs(5);
    while !worker.has_exited().unwrap() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(
        supervisor.hand_over(&handle, &mut worker).unwrap(),
        SeedOutcome::Started
    );
    assert_eq!(locks.read(&key).unwrap(), LockState::Absent);
}

#[test]
fn test_running_worker_without_lock_is_cancelled_and_terminated() {
    let temp = TempDir::new().unwrap();
    let supervisor = supervisor(temp.path(), "true");
    let locks = LockStore::new(temp.path());
    let key = JobKey::from(1);
    let handle = claim(&locks, &key);
    assert_eq!(supervisor.stop(&key).unwrap(), StopOutcome::StartCancelled);

    let mut worker = launch_script(temp.path(), "sleep 30");
    let pid = worker.pid();

    assert_eq!(
        supervisor.hand_over(&handle, &mut worker).unwrap(),
        SeedOutcome::Cancelled
    );
    assert!(wait_for(|| !is_alive(pid)));
    assert_eq!(locks.read(&key).unwrap(), LockState::Absent);
}

#[test]
fn test_fast_workers_are_always_started() {
    let temp = TempDir::new().unwrap();
    let locks = LockStore::new(temp.path());
    let tileset = wms_tileset(1, "boston");
    let lock = locks.lock_path(&tileset.id);
    // Waits for its own pid in the lock like a real worker, then finishes.
    let script = format!(
        "i=0; while [ \"$(cat '{lock}' 2>/dev/null)\" != \"$$\" ] && [ $i -lt 500 ]; \
         do i=$((i+1)); sleep 0.01; done; rm -f '{lock}'",
        lock = lock.display()
    );
    let supervisor = supervisor(temp.path(), &script);

    for _ in 0..20 {
        assert_eq!(supervisor.seed(&tileset).unwrap(), SeedOutcome::Started);
        assert!(wait_for(|| locks.read(&tileset.id).unwrap() == LockState::Absent));
    }
}

struct WriteEngine(&'static str);

impl SeedEngine for WriteEngine {
    fn seed(&self, spec: &JobSpec) -> Result<(), WorkerError> {
        fs::write(spec.output(), self.0).map_err(|source| WorkerError::Promote {
            path: spec.output().clone(),
            source,
        })
    }
}

struct FailingEngine;

impl SeedEngine for FailingEngine {
    fn seed(&self, spec: &JobSpec) -> Result<(), WorkerError> {
        fs::write(spec.output(), "partial").unwrap();
        Err(WorkerError::EngineFailed {
            program: "fake".to_string(),
            status: ExitStatus::from_raw(1 << 8),
        })
    }
}

fn claimed_spec(root: &Path) -> JobSpec {
    let tileset = wms_tileset(1, "boston");
    let registry_record = serde_json::to_string(&tileset).unwrap();
    fs::write(root.join("1.json"), registry_record).unwrap();
    let locks = LockStore::new(root);
    match locks.acquire(&tileset.id).unwrap() {
        AcquireOutcome::Acquired(handle) => locks.set_owner(&handle, std::process::id()).unwrap(),
        AcquireOutcome::AlreadyLocked => panic!("lock should be free"),
    }
    JobSpecBuilder::new(root, "tms").build(&tileset).unwrap()
}

#[test]
fn test_worker_promotes_artifact_and_releases_lock() {
    let temp = TempDir::new().unwrap();
    let spec = claimed_spec(temp.path());
    fs::write(&spec.paths.artifact, "previous").unwrap();
    let registry = JsonRegistry::new(temp.path());

    let metadata = run_worker(&spec, &WriteEngine("fresh tiles"), Some(&registry)).unwrap();

    assert_eq!(fs::read_to_string(&spec.paths.artifact).unwrap(), "fresh tiles");
    assert!(!spec.paths.generating.exists());
    let backups = backups_of(temp.path(), "boston.gpkg");
    assert_eq!(backups.len(), 1);
    assert_eq!(
        fs::read_to_string(temp.path().join(&backups[0])).unwrap(),
        "previous"
    );
    assert_eq!(
        LockStore::new(temp.path()).read(&spec.key).unwrap(),
        LockState::Absent
    );
    assert_eq!(metadata.size, "fresh tiles".len() as u64);
    assert_eq!(
        registry.load(&spec.key).unwrap().filesize,
        Some(metadata.size)
    );
}

#[test]
fn test_worker_failure_keeps_partial_output() {
    let temp = TempDir::new().unwrap();
    let spec = claimed_spec(temp.path());
    fs::write(&spec.paths.artifact, "previous").unwrap();

    let result = run_worker(&spec, &FailingEngine, None);

    assert!(matches!(result, Err(WorkerError::EngineFailed { .. })));
    assert_eq!(fs::read_to_string(&spec.paths.artifact).unwrap(), "previous");
    assert!(spec.paths.generating.exists());
    assert!(backups_of(temp.path(), "boston.gpkg").is_empty());
    assert_eq!(
        LockStore::new(temp.path()).read(&spec.key).unwrap(),
        LockState::Absent
    );
}

#[test]
fn test_worker_survives_registry_failure() {
    let temp = TempDir::new().unwrap();
    let spec = claimed_spec(temp.path());
    let registry = JsonRegistry::new(temp.path().join("no-registry"));

    let result = run_worker(&spec, &WriteEngine("tiles"), Some(&registry));

    assert!(result.is_ok());
    assert!(spec.paths.artifact.exists());
}

#[test]
fn test_worker_without_lock_does_not_run() {
    let temp = TempDir::new().unwrap();
    let spec = claimed_spec(temp.path());
    LockStore::new(temp.path()).release(&spec.key).unwrap();

    let result = run_worker(&spec, &WriteEngine("tiles"), None);

    assert!(matches!(result, Err(WorkerError::Cancelled(_))));
    assert!(!spec.paths.generating.exists());
    assert!(!spec.paths.artifact.exists());
}

struct ReclaimingEngine;

impl SeedEngine for ReclaimingEngine {
    fn seed(&self, spec: &JobSpec) -> Result<(), WorkerError> {
        // The job is stopped and claimed again while this run finishes.
        fs::write(&spec.paths.lock, "preparing_to_start\n").unwrap();
        fs::write(spec.output(), "tiles").unwrap();
        Ok(())
    }
}

#[test]
fn test_worker_leaves_lock_it_no_longer_owns() {
    let temp = TempDir::new().unwrap();
    let spec = claimed_spec(temp.path());

    run_worker(&spec, &ReclaimingEngine, None).unwrap();

    assert_eq!(
        LockStore::new(temp.path()).read(&spec.key).unwrap(),
        LockState::Sentinel
    );
}

#[test]
fn test_finalize_without_output_fails() {
    let temp = TempDir::new().unwrap();
    let paths = JobPaths::new(
        temp.path(),
        &JobKey::from(1),
        "boston",
        crate::tileset::CacheKind::Gpkg,
    );

    let result = finalize_artifact(&paths);
    assert!(matches!(result, Err(WorkerError::MissingOutput(_))));
}

#[test]
fn test_finalize_first_artifact_has_no_backup() {
    let temp = TempDir::new().unwrap();
    let paths = JobPaths::new(
        temp.path(),
        &JobKey::from(1),
        "boston",
        crate::tileset::CacheKind::File,
    );
    fs::create_dir_all(paths.generating.join("00")).unwrap();

    let backup = finalize_artifact(&paths).unwrap();

    assert!(backup.is_none());
    assert!(paths.artifact.join("00").is_dir());
    let meta = ArtifactMetadata::stat(&paths.artifact).unwrap();
    assert!(meta.is_some());
}

#[test]
fn test_command_engine_receives_output_location() {
    let temp = TempDir::new().unwrap();
    let spec = claimed_spec(temp.path());
    let engine = CommandEngine::new(
        "sh",
        vec![
            "-c".to_string(),
            "printf '%s' \"$TILESEED_JOB\" > \"$TILESEED_OUTPUT\"".to_string(),
        ],
    );

    engine.seed(&spec).unwrap();

    let written: JobSpec =
        serde_json::from_str(&fs::read_to_string(spec.output()).unwrap()).unwrap();
    assert_eq!(written, spec);
}

#[test]
fn test_command_engine_failure_status() {
    let temp = TempDir::new().unwrap();
    let spec = claimed_spec(temp.path());
    let engine = CommandEngine::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);

    let result = engine.seed(&spec);
    assert!(matches!(result, Err(WorkerError::EngineFailed { .. })));
}
