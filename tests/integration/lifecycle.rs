//! Integration tests for the controller lifecycle against real processes.

#[path = "common/mod.rs"]
mod common;

use std::process::Command;

use daemong::{
    config::DaemonConfig,
    daemon::{Daemon, Service},
    error::DaemonError,
    pidfile::PidFile,
    probe,
};
use tempfile::tempdir;

/// Lifecycle tests never reach the workload; detachment would tear down the
/// test process itself.
struct MustNotRun;

impl Service for MustNotRun {
    fn run(&mut self) {
        panic!("workload must not run in lifecycle tests");
    }
}

/// Spawns and fully reaps a short-lived process, yielding a pid that is
/// known to be dead.
fn dead_pid() -> u32 {
    let mut child = Command::new("true").spawn().expect("failed to spawn");
    let pid = child.id();
    child.wait().expect("failed to reap");
    pid
}

#[test]
fn stop_without_pidfile_leaves_filesystem_untouched() {
    let temp = tempdir().expect("failed to create tempdir");
    let config = DaemonConfig::new(temp.path().join("d.pid"));
    let daemon = Daemon::new(config.clone(), MustNotRun);

    match daemon.stop() {
        Err(DaemonError::NotRunning { pid_file }) => {
            assert_eq!(pid_file, config.pid_file);
        }
        other => panic!("expected NotRunning, got {other:?}"),
    }
    assert_eq!(
        std::fs::read_dir(temp.path())
            .expect("failed to list tempdir")
            .count(),
        0,
        "a refused stop must not create or remove files"
    );
}

#[test]
fn stop_with_stale_pidfile_succeeds_without_attempts() {
    let temp = tempdir().expect("failed to create tempdir");
    let mut config = DaemonConfig::new(temp.path().join("d.pid"));
    config.stop_poll_ms = 10;

    let stale = dead_pid();
    common::wait_until_dead(stale);
    PidFile::new(&config.pid_file)
        .write(stale)
        .expect("failed to record stale pid");

    let daemon = Daemon::new(config.clone(), MustNotRun);
    let attempts = daemon.stop().expect("stop of a stale pidfile failed");

    // The recorded process was already gone: the loop never runs and the
    // final unconditional SIGTERM is absorbed as "already terminated".
    assert_eq!(attempts, 0);
    assert!(!config.pid_file.exists());
}

#[test]
fn start_refuses_even_when_recorded_pid_is_dead() {
    let temp = tempdir().expect("failed to create tempdir");
    let config = DaemonConfig::new(temp.path().join("d.pid"));

    let stale = dead_pid();
    common::wait_until_dead(stale);
    PidFile::new(&config.pid_file)
        .write(stale)
        .expect("failed to record stale pid");

    let mut daemon = Daemon::new(config.clone(), MustNotRun);
    match daemon.start() {
        Err(DaemonError::AlreadyRunning { pid, .. }) => assert_eq!(pid, stale),
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }
    assert!(
        config.pid_file.exists(),
        "the stale record is the operator's to clear"
    );
}

#[test]
fn stop_terminates_live_process_within_a_few_intervals() {
    let temp = tempdir().expect("failed to create tempdir");
    let mut config = DaemonConfig::new(temp.path().join("d.pid"));
    config.stop_poll_ms = 50;

    let mut child = Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("failed to spawn sleep");
    let pid = child.id();
    // Reap concurrently so the probe observes the child vanish rather than
    // linger as a zombie of the test process.
    let reaper = std::thread::spawn(move || child.wait());

    PidFile::new(&config.pid_file)
        .write(pid)
        .expect("failed to record pid");
    let daemon = Daemon::new(config.clone(), MustNotRun);

    let attempts = daemon.stop().expect("stop failed");
    assert!(attempts >= 1);
    assert!(!config.pid_file.exists());

    let status = reaper
        .join()
        .expect("reaper panicked")
        .expect("failed to wait for child");
    assert!(!status.success(), "child should have died from SIGTERM");
    assert!(!probe::is_alive(pid));
}
