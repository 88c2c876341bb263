//! End-to-end tests driving the `dmon` binary through full daemon cycles.

#[path = "common/mod.rs"]
mod common;

use std::fs;

use assert_cmd::Command;
use common::DaemonGuard;
use daemong::probe;
use predicates::prelude::*;
use tempfile::tempdir;

fn dmon() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("dmon"))
}

#[test]
fn stop_without_pidfile_exits_with_error() {
    let temp = tempdir().expect("failed to create tempdir");
    let config = common::write_config(temp.path());

    dmon()
        .arg("stop")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn stop_with_corrupt_pidfile_exits_with_error_and_keeps_file() {
    let temp = tempdir().expect("failed to create tempdir");
    let config = common::write_config(temp.path());
    let pid_path = temp.path().join("d.pid");
    fs::write(&pid_path, "not-a-pid\n").expect("failed to seed pidfile");

    dmon()
        .arg("stop")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unparseable"));

    assert!(pid_path.exists(), "corrupt pidfile must be left for inspection");
}

#[test]
fn start_stop_round_trip() {
    let temp = tempdir().expect("failed to create tempdir");
    let config = common::write_config(temp.path());
    let pid_path = temp.path().join("d.pid");

    dmon()
        .arg("start")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let pid = common::wait_for_pidfile(&pid_path);
    let mut guard = DaemonGuard::watching(pid);

    let record = fs::read_to_string(&pid_path).expect("failed to read pidfile");
    assert_eq!(record, format!("{pid}\n"), "exactly one newline-terminated pid");
    assert!(probe::is_alive(pid), "daemon should be running after start");

    dmon()
        .arg("stop")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    common::wait_for_pidfile_removed(&pid_path);
    common::wait_until_dead(pid);
    guard.disarm();

    // An immediate second stop finds nothing to do.
    dmon()
        .arg("stop")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn second_start_is_refused_while_pidfile_exists() {
    let temp = tempdir().expect("failed to create tempdir");
    let config = common::write_config(temp.path());
    let pid_path = temp.path().join("d.pid");

    dmon()
        .arg("start")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let pid = common::wait_for_pidfile(&pid_path);
    let mut guard = DaemonGuard::watching(pid);

    dmon()
        .arg("start")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    // The refused start must not have touched the running instance.
    assert!(probe::is_alive(pid));
    assert_eq!(common::wait_for_pidfile(&pid_path), pid);

    dmon()
        .arg("stop")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    common::wait_until_dead(pid);
    guard.disarm();
}

#[test]
fn restart_starts_even_when_stopped() {
    let temp = tempdir().expect("failed to create tempdir");
    let config = common::write_config(temp.path());
    let pid_path = temp.path().join("d.pid");

    dmon()
        .arg("restart")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let pid = common::wait_for_pidfile(&pid_path);
    let mut guard = DaemonGuard::watching(pid);
    assert!(probe::is_alive(pid));

    dmon()
        .arg("stop")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    common::wait_for_pidfile_removed(&pid_path);
    common::wait_until_dead(pid);
    guard.disarm();
}
