//! End-to-end tests for the suspendify driver binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Write a config with a short wakeup linger so scripts finish quickly
fn setup(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("suspendify.yml");
    fs::write(
        &path,
        "coordinator:\n  wakeup-linger-ms: 100\n  poll-ceiling-ms: 200\n  backoff-floor-ms: 20\n",
    )
    .unwrap();
    path
}

fn suspendify(config: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("suspendify").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn test_config_prints_effective_settings() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir);

    suspendify(&config)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("wakeup-linger-ms: 100"))
        .stdout(predicate::str::contains("poll-ceiling-ms: 200"))
        .stdout(predicate::str::contains("driver:"));
}

#[test]
fn test_run_script_from_stdin() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir);

    suspendify(&config)
        .arg("run")
        .write_stdin("# park, then come back\nsuspend\nsettle\nstatus\nresume\nsettle\nstatus\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("suspending..."))
        .stdout(predicate::str::contains("resuming..."))
        .stdout(predicate::str::contains(r#""actual":"suspended""#))
        .stdout(predicate::str::contains(r#""actual":"resumed""#));
}

#[test]
fn test_run_script_file_with_cancelled_suspend() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir);
    let script = dir.path().join("cancel.txt");
    fs::write(&script, "suspend 2000\nsleep 50\nresume\nsettle\nstatus\n").unwrap();

    suspendify(&config)
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("suspend cancelled"))
        .stdout(predicate::str::contains("suspending...").not())
        .stdout(predicate::str::contains(r#""actual":"resumed""#));
}

#[test]
fn test_run_with_oracle_polls() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir);

    suspendify(&config)
        .args(["run", "--poll-ms", "100"])
        .write_stdin("suspend 300\nsettle\nstatus\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("poll "))
        .stdout(predicate::str::contains("suspending..."));
}

#[test]
fn test_run_rejects_bad_script_line() {
    let dir = TempDir::new().unwrap();
    let config = setup(&dir);

    suspendify(&config)
        .arg("run")
        .write_stdin("resume\nsuspend later\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yml");
    fs::write(&path, "coordinator:\n  poll-ceiling-ms: 10\n  backoff-floor-ms: 50\n").unwrap();

    suspendify(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}
