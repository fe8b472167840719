use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `tenure` isolated from any user or project configuration
fn tenure(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tenure").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("RUST_LOG")
        .env_remove("TENURE_LOCK__NAME")
        .env_remove("TENURE_LOCK__TIMEOUT_MS")
        .env_remove("TENURE_LOCK__DIRECTORY")
        .env_remove("TENURE_ELECTION__POLL_INTERVAL_MS");
    cmd
}

#[test]
fn test_status_reports_vacant_lock() {
    let home = TempDir::new().unwrap();
    let locks = TempDir::new().unwrap();

    tenure(&home)
        .arg("--lock-dir")
        .arg(locks.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("services/leader"))
        .stdout(predicate::str::contains("vacant"));
}

#[test]
fn test_status_json() {
    let home = TempDir::new().unwrap();
    let locks = TempDir::new().unwrap();

    let output = tenure(&home)
        .args(["status", "--json", "--lock-name", "jobs/cron"])
        .arg("--lock-dir")
        .arg(locks.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["lock"], "jobs/cron");
    assert_eq!(report["state"], "vacant");
    assert_eq!(report["timeout_ms"], 10_000);
}

#[test]
fn test_status_reads_project_config() {
    let home = TempDir::new().unwrap();
    let locks = TempDir::new().unwrap();
    let config_dir = home.path().join(".tenure");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("tenure.toml"),
        format!(
            "[lock]\nname = \"from/config\"\ndirectory = {:?}\n",
            locks.path().display().to_string()
        ),
    )
    .unwrap();

    tenure(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("from/config"));
}

#[test]
fn test_invalid_timing_exits_with_error() {
    let home = TempDir::new().unwrap();

    tenure(&home)
        .args(["--timeout-ms", "1000", "--poll-interval-ms", "1000", "status"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("poll_interval_ms"));
}

#[test]
fn test_missing_config_file_exits_with_error() {
    let home = TempDir::new().unwrap();

    tenure(&home)
        .args(["--config", "does-not-exist.toml", "status"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_log_level_flag_reaches_logging_setup() {
    let home = TempDir::new().unwrap();
    let locks = TempDir::new().unwrap();

    tenure(&home)
        .args(["--log-level", "tenure=verbose", "status"])
        .arg("--lock-dir")
        .arg(locks.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid log level 'tenure=verbose'"));

    tenure(&home)
        .args(["--log-level", "debug", "status"])
        .arg("--lock-dir")
        .arg(locks.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("vacant"));
}
