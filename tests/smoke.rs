//! Smoke tests -- verify the binary runs and key subcommands exist.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("bandwatch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Site-to-site throughput anomaly alarms",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("bandwatch")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("bandwatch"));
}

#[test]
fn test_run_subcommand_exists() {
    Command::cargo_bin("bandwatch")
        .unwrap()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicates::str::contains("--dry-run"));
}

#[test]
fn test_watch_subcommand_exists() {
    Command::cargo_bin("bandwatch")
        .unwrap()
        .args(["watch", "--help"])
        .assert()
        .success();
}

#[test]
fn test_show_config_prints_defaults() {
    Command::cargo_bin("bandwatch")
        .unwrap()
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicates::str::contains("ps_throughput"));
}
