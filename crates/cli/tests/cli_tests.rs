use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("smsguard").unwrap();
    cmd.arg("--help").assert().success().stdout(predicate::str::contains("SMS cost-guard"));
}

#[test]
fn test_cli_worker_help() {
    let mut cmd = Command::cargo_bin("smsguard").unwrap();
    cmd.arg("worker").arg("--help").assert().success();
}

#[test]
fn test_cli_migrate_help() {
    let mut cmd = Command::cargo_bin("smsguard").unwrap();
    cmd.arg("migrate").arg("--help").assert().success();
}

#[test]
fn test_cli_unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("smsguard").unwrap();
    cmd.arg("bogus").assert().failure();
}
