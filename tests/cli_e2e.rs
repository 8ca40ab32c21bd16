//! Binary smoke tests for the coursedump CLI.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_shows_usage() {
    let mut cmd = Command::cargo_bin("coursedump").expect("binary builds");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Archive course files"))
        .stdout(predicate::str::contains("--base-url"));
}

#[test]
fn test_version_prints_version() {
    let mut cmd = Command::cargo_bin("coursedump").expect("binary builds");
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_base_url_is_a_usage_error() {
    let mut cmd = Command::cargo_bin("coursedump").expect("binary builds");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--base-url"));
}

#[test]
fn test_missing_cookie_file_fails_with_context() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("coursedump").expect("binary builds");
    cmd.current_dir(dir.path())
        .args(["--base-url", "https://school.example", "--cookies", "absent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn test_invalid_base_url_fails_with_context() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("cookies.json"), r#"{"session":"x"}"#)
        .expect("write cookie file");
    let mut cmd = Command::cargo_bin("coursedump").expect("binary builds");
    cmd.current_dir(dir.path())
        .args(["--base-url", "not a url", "--cookies", "cookies.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid base URL"));
}
