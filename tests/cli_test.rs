use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_rejects_non_http_url() {
    let mut cmd = Command::cargo_bin("sitelint").unwrap();
    cmd.arg("ftp://example.com")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "URL must start with http:// or https://",
        ));
}

#[test]
fn test_requires_url_argument() {
    let mut cmd = Command::cargo_bin("sitelint").unwrap();
    cmd.assert().failure();
}

#[test]
fn test_help_mentions_flags() {
    let mut cmd = Command::cargo_bin("sitelint").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--skip-links"))
        .stdout(predicate::str::contains("--workers"));
}
