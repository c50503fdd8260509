//! CLI integration tests for lf-notify

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn lf_notify(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lf-notify").unwrap();
    cmd.env_clear()
        .current_dir(dir.path())
        .env("LIKEFOLLOW_LOG_LEVEL", "error");
    cmd
}

#[test]
fn test_help() {
    Command::cargo_bin("lf-notify")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Send a one-off Telegram message"))
        .stdout(predicate::str::contains("--chat-id"));
}

#[test]
fn test_missing_credentials_exit_2() {
    let temp_dir = TempDir::new().unwrap();

    lf_notify(&temp_dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Missing env vars: TELEGRAM_TOKEN, TELEGRAM_CHAT_ID",
        ));
}

#[test]
fn test_missing_chat_id_only() {
    let temp_dir = TempDir::new().unwrap();

    lf_notify(&temp_dir)
        .env("TELEGRAM_TOKEN", "123:abc")
        .arg("hello")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing env vars: TELEGRAM_CHAT_ID"))
        .stderr(predicate::str::contains("123:abc").not());
}

#[test]
fn test_credentials_from_dotenv() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(".env"), "TELEGRAM_TOKEN=123:abc\n").unwrap();

    lf_notify(&temp_dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing env vars: TELEGRAM_CHAT_ID"));
}

#[test]
fn test_delivery_failure_exit_1_without_leaking_token() {
    let temp_dir = TempDir::new().unwrap();

    lf_notify(&temp_dir)
        .args(["--token", "123:secret-token", "--chat-id", "-100"])
        .args(["--api-base", "http://127.0.0.1:9"])
        .arg("hello")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Notification request failed"))
        .stderr(predicate::str::contains("secret-token").not());
}
