//! Runs the compiled server binary to check process-level behavior.

use std::process::Command;

fn storefront() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_storefront"));
    cmd.env_clear().env("LOG_FORMAT", "json");
    cmd
}

#[test]
fn missing_uri_exits_one_and_logs_to_stderr() {
    let output = storefront().output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Startup failed"), "stderr: {stderr}");
    assert!(stderr.contains("MONGO_URI is missing"), "stderr: {stderr}");
    assert!(output.stdout.is_empty(), "stdout should stay clean");
}

#[test]
fn malformed_uri_is_rejected_before_connecting() {
    let output = storefront().env("MONGO_URI", "postgres://nope").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("mongodb://"), "stderr: {stderr}");
}
