//! Daemon-level tests: startup failures and signal-driven shutdown.

use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

const BIN: &str = env!("CARGO_BIN_EXE_webmond");

fn webmond(dir: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .current_dir(dir)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn missing_port_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let out = webmond(dir.path(), &[]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage"), "stderr: {stderr}");
}

#[test]
fn invalid_port_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = webmond(dir.path(), &["eighty"]);
    assert!(!out.status.success());
}

#[test]
fn missing_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let out = webmond(dir.path(), &["8080"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("webmon.json"), "stderr: {stderr}");
}

#[test]
fn config_without_waittime_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("webmon.json"),
        r#"{ "webmonconfig": { "http403": { "retrytimes": 1, "action": "restart" } } }"#,
    )
    .unwrap();
    let out = webmond(dir.path(), &["8080", "--", "sleep", "30"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("waittime"), "stderr: {stderr}");
    // Nothing was launched, so nothing was logged.
    assert!(!dir.path().join("webmon.log").exists());
}

#[test]
fn unlaunchable_service_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("webmon.json"), r#"{ "waittime": 100 }"#).unwrap();
    let out = webmond(dir.path(), &["8080", "--", "/nonexistent/service"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("/nonexistent/service"), "stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn sigterm_shuts_down_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("webmon.json"),
        r#"{ "waittime": 200, "error": { "retrytimes": 2, "action": "nothing" } }"#,
    )
    .unwrap();
    let port = unused_port().to_string();

    let mut child = Command::new(BIN)
        .current_dir(dir.path())
        .args([port.as_str(), "--", "sleep", "30"])
        .env("RUST_LOG", "warn")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let log_path = dir.path().join("webmon.log");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !std::fs::read_to_string(&log_path).is_ok_and(|s| s.contains("\"launched\"")) {
        assert!(Instant::now() < deadline, "daemon never launched the service");
        std::thread::sleep(Duration::from_millis(50));
    }

    // SAFETY: signalling a child we spawned.
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }

    let deadline = Instant::now() + Duration::from_secs(10);
    while child.try_wait().unwrap().is_none() {
        assert!(Instant::now() < deadline, "daemon did not exit after SIGTERM");
        std::thread::sleep(Duration::from_millis(50));
    }
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("webmon terminated."));

    let log = std::fs::read_to_string(&log_path).unwrap();
    let last: serde_json::Value = serde_json::from_str(log.lines().last().unwrap()).unwrap();
    assert_eq!(last["event"], "stopped");
}
