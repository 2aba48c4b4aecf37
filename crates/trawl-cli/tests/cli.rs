//! End-to-end runs of the `trawl` binary against a canned HTTP backend.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;

use pretty_assertions::assert_eq;
use serde_json::Value;

const LISTING: &str = r#"{"tasks":[
    {"id":"task_1","query":"restaurants in Manhattan","platforms":["google","myspace"],
     "status":"completed","max_results":50,"actual_results":2,
     "created_at":"2026-03-01T09:30:00Z","completed_at":"2026-03-01T09:41:00Z"},
    {"id":"task_2","query":"coffee shops Brooklyn","platforms":["instagram"],
     "status":"running","actual_results":0,"created_at":"2026-03-01T10:00:00Z"}
]}"#;

/// Serve `LISTING` to every request. Returns the base URL.
fn serve_listing() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{LISTING}",
                LISTING.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/api")
}

fn trawl(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_trawl"));
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("TRAWL_AUTH__TOKEN")
        .env("TRAWL_AUTH__CREDENTIALS_FILE", home.join("credentials"))
        .env_remove("TRAWL_LOG")
        .env_remove("TRAWL_API__BASE_URL");
    cmd
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "trawl failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn tasks_lists_backend_listing() {
    let home = tempfile::tempdir().expect("tempdir");
    let base_url = serve_listing();

    let output = trawl(home.path())
        .args(["tasks", "--base-url", &base_url])
        .output()
        .expect("run trawl");
    let tasks = json_stdout(&output);

    let tasks = tasks.as_array().expect("array");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["id"], "task_1");
    assert_eq!(tasks[0]["status"], "completed");
    assert_eq!(tasks[0]["platforms"], serde_json::json!(["google"]));
    assert_eq!(tasks[1]["max_results"], 25);
}

#[test]
fn tasks_filter_and_stats() {
    let home = tempfile::tempdir().expect("tempdir");
    let base_url = serve_listing();

    let output = trawl(home.path())
        .args(["tasks", "--status", "running", "--base-url", &base_url])
        .output()
        .expect("run trawl");
    let tasks = json_stdout(&output);
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));
    assert_eq!(tasks[0]["id"], "task_2");

    let output = trawl(home.path())
        .args(["tasks", "--stats", "--base-url", &base_url])
        .output()
        .expect("run trawl");
    let stats = json_stdout(&output);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["running"], 1);
}

#[test]
fn unknown_task_fails_with_message() {
    let home = tempfile::tempdir().expect("tempdir");
    let base_url = serve_listing();

    let output = trawl(home.path())
        .args(["status", "task_404", "--base-url", &base_url])
        .output()
        .expect("run trawl");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("trawl error: task task_404 not found"));
}

#[test]
fn blank_submission_is_rejected_before_any_request() {
    let home = tempfile::tempdir().expect("tempdir");

    // Nothing listens on port 9; a request would fail with a transport error.
    let output = trawl(home.path())
        .args(["submit", "   ", "-p", "google", "--base-url", "http://127.0.0.1:9/api"])
        .output()
        .expect("run trawl");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("trawl error:"));
    assert!(!stderr.contains("transport"), "unexpected request: {stderr}");
}

#[test]
fn login_status_logout_round_trip() {
    let home = tempfile::tempdir().expect("tempdir");
    let credentials = home.path().join("credentials");

    let mut child = trawl(home.path())
        .args(["auth", "login"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn trawl");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"tok_abc123\n")
        .expect("write token");
    let login = json_stdout(&child.wait_with_output().expect("wait"));
    assert_eq!(login["stored"], true);
    assert_eq!(
        std::fs::read_to_string(&credentials).expect("credentials").trim(),
        "tok_abc123"
    );

    let status = json_stdout(&trawl(home.path()).args(["auth", "status"]).output().expect("run"));
    assert_eq!(status["authenticated"], true);
    assert_eq!(status["token_source"], "credentials_file");

    let logout = json_stdout(&trawl(home.path()).args(["auth", "logout"]).output().expect("run"));
    assert_eq!(logout["logged_out"], true);
    assert!(!credentials.exists());

    let status = json_stdout(&trawl(home.path()).args(["auth", "status"]).output().expect("run"));
    assert_eq!(status["authenticated"], false);
}
