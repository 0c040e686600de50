use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// A base URL nothing listens on.
fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Answer the first request with a JSON body and return its request line.
fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || loop {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        // Reachability probes connect and hang up without a request
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
            continue;
        }
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut body_bytes = vec![0; content_length];
        reader.read_exact(&mut body_bytes).unwrap();

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        break request_line;
    });

    (format!("http://{addr}"), handle)
}

fn savoir(home: &TempDir, base_url: &str) -> Command {
    let mut cmd = Command::cargo_bin("savoir-sync").unwrap();
    cmd.env("HOME", home.path())
        .env("SAVOIR_BASE_URL", base_url)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("SAVOIR_CSRF_TOKEN");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();

    savoir(&home, &closed_base_url())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offline action queue"));
}

#[test]
fn test_status_empty() {
    let home = TempDir::new().unwrap();

    let status = json_output(savoir(&home, &closed_base_url()).args(["status", "-o", "json"]));

    assert_eq!(status["pending"], 0);
    assert_eq!(status["slot"], "offlineQueue");
}

#[test]
fn test_submit_offline_is_queued_and_persisted() {
    let home = TempDir::new().unwrap();
    let base = closed_base_url();

    savoir(&home, &base)
        .args(["submit", "/quiz/submit/42/", "-f", "questionId=42", "-f", "answer=Paris"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued /quiz/submit/42/"))
        .stderr(predicate::str::contains(
            "Saved offline. Will sync when connection is restored.",
        ));

    let status = json_output(savoir(&home, &base).args(["status", "--output", "json"]));
    assert_eq!(status["pending"], 1);

    let list = json_output(savoir(&home, &base).args(["list", "-o", "json"]));
    assert_eq!(list["count"], 1);
    assert_eq!(list["items"][0]["type"], "form_submission");
    assert_eq!(list["items"][0]["url"], "/quiz/submit/42/");
    assert_eq!(list["items"][0]["data"]["answer"], "Paris");
}

#[test]
fn test_clear_requires_force() {
    let home = TempDir::new().unwrap();
    let base = closed_base_url();

    savoir(&home, &base)
        .args(["submit", "/progress/update/", "-f", "section=3"])
        .assert()
        .success();

    savoir(&home, &base)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    savoir(&home, &base)
        .args(["clear", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1 queued actions."));

    let status = json_output(savoir(&home, &base).args(["status", "-o", "json"]));
    assert_eq!(status["pending"], 0);
}

#[test]
fn test_flush_drops_undeliverable_actions() {
    let home = TempDir::new().unwrap();
    let base = closed_base_url();

    savoir(&home, &base)
        .args(["submit", "/quiz/submit/1/", "-f", "answer=A"])
        .assert()
        .success();

    let report = json_output(savoir(&home, &base).args(["flush", "-o", "json"]));
    assert_eq!(report["attempted"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["dropped"], 1);

    let status = json_output(savoir(&home, &base).args(["status", "-o", "json"]));
    assert_eq!(status["pending"], 0);
}

#[test]
fn test_flush_replays_to_live_endpoint() {
    let home = TempDir::new().unwrap();
    let base = closed_base_url();
    let (live, server) = serve_once(r#"{"success":true,"is_correct":true}"#);
    let target = format!("{live}/quiz/submit/7/");

    savoir(&home, &base)
        .args(["submit", &target, "-f", "answer=Paris"])
        .assert()
        .success();

    savoir(&home, &base)
        .arg("flush")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 delivered"))
        .stderr(predicate::str::contains("Synced 1 offline actions successfully!"));

    let request_line = server.join().unwrap();
    assert!(request_line.starts_with("POST /quiz/submit/7/ "));

    let status = json_output(savoir(&home, &base).args(["status", "-o", "json"]));
    assert_eq!(status["pending"], 0);
}

#[test]
fn test_submit_online_delivers_directly() {
    let home = TempDir::new().unwrap();
    let (live, server) = serve_once(r#"{"success":true}"#);
    let base = format!("{live}/");

    let result = json_output(savoir(&home, &base).args([
        "submit",
        "/progress/update/",
        "-f",
        "section=3",
        "-o",
        "json",
    ]));

    assert_eq!(result["status"], "delivered");
    assert_eq!(result["response"]["success"], true);
    assert!(server.join().unwrap().starts_with("POST /progress/update/ "));
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();

    savoir(&home, &closed_base_url())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("savoir-sync"));
}
