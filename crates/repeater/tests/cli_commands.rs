#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "repeater-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn repeater(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_repeater"));
    cmd.args(["--log-level", "error"])
        .args(args)
        .env_remove("REPEATER_ONE_SHOT")
        .env_remove("REPEATER_DEBUG")
        .env_remove("REPEATER_CAPACITY")
        .env_remove("REPEATER_MAX_RECORDS");
    cmd
}

fn run_shell(args: &[&str], script: &str) -> Output {
    let mut child = repeater(args)
        .args(["--format", "json", "shell"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("shell should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(script.as_bytes())
        .expect("script should be writable");
    child.wait_with_output().expect("shell should exit")
}

fn events(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("every stdout line should be json"))
        .collect()
}

fn framed(records: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for record in records {
        out.extend_from_slice(b"RP");
        out.extend_from_slice(&(record.len() as u32).to_le_bytes());
        out.extend_from_slice(record);
    }
    out
}

#[test]
fn shell_delivers_records_in_order() {
    let output = run_shell(
        &["--capacity", "16"],
        "open w\nopen r\nwrite 1 hello\nwrite 1 worldwide\nwrite 1 x\n\
         read 2\nread 2\nread 2\nread 2\nquit\n",
    );
    assert!(output.status.success());

    let events = events(&output);
    let payloads: Vec<_> = events
        .iter()
        .filter(|e| e["event"] == "delivered")
        .map(|e| (e["status"].as_str().unwrap(), e["payload"].as_str().unwrap()))
        .collect();
    assert_eq!(
        payloads,
        vec![
            ("record", "hello"),
            ("record", "worldwide"),
            ("record", "x"),
            ("empty", ""),
        ]
    );
}

#[test]
fn shell_reports_truncation_and_denied_open() {
    let output = run_shell(
        &[],
        "open rw\nopen w\nopen r\nwrite 1 0123456789\nwrite 1 next\nread 2 4\nread 2 4\n",
    );
    assert!(output.status.success());

    let events = events(&output);
    assert_eq!(events[0]["event"], "failed");
    assert_eq!(events[0]["code"], 50);

    let truncated = &events[5];
    assert_eq!(truncated["status"], "truncated");
    assert_eq!(truncated["payload"], "0123");
    assert_eq!(truncated["record_len"], 10);
    assert_eq!(events[6]["payload"], "next");
}

#[test]
fn shell_one_shot_handle_reads_once() {
    let output = run_shell(
        &["--one-shot"],
        "open w\nopen r\nwrite 1 first\nwrite 1 second\nread 2\nread 2\nstats\n",
    );
    let events = events(&output);

    assert_eq!(events[4]["payload"], "first");
    assert_eq!(events[5]["status"], "empty");
    assert_eq!(events[6]["event"], "stats");
    assert_eq!(events[6]["records"], 1);
}

#[test]
fn shell_reset_discards_pending_records() {
    let output = run_shell(&[], "open w\nopen r\nwrite 1 a\nwrite 1 b\nreset\nread 2\n");
    let events = events(&output);

    assert_eq!(events[4]["event"], "reset");
    assert_eq!(events[4]["discarded"], 2);
    assert_eq!(events[5]["status"], "empty");
}

#[test]
fn feed_raw_output_reframes_records() {
    let dir = unique_temp_dir("feed");
    let input = dir.join("records.bin");
    let records: [&[u8]; 3] = [b"alpha", b"beta", b"gamma"];
    std::fs::write(&input, framed(&records)).expect("input should be writable");

    let output = repeater(&["--format", "raw", "--max-records", "2"])
        .arg("feed")
        .arg(&input)
        .output()
        .expect("feed should run");

    assert!(output.status.success());
    assert_eq!(output.stdout, framed(&records));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn feed_rejects_corrupt_input() {
    let dir = unique_temp_dir("feed-bad");
    let input = dir.join("records.bin");
    std::fs::write(&input, b"XXXXXXXX").expect("input should be writable");

    let output = repeater(&["--format", "json"])
        .arg("feed")
        .arg(&input)
        .output()
        .expect("feed should run");

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid record magic"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn stress_reports_no_violations() {
    let output = repeater(&["--format", "json", "--capacity", "128", "--max-records", "16"])
        .args(["stress", "--writers", "3", "--readers", "2", "--records", "200"])
        .output()
        .expect("stress should run");

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("report should be json");
    assert_eq!(report["written"], 600);
    assert_eq!(report["delivered"], 600);
    assert_eq!(report["violations"], 0);
}

#[test]
fn version_prints_package_version() {
    let output = repeater(&["version"]).output().expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("repeater {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_reports_the_compiler() {
    let output = repeater(&["version", "--extended"])
        .output()
        .expect("version should run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rustc: rustc "), "{stdout}");
}
