//! Integration tests for the `bext` CLI.
//!
//! Each test creates a temp note tree, runs `bext` as a subprocess,
//! and verifies stdout and/or file contents.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Get the path to the built `bext` binary.
fn bext_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("bext");
    path
}

/// Lay out a small note tree under `<root>/notes`.
fn create_test_notes(root: &Path) -> PathBuf {
    let notes = root.join("notes");
    fs::create_dir_all(notes.join("projects")).unwrap();
    let files = [
        ("20250615.md", "Sunday. See [[plan]] and [[projects/alpha|Alpha]]."),
        ("20250616.md", "Monday"),
        ("202506.md", "June"),
        ("index.md", "Home"),
        ("card01.md", "one"),
        ("card02.md", "two"),
        ("card03.md", "three"),
        ("topic.md", "parent"),
        ("projects/alpha.md", "alpha"),
    ];
    for (name, body) in files {
        fs::write(notes.join(name), body).unwrap();
    }
    notes
}

fn command(root: &Path, dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(bext_bin());
    cmd.args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", root.join("config"))
        .env("XDG_DATA_HOME", root.join("data"))
        .env_remove("BEXT_LOG");
    cmd
}

/// Run `bext` with the given args in `dir`, returning (stdout, stderr, success).
fn run_bext(root: &Path, dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = command(root, dir, args)
        .output()
        .expect("failed to run bext");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `bext` expecting success, return stdout.
fn run_bext_ok(root: &Path, dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_bext(root, dir, args);
    if !success {
        panic!(
            "bext {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `bext` feeding `input` on stdin.
fn run_bext_with_input(root: &Path, dir: &Path, args: &[&str], input: &str) -> (String, String) {
    let mut child = command(root, dir, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run bext");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "bext {:?} failed", args);
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

// ---------------------------------------------------------------------------
// Resolve (no side effects)
// ---------------------------------------------------------------------------

#[test]
fn test_resolve_day_shift() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["resolve", "20250615.md", "shift", "1"]);
    assert!(out.trim().ends_with("20250616.md"));
    assert!(!out.contains("missing"));
}

#[test]
fn test_resolve_missing_is_reported_not_created() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["resolve", "20250616.md", "shift", "1"]);
    assert!(out.contains("20250617.md (missing)"));
    assert!(!notes.join("20250617.md").exists());
}

#[test]
fn test_resolve_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(
        tmp.path(),
        &notes,
        &["resolve", "card01.md", "insert", "1", "--json"],
    );
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(parsed["path"].as_str().unwrap().ends_with("card02.md"));
    assert_eq!(parsed["exists"], false);
    assert_eq!(parsed["insert"]["prefix"], "card");
    assert_eq!(parsed["insert"]["index"], 2);
    assert_eq!(parsed["insert"]["width"], 2);
}

#[test]
fn test_resolve_unrecognized_name() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["resolve", "topic.md", "seq", "1", "--json"]);
    assert_eq!(out.trim(), "null");
}

#[test]
fn test_resolve_requires_step() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let (_stdout, stderr, success) = run_bext(tmp.path(), &notes, &["resolve", "card01.md", "seq"]);
    assert!(!success);
    assert!(stderr.contains("missing step count"));
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[test]
fn test_shift_existing() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["shift", "20250616.md", "-1"]);
    assert!(out.trim().ends_with("20250615.md"));
}

#[test]
fn test_up_to_month_note() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["up", "20250615.md", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["outcome"], "loaded");
    assert!(parsed["path"].as_str().unwrap().ends_with("202506.md"));
}

#[test]
fn test_link_into_subdirectory() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["link", "20250615.md", "alpha"]);
    assert!(out.trim().ends_with("projects/alpha.md"));
}

#[test]
fn test_link_at_offset() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    // Offset 27 falls inside [[projects/alpha|Alpha]]
    let out = run_bext_ok(tmp.path(), &notes, &["link", "20250615.md", "--at", "27"]);
    assert!(out.trim().ends_with("projects/alpha.md"));

    let (_stdout, stderr, success) =
        run_bext(tmp.path(), &notes, &["link", "20250615.md", "--at", "3"]);
    assert!(!success);
    assert!(stderr.contains("no link at offset 3"));
}

#[test]
fn test_missing_target_declined_without_input() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let (stdout, stderr, success) = run_bext(tmp.path(), &notes, &["down", "topic.md"]);
    assert!(success);
    assert!(stderr.contains("Create _topic.md? [y/N]"));
    assert!(stdout.contains("aborted"));
    assert!(!notes.join("_topic.md").exists());
}

#[test]
fn test_missing_target_created_on_yes() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let (stdout, _stderr) = run_bext_with_input(tmp.path(), &notes, &["down", "topic.md"], "y\n");
    assert!(stdout.trim().ends_with("_topic.md"));
    assert_eq!(fs::read_to_string(notes.join("_topic.md")).unwrap(), "");
}

#[test]
fn test_insert_renumbers() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["--yes", "insert", "card01.md", "1"]);
    assert!(out.trim().ends_with("card02.md"));
    assert_eq!(fs::read_to_string(notes.join("card02.md")).unwrap(), "");
    assert_eq!(fs::read_to_string(notes.join("card03.md")).unwrap(), "two");
    assert_eq!(fs::read_to_string(notes.join("card04.md")).unwrap(), "three");
    assert!(!notes.join(".bext.lock").exists());
}

#[test]
fn test_remove_closes_gap() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["--yes", "remove", "card02.md"]);
    assert!(out.trim().ends_with("card01.md"));
    assert_eq!(fs::read_to_string(notes.join("card02.md")).unwrap(), "three");
    assert!(!notes.join("card03.md").exists());
}

#[test]
fn test_open_missing_start_file_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let (_stdout, stderr, success) = run_bext(tmp.path(), &notes, &["up", "nope.md"]);
    assert!(!success);
    assert!(stderr.starts_with("error:"));
}

// ---------------------------------------------------------------------------
// Links and recent files
// ---------------------------------------------------------------------------

#[test]
fn test_links_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    let out = run_bext_ok(tmp.path(), &notes, &["links", "20250615.md", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let arr = parsed.as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["target"], "plan");
    assert_eq!(arr[1]["target"], "projects/alpha");
}

#[test]
fn test_recent_records_plain_notes_only() {
    let tmp = tempfile::TempDir::new().unwrap();
    let notes = create_test_notes(tmp.path());

    run_bext_ok(tmp.path(), &notes, &["shift", "20250615.md", "1"]);
    run_bext_ok(tmp.path(), &notes, &["up", "topic.md"]);

    let out = run_bext_ok(tmp.path(), &notes, &["recent", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let paths: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["filePath"].as_str().unwrap())
        .collect();
    // topic.md, then index.md it led to; the date notes are skipped
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("index.md"));
    assert!(paths[1].ends_with("topic.md"));

    run_bext_ok(tmp.path(), &notes, &["recent", "--clear"]);
    let out = run_bext_ok(tmp.path(), &notes, &["recent", "--json"]);
    assert_eq!(out.trim(), "[]");
}
