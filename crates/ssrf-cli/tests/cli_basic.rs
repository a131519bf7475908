//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify its JSON output.

use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_ssrf-cli"))
        .args(args)
        .env("SSRF_DATA_DIR", data_dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Run a CLI command that must succeed and parse its JSON output.
fn run_json(data_dir: &TempDir, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn add_unit(data_dir: &TempDir, id: &str, priority: &str) -> Value {
    run_json(data_dir, &["unit", "add", "--id", id, "--priority", priority])
}

#[test]
fn test_unit_add_and_show() {
    let dir = tempfile::tempdir().unwrap();

    let added = add_unit(&dir, "casa", "high");
    assert_eq!(added["id"], "casa");
    assert_eq!(added["priority"], "high");
    assert_eq!(added["collection"], "default");
    assert_eq!(added["status"], "learning");
    assert_eq!(added["num_reviews"], 1);
    assert_eq!(added["avg_grade"], 2.5);

    let shown = run_json(&dir, &["unit", "show", "casa"]);
    assert_eq!(shown, added);
}

#[test]
fn test_unit_add_generates_id() {
    let dir = tempfile::tempdir().unwrap();
    let added = run_json(&dir, &["unit", "add"]);
    assert_eq!(added["id"].as_str().unwrap().len(), 36);
    assert_eq!(added["priority"], "medium");
}

#[test]
fn test_unit_add_duplicate_fails() {
    let dir = tempfile::tempdir().unwrap();
    add_unit(&dir, "casa", "low");

    let (_, stderr, code) = run_cli(&dir, &["unit", "add", "--id", "casa"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"), "{stderr}");
}

#[test]
fn test_unit_list_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    add_unit(&dir, "a", "low");
    run_json(&dir, &["unit", "add", "--id", "b", "--collection", "kanji"]);

    assert_eq!(run_json(&dir, &["unit", "list"]).as_array().unwrap().len(), 2);
    let kanji = run_json(&dir, &["unit", "list", "--collection", "kanji"]);
    assert_eq!(kanji.as_array().unwrap().len(), 1);
    assert_eq!(kanji[0]["id"], "b");

    let (stdout, _, code) = run_cli(&dir, &["unit", "remove", "a"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("removed a"));
    assert_eq!(run_json(&dir, &["unit", "list"]).as_array().unwrap().len(), 1);

    let (_, stderr, code) = run_cli(&dir, &["unit", "remove", "a"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn test_review_schedules_next_day_for_grade_0() {
    let dir = tempfile::tempdir().unwrap();
    add_unit(&dir, "casa", "medium");

    let review = run_json(
        &dir,
        &["review", "casa", "--grade", "0", "--at", "2026-03-10T09:30:00Z"],
    );

    assert_eq!(review["rereview"], false);
    assert_eq!(review["interval_days"], 1);
    assert_eq!(review["next_review"], "2026-03-11T09:30:00Z");
    assert_eq!(review["state"]["num_reviews"], 2);
    assert_eq!(review["state"]["avg_grade"], 1.25);

    let shown = run_json(&dir, &["unit", "show", "casa"]);
    assert_eq!(shown["next_review"], "2026-03-11T09:30:00Z");
}

#[test]
fn test_review_within_24h_is_rereview() {
    let dir = tempfile::tempdir().unwrap();
    add_unit(&dir, "casa", "medium");
    run_json(
        &dir,
        &["review", "casa", "--grade", "5", "--at", "2026-03-10T09:30:00Z", "--estimated"],
    );

    let again = run_json(
        &dir,
        &["review", "casa", "--grade", "1", "--at", "2026-03-10T18:00:00Z"],
    );

    assert_eq!(again["rereview"], true);
    assert_eq!(again["interval_days"], Value::Null);
    assert_eq!(again["next_review"], "2026-03-18T09:30:00Z");
    assert_eq!(again["state"]["num_reviews"], 2);
}

#[test]
fn test_review_rejects_invalid_grade() {
    let dir = tempfile::tempdir().unwrap();
    add_unit(&dir, "casa", "medium");

    let (_, stderr, code) = run_cli(&dir, &["review", "casa", "--grade", "6"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("grade 6"), "{stderr}");

    let (_, _, code) = run_cli(&dir, &["review", "casa", "--grade=-1"]);
    assert_eq!(code, 1);
}

#[test]
fn test_preview_lists_every_grade() {
    let dir = tempfile::tempdir().unwrap();
    add_unit(&dir, "casa", "medium");

    let preview = run_json(&dir, &["preview", "casa", "--at", "2026-03-10"]);
    let days: Vec<u64> = preview
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["interval_days"].as_u64().unwrap())
        .collect();

    assert_eq!(days, vec![1, 1, 1, 2, 4, 8]);
    assert_eq!(preview[5]["next_review"], "2026-03-18T00:00:00Z");

    // Nothing persisted.
    assert_eq!(run_json(&dir, &["unit", "show", "casa"])["num_reviews"], 1);
}

#[test]
fn test_due_and_memorized_units() {
    let dir = tempfile::tempdir().unwrap();
    add_unit(&dir, "casa", "medium");
    add_unit(&dir, "perro", "medium");
    run_json(
        &dir,
        &["review", "casa", "--grade", "5", "--at", "2026-03-10T09:30:00Z", "--estimated"],
    );

    let due = run_json(&dir, &["unit", "due", "--at", "2026-03-12"]);
    assert_eq!(due.as_array().unwrap().len(), 1);
    assert_eq!(due[0]["id"], "perro");
    assert_eq!(run_json(&dir, &["unit", "due", "--at", "2026-03-19"]).as_array().unwrap().len(), 2);

    let status = run_json(&dir, &["unit", "status", "casa", "memorized"]);
    assert_eq!(status["status"], "memorized");

    let review = run_json(
        &dir,
        &["review", "casa", "--grade", "0", "--at", "2026-04-01T08:00:00Z"],
    );
    assert_eq!(review["next_review"], "2026-03-18T09:30:00Z");
    assert_eq!(review["state"]["num_reviews"], 2);

    let (_, stderr, code) = run_cli(&dir, &["unit", "status", "casa", "forgotten"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown status"), "{stderr}");
}

#[test]
fn test_load_reports_each_day() {
    let dir = tempfile::tempdir().unwrap();
    add_unit(&dir, "casa", "medium");
    run_json(
        &dir,
        &["review", "casa", "--grade", "0", "--at", "2026-03-10T09:30:00Z"],
    );

    let load = run_json(&dir, &["load", "--from", "2026-03-10", "--to", "2026-03-12"]);
    let days = load.as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["date"], "2026-03-10");
    assert_eq!(days[0]["workload"], 0);
    assert_eq!(days[1]["workload"], 1);
    assert_eq!(days[2]["workload"], 0);
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(&dir, &["config", "get", "scheduler.default_priority"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "medium");

    let (stdout, _, code) = run_cli(&dir, &["config", "set", "scheduler.default_priority", "low"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");
    assert_eq!(run_json(&dir, &["unit", "add"])["priority"], "low");

    let (stdout, _, code) = run_cli(&dir, &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("scheduler.default_priority = low"), "{stdout}");

    let (_, _, code) = run_cli(&dir, &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&dir, &["config", "get", "scheduler.default_priority"]);
    assert_eq!(stdout.trim(), "medium");
}

#[test]
fn test_config_rejects_bad_keys_and_values() {
    let dir = tempfile::tempdir().unwrap();

    let (_, stderr, code) = run_cli(&dir, &["config", "get", "scheduler.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"), "{stderr}");

    let (_, _, code) = run_cli(&dir, &["config", "set", "scheduler.initial_avg_grade", "9"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(&dir, &["config", "set", "scheduler.default_priority", "urgent"]);
    assert_eq!(code, 1);
    let (_, stderr, code) =
        run_cli(&dir, &["config", "set", "scheduler.rereview_window_hours", "10000000000"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("between 0 and 8760"), "{stderr}");
}
