//! Integration test: the `focalkit` binary end to end.

use std::process::Command;

fn focalkit() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_focalkit"));
    for key in [
        "FOCALKIT_EXIT_POLICY",
        "FOCALKIT_CATCH_CRASHES",
        "FOCALKIT_ECHO",
        "FOCALKIT_LOG",
        "FOCALKIT_RUN_ID",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn run_writes_log_report_and_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = dir.path().join("run.jsonl");
    let report = dir.path().join("report.json");
    let index = dir.path().join("index.json");

    let output = focalkit()
        .args(["run", "--suite", "json_tree", "--suite", "int_array"])
        .arg("--log")
        .arg(&log)
        .arg("--report")
        .arg(&report)
        .args(["--format", "json", "--run-id", "cli"])
        .arg("--artifact-index")
        .arg(&index)
        .output()
        .expect("focalkit run should execute");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[PASS] json_tree::delete_counts"), "{stdout}");
    assert!(stdout.contains("TEST SUMMARY:"), "{stdout}");

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(report["exit_code"].as_i64(), Some(0));
    assert_eq!(report["summary"]["failed_cases"].as_u64(), Some(0));

    let index: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&index).expect("index")).expect("json");
    assert_eq!(index["artifacts"].as_array().map(Vec::len), Some(2));

    let validated = focalkit()
        .arg("validate-log")
        .arg("--log")
        .arg(&log)
        .output()
        .expect("focalkit validate-log should execute");
    assert!(validated.status.success(), "{}", String::from_utf8_lossy(&validated.stderr));
    assert!(String::from_utf8_lossy(&validated.stdout).contains("0 errors"));
}

#[test]
fn unknown_suite_exits_with_usage_error() {
    let output = focalkit()
        .args(["run", "--suite", "missing"])
        .output()
        .expect("focalkit run should execute");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown suite 'missing'"));
}

#[test]
fn list_json_names_every_suite() {
    let output = focalkit()
        .args(["list", "--json"])
        .output()
        .expect("focalkit list should execute");
    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let names: Vec<_> = listing
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|s| s["suite"].as_str())
        .collect();
    assert!(names.contains(&"btree_cache_size"));
    assert!(names.contains(&"output_spy"));
}

#[test]
fn expected_assertion_crash_stays_off_stderr() {
    let output = focalkit()
        .args(["run", "--suite", "btree_cache_size"])
        .output()
        .expect("focalkit run should execute");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked"), "{stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("[PASS] btree_cache_size::mutex_not_held"));
}

#[test]
fn dash_log_streams_jsonl_to_stderr() {
    let output = focalkit()
        .args(["run", "--suite", "output_spy", "--log", "-", "--run-id", "err"])
        .output()
        .expect("focalkit run should execute");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .map(|line| serde_json::from_str(line).expect("jsonl line"))
        .collect();
    assert_eq!(events.first().and_then(|e| e["event"].as_str()), Some("run_start"));
    assert_eq!(events.last().and_then(|e| e["event"].as_str()), Some("run_summary"));
    assert!(!std::path::Path::new("-").exists());
}
