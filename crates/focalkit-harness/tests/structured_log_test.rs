//! Integration test: file-backed logs validate and index with digests.

use focalkit_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, sha256_hex, validate_log_file,
};
use focalkit_harness::{HarnessConfig, HarnessError, Runner, ScratchDir, Suite, TestContext, expect_eq};

fn ok_case(ctx: &mut TestContext<'_>) {
    expect_eq!(ctx, 2 * 2, 4);
}

#[test]
fn runner_log_file_validates_and_is_indexed() {
    let dir = ScratchDir::new("focalkit-log-").unwrap();
    let log_path = dir.file_path("run.jsonl");
    let config = HarnessConfig::quiet()
        .with_run_id("it-1")
        .with_log_path(&log_path);
    let mut runner = Runner::from_config(config).unwrap();
    runner.run(&[Suite::new("files", "noop").case("ok", "", ok_case)]);
    drop(runner);

    let (lines, errors) = validate_log_file(&log_path).unwrap();
    assert!(lines >= 7, "expected every phase logged, got {lines}");
    assert!(errors.is_empty(), "{errors:?}");

    let mut index = ArtifactIndex::new("it-1");
    index.add_file(&log_path, "log").unwrap();
    let bytes = std::fs::read(&log_path).unwrap();
    assert_eq!(index.artifacts[0].sha256, sha256_hex(&bytes));
}

#[test]
fn unwritable_log_path_is_a_typed_error() {
    let dir = ScratchDir::new("focalkit-missing-").unwrap();
    let path = dir.file_path("no/such/dir/run.jsonl");
    let err = LogEmitter::to_file(&path, "r").err().expect("log sink error");
    assert!(matches!(err, HarnessError::LogSink { .. }));
}

#[test]
fn handwritten_entries_fill_trace_ids() {
    let dir = ScratchDir::new("focalkit-entries-").unwrap();
    let path = dir.file_path("entries.jsonl");
    let mut emitter = LogEmitter::to_file(&path, "hand").unwrap();
    emitter
        .emit_entry(
            LogEntry::new("", LogLevel::Warn, "case_end")
                .with_case("spy", "create")
                .with_outcome(Outcome::Fail),
        )
        .unwrap();
    emitter.flush().unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"trace_id\":\"hand::spy::001\""));
    assert_eq!(validate_log_file(&path).unwrap().1.len(), 0);
}
