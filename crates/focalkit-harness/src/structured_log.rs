//! Structured JSONL logging for harness runs.
//!
//! Provides:
//! - [`LogEntry`]: one JSONL record with required + optional fields.
//! - [`LogEmitter`]: writes records to a file, a shared buffer, or stderr.
//! - [`ArtifactIndex`]: links a run's log and reports with SHA-256 digests.
//! - [`validate_log_line`] / [`validate_log_file`]: schema checks.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{HarnessError, Result};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// Case-level outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Crash,
    Error,
}

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "fatal"];
const OUTCOMES: [&str; 4] = ["pass", "fail", "crash", "error"];
const PHASES: [&str; 7] = [
    "start", "setup", "invoke", "assert", "teardown", "report", "terminal",
];

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case: Option<String>,
    /// Runner phase name (`start`, `setup`, `invoke`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertions_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertions_failed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            suite: None,
            case: None,
            phase: None,
            outcome: None,
            file: None,
            line: None,
            message: None,
            expected: None,
            actual: None,
            assertions_total: None,
            assertions_failed: None,
            duration_ms: None,
            exit_code: None,
            details: None,
        }
    }

    /// Set suite and case names.
    #[must_use]
    pub fn with_case(mut self, suite: impl Into<String>, case: impl Into<String>) -> Self {
        self.suite = Some(suite.into());
        self.case = Some(case.into());
        self
    }

    #[must_use]
    pub fn with_suite(mut self, suite: impl Into<String>) -> Self {
        self.suite = Some(suite.into());
        self
    }

    #[must_use]
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Set the source location of an assertion.
    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set expected/actual renderings (either may be absent).
    #[must_use]
    pub fn with_values(mut self, expected: Option<String>, actual: Option<String>) -> Self {
        self.expected = expected;
        self.actual = actual;
        self
    }

    /// Set assertion counters.
    #[must_use]
    pub fn with_assertions(mut self, total: u64, failed: u64) -> Self {
        self.assertions_total = Some(total);
        self.assertions_failed = Some(failed);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    /// Set free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Artifact index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub path: String,
    pub kind: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Artifact index linking a run's outputs to their digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub index_version: u32,
    pub run_id: String,
    pub generated_utc: String,
    pub artifacts: Vec<ArtifactEntry>,
}

impl ArtifactIndex {
    #[must_use]
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            index_version: 1,
            run_id: run_id.into(),
            generated_utc: now_utc(),
            artifacts: Vec::new(),
        }
    }

    /// Add an artifact with a precomputed digest.
    pub fn add(
        &mut self,
        path: impl Into<String>,
        kind: impl Into<String>,
        sha256: impl Into<String>,
    ) -> &mut Self {
        self.artifacts.push(ArtifactEntry {
            path: path.into(),
            kind: kind.into(),
            sha256: sha256.into(),
            size_bytes: None,
        });
        self
    }

    /// Hash an on-disk artifact and add it.
    pub fn add_file(&mut self, path: &Path, kind: impl Into<String>) -> Result<&mut Self> {
        let bytes = std::fs::read(path)?;
        self.artifacts.push(ArtifactEntry {
            path: path.display().to_string(),
            kind: kind.into(),
            sha256: sha256_hex(&bytes),
            size_bytes: Some(bytes.len() as u64),
        });
        Ok(self)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// In-memory sink that stays readable after the emitter takes ownership.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writes structured JSONL entries with sequential trace ids.
pub struct LogEmitter {
    writer: Box<dyn Write + Send>,
    seq: u64,
    run_id: String,
}

impl LogEmitter {
    /// Create an emitter that writes to a file (truncating it).
    pub fn to_file(path: &Path, run_id: &str) -> Result<Self> {
        let file = std::fs::File::create(path).map_err(|source| HarnessError::LogSink {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::to_writer(std::io::BufWriter::new(file), run_id))
    }

    /// Create an emitter over a shared in-memory buffer.
    #[must_use]
    pub fn to_shared(buffer: SharedBuffer, run_id: &str) -> Self {
        Self::to_writer(buffer, run_id)
    }

    #[must_use]
    pub fn to_stderr(run_id: &str) -> Self {
        Self::to_writer(std::io::stderr(), run_id)
    }

    #[must_use]
    pub fn to_writer(writer: impl Write + Send + 'static, run_id: &str) -> Self {
        Self {
            writer: Box::new(writer),
            seq: 0,
            run_id: run_id.to_string(),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Generate the next trace id for `scope` (usually the suite name).
    pub fn next_trace_id(&mut self, scope: &str) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.run_id, scope, self.seq)
    }

    /// Emit a bare entry with an auto-generated trace id.
    pub fn emit(&mut self, scope: &str, level: LogLevel, event: &str) -> Result<LogEntry> {
        let trace_id = self.next_trace_id(scope);
        let entry = LogEntry::new(trace_id, level, event);
        self.write_entry(&entry)?;
        Ok(entry)
    }

    /// Emit a populated entry; an empty trace id is filled in from `suite`.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> Result<()> {
        if entry.trace_id.is_empty() {
            let scope = entry.suite.clone().unwrap_or_else(|| "run".to_string());
            entry.trace_id = self.next_trace_id(&scope);
        }
        self.write_entry(&entry)
    }

    fn write_entry(&mut self, entry: &LogEntry) -> Result<()> {
        let line = entry.to_jsonl()?;
        writeln!(self.writer, "{line}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

fn check_enum(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &str,
    allowed: &[&str],
    line_number: usize,
    errors: &mut Vec<LogValidationError>,
) {
    if let Some(value) = obj.get(field).and_then(|v| v.as_str())
        && !allowed.contains(&value)
    {
        errors.push(LogValidationError {
            line_number,
            field: field.to_string(),
            message: format!("invalid {field}: '{value}'"),
        });
    }
}

/// Validate a single JSONL line against the schema.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> std::result::Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            errors.push(LogValidationError {
                line_number,
                field: "<json>".to_string(),
                message: format!("invalid JSON: {e}"),
            });
            return Err(errors);
        }
    };

    let Some(obj) = value.as_object() else {
        errors.push(LogValidationError {
            line_number,
            field: "<root>".to_string(),
            message: "expected JSON object".to_string(),
        });
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            errors.push(LogValidationError {
                line_number,
                field: field.to_string(),
                message: "required field missing".to_string(),
            });
        }
    }

    check_enum(obj, "level", &LEVELS, line_number, &mut errors);
    check_enum(obj, "outcome", &OUTCOMES, line_number, &mut errors);
    check_enum(obj, "phase", &PHASES, line_number, &mut errors);

    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str())
        && trace_id.split("::").count() < 3
    {
        errors.push(LogValidationError {
            line_number,
            field: "trace_id".to_string(),
            message: format!(
                "trace_id should follow <run_id>::<suite>::<seq> format, got: '{trace_id}'"
            ),
        });
    }

    // Assertion events carry their source location.
    if obj.get("event").and_then(|v| v.as_str()) == Some("assertion_failed")
        && (!obj.contains_key("file") || !obj.contains_key("line"))
    {
        errors.push(LogValidationError {
            line_number,
            field: "file".to_string(),
            message: "assertion_failed events must include file and line".to_string(),
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value::<LogEntry>(value).map_err(|e| {
        vec![LogValidationError {
            line_number,
            field: "<deserialization>".to_string(),
            message: format!("failed to deserialize: {e}"),
        }]
    })
}

/// Validate an entire JSONL file. Returns the non-empty line count and errors.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>)> {
    let content = std::fs::read_to_string(path)?;
    let mut all_errors = Vec::new();
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }

    Ok((line_count, all_errors))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Current UTC time as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[must_use]
pub fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format_utc(duration.as_secs(), duration.subsec_millis())
}

fn format_utc(secs: u64, millis: u32) -> String {
    let days = (secs / 86_400) as i64;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        millis,
    )
}

// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_serializes_required_fields() {
        let entry = LogEntry::new("run-1::json_tree::001", LogLevel::Info, "case_start");
        let json = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["timestamp"].is_string());
        assert_eq!(parsed["trace_id"], "run-1::json_tree::001");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "case_start");
        assert!(parsed.get("suite").is_none());
        assert!(parsed.get("outcome").is_none());
    }

    #[test]
    fn log_entry_with_optional_fields() {
        let entry = LogEntry::new("run-1::s::002", LogLevel::Error, "assertion_failed")
            .with_case("s", "c")
            .with_phase("invoke")
            .with_outcome(Outcome::Fail)
            .with_location("suite.rs", 12)
            .with_message("count == 4")
            .with_values(Some("4".into()), Some("3".into()))
            .with_assertions(5, 1)
            .with_duration_ms(2)
            .with_exit_code(1)
            .with_details(serde_json::json!({"note": "x"}));
        let parsed: serde_json::Value =
            serde_json::from_str(&entry.to_jsonl().unwrap()).unwrap();
        assert_eq!(parsed["suite"], "s");
        assert_eq!(parsed["case"], "c");
        assert_eq!(parsed["phase"], "invoke");
        assert_eq!(parsed["outcome"], "fail");
        assert_eq!(parsed["line"], 12);
        assert_eq!(parsed["expected"], "4");
        assert_eq!(parsed["assertions_failed"], 1);
        assert!(parsed["details"].is_object());
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let missing = r#"{"timestamp":"2026-01-01T00:00:00Z","level":"info","event":"x"}"#;
        let errors = validate_log_line(missing, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "trace_id"));

        let bad_level = r#"{"timestamp":"t","trace_id":"a::b::1","level":"loud","event":"x"}"#;
        let errors = validate_log_line(bad_level, 2).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "level"));

        let bad_phase =
            r#"{"timestamp":"t","trace_id":"a::b::1","level":"info","event":"x","phase":"warmup"}"#;
        let errors = validate_log_line(bad_phase, 3).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "phase"));

        let short_trace = r#"{"timestamp":"t","trace_id":"a::b","level":"info","event":"x"}"#;
        let errors = validate_log_line(short_trace, 4).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "trace_id"));

        assert!(validate_log_line("not json", 5).is_err());
    }

    #[test]
    fn assertion_events_need_a_location() {
        let line = r#"{"timestamp":"t","trace_id":"a::b::1","level":"error","event":"assertion_failed"}"#;
        let errors = validate_log_line(line, 1).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "file"));
    }

    #[test]
    fn emitter_generates_sequential_trace_ids() {
        let buffer = SharedBuffer::new();
        let mut emitter = LogEmitter::to_shared(buffer.clone(), "run-42");
        let e1 = emitter.emit("json_tree", LogLevel::Info, "start").unwrap();
        let e2 = emitter.emit("int_array", LogLevel::Info, "end").unwrap();
        assert_eq!(e1.trace_id, "run-42::json_tree::001");
        assert_eq!(e2.trace_id, "run-42::int_array::002");
        assert_eq!(buffer.contents().lines().count(), 2);
        for (i, line) in buffer.contents().lines().enumerate() {
            assert!(validate_log_line(line, i + 1).is_ok());
        }
    }

    #[test]
    fn timestamps_use_calendar_dates() {
        assert_eq!(format_utc(0, 0), "1970-01-01T00:00:00.000Z");
        // 2024-02-29T12:34:56Z
        assert_eq!(format_utc(1_709_210_096, 7), "2024-02-29T12:34:56.007Z");
        assert_eq!(format_utc(951_782_400, 0), "2000-02-29T00:00:00.000Z");
    }

    #[test]
    fn artifact_index_hashes_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        std::fs::write(&path, b"abc").unwrap();
        let mut idx = ArtifactIndex::new("run-001");
        idx.add_file(&path, "report").unwrap();
        assert_eq!(
            idx.artifacts[0].sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(idx.artifacts[0].size_bytes, Some(3));
        let parsed: serde_json::Value = serde_json::from_str(&idx.to_json().unwrap()).unwrap();
        assert_eq!(parsed["index_version"], 1);
        assert_eq!(parsed["run_id"], "run-001");
    }
}
