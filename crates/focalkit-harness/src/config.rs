//! Run configuration.
//!
//! Values are read from the environment first and may then be overridden by
//! the CLI:
//! - `FOCALKIT_EXIT_POLICY`: `binary` (default) exits with 1 on any failure,
//!   `count` exits with the number of failed cases (clamped to 255).
//! - `FOCALKIT_CATCH_CRASHES`: `on` (default) wraps every case in a crash
//!   guard; `off` lets a crashing case take the whole process down.
//! - `FOCALKIT_ECHO`: `on` (default) prints per-case lines and diagnostics.
//! - `FOCALKIT_LOG`: optional path of a structured JSONL log; `-` writes
//!   the log to stderr.
//! - `FOCALKIT_RUN_ID`: identifier used as the trace id prefix.

use std::path::{Path, PathBuf};

use crate::error::{HarnessError, Result};

/// Log path that sends the structured log to stderr.
pub const STDERR_LOG: &str = "-";

/// How a failed run is translated into a process exit code.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitPolicy {
    /// Exit with `1` when anything failed.
    #[default]
    Binary,
    /// Exit with the number of failed cases, clamped to `1..=255`.
    FailureCount,
}

impl ExitPolicy {
    /// Parse from string (case-insensitive), falling back to `Binary`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// Parse from string, rejecting unknown spellings.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" | "bool" | "one" | "1" => Ok(Self::Binary),
            "count" | "failures" | "failure-count" | "failure_count" => Ok(Self::FailureCount),
            _ => Err(HarnessError::InvalidConfig {
                key: "exit policy",
                value: s.to_string(),
            }),
        }
    }

    /// Exit code for a run with `failed` failing cases.
    #[must_use]
    pub fn exit_code(self, failed: usize) -> i32 {
        if failed == 0 {
            return 0;
        }
        match self {
            Self::Binary => 1,
            Self::FailureCount => i32::try_from(failed.min(255)).unwrap_or(255),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::FailureCount => "count",
        }
    }
}

/// Resolved harness settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub exit_policy: ExitPolicy,
    pub catch_crashes: bool,
    pub echo: bool,
    pub log_path: Option<PathBuf>,
    pub run_id: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            exit_policy: ExitPolicy::Binary,
            catch_crashes: true,
            echo: true,
            log_path: None,
            run_id: format!("run-{}", std::process::id()),
        }
    }
}

impl HarnessConfig {
    /// Resolve settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary key lookup.
    ///
    /// Unrecognized values keep the default for that key.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup("FOCALKIT_EXIT_POLICY") {
            config.exit_policy = ExitPolicy::from_str_loose(&raw);
        }
        if let Some(flag) = lookup("FOCALKIT_CATCH_CRASHES").and_then(|raw| parse_switch(&raw)) {
            config.catch_crashes = flag;
        }
        if let Some(flag) = lookup("FOCALKIT_ECHO").and_then(|raw| parse_switch(&raw)) {
            config.echo = flag;
        }
        if let Some(path) = lookup("FOCALKIT_LOG").filter(|raw| !raw.trim().is_empty()) {
            config.log_path = Some(PathBuf::from(path));
        }
        if let Some(run_id) = lookup("FOCALKIT_RUN_ID").filter(|raw| !raw.trim().is_empty()) {
            config.run_id = run_id;
        }
        config
    }

    #[must_use]
    pub fn with_exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.exit_policy = policy;
        self
    }

    #[must_use]
    pub fn with_catch_crashes(mut self, catch: bool) -> Self {
        self.catch_crashes = catch;
        self
    }

    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    #[must_use]
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Whether the structured log goes to stderr (`-`).
    #[must_use]
    pub fn logs_to_stderr(&self) -> bool {
        self.log_path
            .as_deref()
            .is_some_and(|path| path == Path::new(STDERR_LOG))
    }

    /// The structured log path when it names a file.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_path.as_deref().filter(|_| !self.logs_to_stderr())
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Quiet configuration for in-process test runs.
    #[must_use]
    pub fn quiet() -> Self {
        Self::default().with_echo(false)
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_exit_policies() {
        assert_eq!(ExitPolicy::from_str_loose("binary"), ExitPolicy::Binary);
        assert_eq!(ExitPolicy::from_str_loose("COUNT"), ExitPolicy::FailureCount);
        assert_eq!(
            ExitPolicy::from_str_loose("failure-count"),
            ExitPolicy::FailureCount
        );
        assert_eq!(ExitPolicy::from_str_loose("garbage"), ExitPolicy::Binary);
        assert!(ExitPolicy::parse("garbage").is_err());
    }

    #[test]
    fn exit_codes_follow_policy() {
        assert_eq!(ExitPolicy::Binary.exit_code(0), 0);
        assert_eq!(ExitPolicy::Binary.exit_code(7), 1);
        assert_eq!(ExitPolicy::FailureCount.exit_code(0), 0);
        assert_eq!(ExitPolicy::FailureCount.exit_code(7), 7);
        assert_eq!(ExitPolicy::FailureCount.exit_code(1000), 255);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("FOCALKIT_EXIT_POLICY", "count"),
            ("FOCALKIT_CATCH_CRASHES", "off"),
            ("FOCALKIT_ECHO", "no"),
            ("FOCALKIT_LOG", "/tmp/focalkit.jsonl"),
            ("FOCALKIT_RUN_ID", "ci-42"),
        ]));
        assert_eq!(config.exit_policy, ExitPolicy::FailureCount);
        assert!(!config.catch_crashes);
        assert!(!config.echo);
        assert_eq!(
            config.log_path.as_deref(),
            Some(std::path::Path::new("/tmp/focalkit.jsonl"))
        );
        assert_eq!(config.run_id, "ci-42");
        assert!(!config.logs_to_stderr());
        assert_eq!(config.log_file(), Some(Path::new("/tmp/focalkit.jsonl")));
    }

    #[test]
    fn dash_log_path_means_stderr() {
        let config = HarnessConfig::from_lookup(lookup_from(&[("FOCALKIT_LOG", "-")]));
        assert!(config.logs_to_stderr());
        assert_eq!(config.log_file(), None);
        assert!(!HarnessConfig::default().logs_to_stderr());
    }

    #[test]
    fn unknown_switch_values_keep_defaults() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("FOCALKIT_CATCH_CRASHES", "maybe"),
            ("FOCALKIT_LOG", "  "),
        ]));
        assert!(config.catch_crashes);
        assert!(config.log_path.is_none());
        assert!(config.run_id.starts_with("run-"));
    }
}
