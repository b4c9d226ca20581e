//! Run reports.

use serde::{Deserialize, Serialize};

use crate::config::ExitPolicy;
use crate::outcome::RunSummary;
use crate::structured_log::now_utc;

/// A run report: summary plus the settings that produced its exit code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub title: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    pub exit_policy: String,
    pub exit_code: i32,
    pub summary: RunSummary,
}

impl RunReport {
    #[must_use]
    pub fn new(title: impl Into<String>, policy: ExitPolicy, summary: RunSummary) -> Self {
        Self {
            title: title.into(),
            timestamp: now_utc(),
            exit_policy: policy.as_str().to_string(),
            exit_code: summary.exit_code(policy),
            summary,
        }
    }

    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Run: {}\n", s.run_id));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!(
            "- Cases: {} passed / {} total ({} crashed)\n",
            s.passed_cases, s.total_cases, s.crashed_cases
        ));
        out.push_str(&format!(
            "- Assertions: {} ({} failed)\n",
            s.assertions_total, s.assertions_failed
        ));
        out.push_str(&format!(
            "- Exit code: {} ({})\n\n",
            self.exit_code, self.exit_policy
        ));

        out.push_str("| Suite | Case | Assertions | Failed | Status |\n");
        out.push_str("|-------|------|------------|--------|--------|\n");
        for o in &s.outcomes {
            let status = match (&o.crash, o.passed) {
                (Some(_), _) => "CRASH",
                (None, true) => "PASS",
                (None, false) => "FAIL",
            };
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                o.suite, o.case, o.assertions, o.failed_assertions, status
            ));
        }

        let failing: Vec<_> = s.failed().collect();
        if !failing.is_empty() {
            out.push_str("\n## Failures\n\n");
            for o in failing {
                if let Some(crash) = &o.crash {
                    out.push_str(&format!("- `{}`: crashed: {crash}\n", o.qualified_name()));
                }
                for f in &o.failures {
                    out.push_str(&format!(
                        "- `{}`: {} ({}:{})\n",
                        o.qualified_name(),
                        f.message,
                        f.file,
                        f.line
                    ));
                }
            }
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}
