//! Per-case outcomes and the run summary.

use serde::{Deserialize, Serialize};

use crate::config::ExitPolicy;
use crate::ledger::Failure;

/// Result of one executed case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub suite: String,
    pub case: String,
    /// No failing assertion and no crash.
    pub passed: bool,
    pub assertions: u64,
    pub failed_assertions: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub duration_ms: u64,
}

impl CaseOutcome {
    /// `suite::case`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.suite, self.case)
    }
}

/// Aggregate of one runner invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub total_cases: usize,
    pub passed_cases: usize,
    pub failed_cases: usize,
    pub crashed_cases: usize,
    pub assertions_total: u64,
    pub assertions_failed: u64,
    pub outcomes: Vec<CaseOutcome>,
}

impl RunSummary {
    #[must_use]
    pub fn from_outcomes(run_id: impl Into<String>, outcomes: Vec<CaseOutcome>) -> Self {
        let passed_cases = outcomes.iter().filter(|o| o.passed).count();
        let crashed_cases = outcomes.iter().filter(|o| o.crash.is_some()).count();
        Self {
            run_id: run_id.into(),
            total_cases: outcomes.len(),
            passed_cases,
            failed_cases: outcomes.len() - passed_cases,
            crashed_cases,
            assertions_total: outcomes.iter().map(|o| o.assertions).sum(),
            assertions_failed: outcomes.iter().map(|o| o.failed_assertions).sum(),
            outcomes,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_cases == 0
    }

    #[must_use]
    pub fn exit_code(&self, policy: ExitPolicy) -> i32 {
        policy.exit_code(self.failed_cases)
    }

    /// `TEST SUMMARY: P / T tests passed (A assertions, F failed)`.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "TEST SUMMARY: {} / {} tests passed ({} assertions, {} failed)",
            self.passed_cases, self.total_cases, self.assertions_total, self.assertions_failed
        )
    }

    pub fn failed(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(case: &str, failed_assertions: u64, crash: Option<&str>) -> CaseOutcome {
        CaseOutcome {
            suite: "s".into(),
            case: case.into(),
            passed: failed_assertions == 0 && crash.is_none(),
            assertions: 3,
            failed_assertions,
            crash: crash.map(str::to_string),
            failures: Vec::new(),
            notes: Vec::new(),
            duration_ms: 0,
        }
    }

    #[test]
    fn summary_counts_cases_and_assertions() {
        let summary = RunSummary::from_outcomes(
            "r",
            vec![
                outcome("a", 0, None),
                outcome("b", 2, None),
                outcome("c", 0, Some("boom")),
            ],
        );
        assert_eq!(summary.total_cases, 3);
        assert_eq!(summary.passed_cases, 1);
        assert_eq!(summary.failed_cases, 2);
        assert_eq!(summary.crashed_cases, 1);
        assert_eq!(summary.assertions_total, 9);
        assert_eq!(summary.assertions_failed, 2);
        assert_eq!(
            summary.summary_line(),
            "TEST SUMMARY: 1 / 3 tests passed (9 assertions, 2 failed)"
        );
        assert_eq!(summary.exit_code(ExitPolicy::Binary), 1);
        assert_eq!(summary.exit_code(ExitPolicy::FailureCount), 2);
        let failed: Vec<String> = summary.failed().map(CaseOutcome::qualified_name).collect();
        assert_eq!(failed, ["s::b", "s::c"]);
    }

    #[test]
    fn empty_run_passes() {
        let summary = RunSummary::from_outcomes("r", Vec::new());
        assert!(summary.all_passed());
        assert_eq!(summary.exit_code(ExitPolicy::FailureCount), 0);
    }
}
