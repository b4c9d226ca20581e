//! Per-case execution context.
//!
//! Each case receives its own `TestContext` instead of reaching for
//! process-global counters, so nothing recorded by one case is visible to the
//! next.

use crate::ledger::{AssertionLedger, Check};

/// Handle passed to every test case.
pub struct TestContext<'a> {
    ledger: &'a mut AssertionLedger,
    suite: &'a str,
    case: &'a str,
    notes: Vec<String>,
}

impl<'a> TestContext<'a> {
    pub fn new(ledger: &'a mut AssertionLedger, suite: &'a str, case: &'a str) -> Self {
        Self {
            ledger,
            suite,
            case,
            notes: Vec::new(),
        }
    }

    /// Record one check in the shared ledger.
    pub fn check(&mut self, passed: bool, check: Check<'_>) -> bool {
        self.ledger.check(passed, check)
    }

    #[must_use]
    pub fn suite(&self) -> &str {
        self.suite
    }

    #[must_use]
    pub fn case(&self) -> &str {
        self.case
    }

    /// Attach an informational note to the case outcome.
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn take_notes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notes)
    }

    /// Read-only view of the ledger.
    #[must_use]
    pub fn ledger(&self) -> &AssertionLedger {
        self.ledger
    }
}
