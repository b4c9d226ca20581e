//! Call recorders for dependency stubs.
//!
//! A stub copies the arguments it was called with into a `CallRecorder` and
//! asks the recorder's `StubMode` whether this call should succeed or fail.
//! Recorders must be reset between independent cases.

use serde::{Deserialize, Serialize};

/// Behavior selected for a stub. Exactly one mode is active at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubMode {
    /// Every call succeeds.
    #[default]
    AlwaysSucceed,
    /// Every call fails.
    AlwaysFail,
    /// Only the n-th call (1-based) fails.
    FailOnCall(u32),
    /// The first n calls succeed, every later call fails.
    FailAfter(u32),
}

impl StubMode {
    /// Whether the `call_number`-th call (1-based) fails under this mode.
    #[must_use]
    pub const fn fails_call(self, call_number: u32) -> bool {
        match self {
            Self::AlwaysSucceed => false,
            Self::AlwaysFail => true,
            Self::FailOnCall(n) => call_number == n,
            Self::FailAfter(n) => call_number > n,
        }
    }
}

/// Response handed back to the stub for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubResponse {
    Succeed,
    Fail,
}

impl StubResponse {
    /// Pick the stub's return value for this response.
    #[must_use]
    pub fn select<R>(self, on_success: R, on_failure: R) -> R {
        match self {
            Self::Succeed => on_success,
            Self::Fail => on_failure,
        }
    }

    #[must_use]
    pub const fn is_fail(self) -> bool {
        matches!(self, Self::Fail)
    }
}

/// Captured calls of one stub plus its active mode.
#[derive(Debug, Clone)]
pub struct CallRecorder<C> {
    calls: Vec<C>,
    mode: StubMode,
    resets: u32,
}

impl<C> Default for CallRecorder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CallRecorder<C> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            calls: Vec::new(),
            mode: StubMode::AlwaysSucceed,
            resets: 0,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: StubMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_mode(&mut self, mode: StubMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn mode(&self) -> StubMode {
        self.mode
    }

    /// Capture one call and return the mode-selected response.
    pub fn record(&mut self, call: C) -> StubResponse {
        self.calls.push(call);
        let call_number = u32::try_from(self.calls.len()).unwrap_or(u32::MAX);
        if self.mode.fails_call(call_number) {
            StubResponse::Fail
        } else {
            StubResponse::Succeed
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.calls.len()
    }

    #[must_use]
    pub fn was_called(&self) -> bool {
        !self.calls.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&C> {
        self.calls.last()
    }

    #[must_use]
    pub fn calls(&self) -> &[C] {
        &self.calls
    }

    /// Drop captured calls and restore the default mode.
    pub fn reset(&mut self) {
        self.calls.clear();
        self.mode = StubMode::AlwaysSucceed;
        self.resets = self.resets.saturating_add(1);
    }

    /// Number of resets since construction.
    #[must_use]
    pub fn resets(&self) -> u32 {
        self.resets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_select_failing_calls() {
        assert!(!StubMode::AlwaysSucceed.fails_call(1));
        assert!(StubMode::AlwaysFail.fails_call(1));
        assert!(!StubMode::FailOnCall(2).fails_call(1));
        assert!(StubMode::FailOnCall(2).fails_call(2));
        assert!(!StubMode::FailOnCall(2).fails_call(3));
        assert!(!StubMode::FailAfter(2).fails_call(2));
        assert!(StubMode::FailAfter(2).fails_call(3));
    }

    #[test]
    fn recorder_captures_arguments_in_order() {
        let mut recorder = CallRecorder::new();
        recorder.record(("open", 1));
        recorder.record(("write", 2));
        assert_eq!(recorder.count(), 2);
        assert_eq!(recorder.last(), Some(&("write", 2)));
        assert_eq!(recorder.calls()[0], ("open", 1));
    }

    #[test]
    fn fail_on_first_call_then_recover() {
        let mut recorder = CallRecorder::new().with_mode(StubMode::FailOnCall(1));
        assert_eq!(recorder.record(()), StubResponse::Fail);
        assert_eq!(recorder.record(()), StubResponse::Succeed);
        assert_eq!(StubResponse::Fail.select(0, -1), -1);
    }

    #[test]
    fn reset_clears_calls_and_mode() {
        let mut recorder = CallRecorder::new().with_mode(StubMode::AlwaysFail);
        recorder.record(42_u32);
        recorder.reset();
        assert_eq!(recorder.count(), 0);
        assert!(!recorder.was_called());
        assert_eq!(recorder.mode(), StubMode::AlwaysSucceed);
        assert_eq!(recorder.resets(), 1);
    }
}
