//! Non-terminating assertion ledger and the `expect_*` macro family.
//!
//! Every macro invocation adds exactly one check to the ledger. A failing
//! check writes a diagnostic, bumps the failure counter and returns `false`;
//! execution of the calling test always continues.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::diff;

/// Compact renderings wider than this switch to pretty `Debug`.
const COMPACT_WIDTH: usize = 40;

/// Source-located description of one check, built by the `expect_*` macros.
#[derive(Debug, Clone)]
pub struct Check<'a> {
    pub message: &'a str,
    pub file: &'static str,
    pub line: u32,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl<'a> Check<'a> {
    #[must_use]
    pub fn new(message: &'a str, file: &'static str, line: u32) -> Self {
        Self {
            message,
            file,
            line,
            expected: None,
            actual: None,
        }
    }

    #[must_use]
    pub fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

/// A recorded failing check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// `suite::case` the failure belongs to.
    pub case: String,
    pub message: String,
    pub file: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

/// Position in the ledger, used to compute per-case deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerMark {
    total: u64,
    failed: u64,
    failures: usize,
}

/// Counters for one process run: `total` checks and `failed` checks.
#[derive(Debug, Clone, Default)]
pub struct AssertionLedger {
    total: u64,
    failed: u64,
    failures: Vec<Failure>,
    current_case: String,
    echo: bool,
}

impl AssertionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write failure diagnostics to stderr as they happen.
    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Attribute subsequent failures to `case`.
    pub fn enter_case(&mut self, case: impl Into<String>) {
        self.current_case = case.into();
    }

    #[must_use]
    pub fn current_case(&self) -> &str {
        &self.current_case
    }

    /// Record one check. Returns `passed` so callers can branch on it.
    pub fn check(&mut self, passed: bool, check: Check<'_>) -> bool {
        self.total += 1;
        if passed {
            return true;
        }
        self.failed += 1;
        let failure = Failure {
            case: self.current_case.clone(),
            message: check.message.to_string(),
            file: check.file.to_string(),
            line: check.line,
            expected: check.expected,
            actual: check.actual,
        };
        if self.echo {
            eprintln!("{}", render_failure(&failure));
        }
        self.failures.push(failure);
        false
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed
    }

    #[must_use]
    pub fn passed(&self) -> u64 {
        self.total - self.failed
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    #[must_use]
    pub fn mark(&self) -> LedgerMark {
        LedgerMark {
            total: self.total,
            failed: self.failed,
            failures: self.failures.len(),
        }
    }

    /// `(checks, failed checks)` recorded since `mark`.
    #[must_use]
    pub fn since(&self, mark: LedgerMark) -> (u64, u64) {
        (self.total - mark.total, self.failed - mark.failed)
    }

    #[must_use]
    pub fn failures_since(&self, mark: LedgerMark) -> &[Failure] {
        &self.failures[mark.failures.min(self.failures.len())..]
    }

    /// Return to the zero state, keeping the echo setting.
    pub fn reset(&mut self) {
        let echo = self.echo;
        *self = Self::default();
        self.echo = echo;
    }
}

/// Human-readable diagnostic for a failure.
#[must_use]
pub fn render_failure(failure: &Failure) -> String {
    let mut out = format!(
        "[EXPECT FAILED] {}: {} ({}:{})",
        failure.case, failure.message, failure.file, failure.line
    );
    if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
        if diff::wants_diff(expected, actual) {
            out.push('\n');
            out.push_str(&diff::render_diff(expected, actual));
        } else {
            out.push_str(&format!("\n  expected: {expected}\n  actual:   {actual}"));
        }
    }
    out
}

/// `Debug` renderings of an expected/actual pair for a diagnostic.
///
/// Struct-shaped or wide values use `{:#?}`, one field per line, so the
/// diagnostic can diff them.
#[doc(hidden)]
#[must_use]
pub fn render_values<E, A>(expected: &E, actual: &A) -> (String, String)
where
    E: Debug + ?Sized,
    A: Debug + ?Sized,
{
    let expected_text = format!("{expected:?}");
    let actual_text = format!("{actual:?}");
    let wide = |s: &str| s.len() > COMPACT_WIDTH || s.contains(" { ");
    if wide(&expected_text) || wide(&actual_text) {
        (format!("{expected:#?}"), format!("{actual:#?}"))
    } else {
        (expected_text, actual_text)
    }
}

/// Value equality check.
///
/// `expect_eq!(ctx, actual, expected)` or with a trailing format message.
#[macro_export]
macro_rules! expect_eq {
    ($ctx:expr, $actual:expr, $expected:expr $(,)?) => {
        $crate::expect_eq!(
            $ctx,
            $actual,
            $expected,
            "{} == {}",
            stringify!($actual),
            stringify!($expected)
        )
    };
    ($ctx:expr, $actual:expr, $expected:expr, $($msg:tt)+) => {{
        let actual = &$actual;
        let expected = &$expected;
        let message = format!($($msg)+);
        let (expected_text, actual_text) = $crate::ledger::render_values(expected, actual);
        $ctx.check(
            actual == expected,
            $crate::ledger::Check::new(&message, file!(), line!())
                .with_values(expected_text, actual_text),
        )
    }};
}

/// Value inequality check.
#[macro_export]
macro_rules! expect_ne {
    ($ctx:expr, $actual:expr, $unexpected:expr $(,)?) => {
        $crate::expect_ne!(
            $ctx,
            $actual,
            $unexpected,
            "{} != {}",
            stringify!($actual),
            stringify!($unexpected)
        )
    };
    ($ctx:expr, $actual:expr, $unexpected:expr, $($msg:tt)+) => {{
        let actual = &$actual;
        let unexpected = &$unexpected;
        let message = format!($($msg)+);
        $ctx.check(
            actual != unexpected,
            $crate::ledger::Check::new(&message, file!(), line!())
                .with_values(format!("anything but {unexpected:?}"), format!("{actual:?}")),
        )
    }};
}

/// Boolean check.
#[macro_export]
macro_rules! expect_true {
    ($ctx:expr, $cond:expr $(,)?) => {
        $crate::expect_true!($ctx, $cond, "{}", stringify!($cond))
    };
    ($ctx:expr, $cond:expr, $($msg:tt)+) => {{
        let value: bool = $cond;
        let message = format!($($msg)+);
        $ctx.check(
            value,
            $crate::ledger::Check::new(&message, file!(), line!())
                .with_values("true", value.to_string()),
        )
    }};
}

#[macro_export]
macro_rules! expect_false {
    ($ctx:expr, $cond:expr $(,)?) => {
        $crate::expect_false!($ctx, $cond, "!{}", stringify!($cond))
    };
    ($ctx:expr, $cond:expr, $($msg:tt)+) => {{
        let value: bool = $cond;
        let message = format!($($msg)+);
        $ctx.check(
            !value,
            $crate::ledger::Check::new(&message, file!(), line!())
                .with_values("false", value.to_string()),
        )
    }};
}

/// `Option` is `Some`. Evaluates to the inner value by reference.
#[macro_export]
macro_rules! expect_some {
    ($ctx:expr, $opt:expr $(,)?) => {
        $crate::expect_some!($ctx, $opt, "{} is Some", stringify!($opt))
    };
    ($ctx:expr, $opt:expr, $($msg:tt)+) => {{
        let value = $opt;
        let message = format!($($msg)+);
        let present = value.is_some();
        $ctx.check(
            present,
            $crate::ledger::Check::new(&message, file!(), line!())
                .with_values("Some(..)", if present { "Some(..)" } else { "None" }),
        );
        value
    }};
}

#[macro_export]
macro_rules! expect_none {
    ($ctx:expr, $opt:expr $(,)?) => {
        $crate::expect_none!($ctx, $opt, "{} is None", stringify!($opt))
    };
    ($ctx:expr, $opt:expr, $($msg:tt)+) => {{
        let absent = $opt.is_none();
        let message = format!($($msg)+);
        $ctx.check(
            absent,
            $crate::ledger::Check::new(&message, file!(), line!())
                .with_values("None", if absent { "None" } else { "Some(..)" }),
        )
    }};
}

/// Raw pointer is non-null.
#[macro_export]
macro_rules! expect_not_null {
    ($ctx:expr, $ptr:expr $(,)?) => {
        $crate::expect_not_null!($ctx, $ptr, "{} is not null", stringify!($ptr))
    };
    ($ctx:expr, $ptr:expr, $($msg:tt)+) => {{
        let ptr = $ptr;
        let message = format!($($msg)+);
        $ctx.check(
            !ptr.is_null(),
            $crate::ledger::Check::new(&message, file!(), line!())
                .with_values("non-null", format!("{ptr:p}")),
        )
    }};
}

/// `Result` is `Ok`. Evaluates to `Option<T>` so the test can bail out early.
#[macro_export]
macro_rules! expect_ok {
    ($ctx:expr, $result:expr $(,)?) => {
        $crate::expect_ok!($ctx, $result, "{} is Ok", stringify!($result))
    };
    ($ctx:expr, $result:expr, $($msg:tt)+) => {{
        let message = format!($($msg)+);
        match $result {
            Ok(value) => {
                $ctx.check(true, $crate::ledger::Check::new(&message, file!(), line!()));
                Some(value)
            }
            Err(err) => {
                $ctx.check(
                    false,
                    $crate::ledger::Check::new(&message, file!(), line!())
                        .with_values("Ok(..)", format!("Err({err:?})")),
                );
                None
            }
        }
    }};
}

/// `Result` is `Err`. Evaluates to `Option<E>`.
#[macro_export]
macro_rules! expect_err {
    ($ctx:expr, $result:expr $(,)?) => {
        $crate::expect_err!($ctx, $result, "{} is Err", stringify!($result))
    };
    ($ctx:expr, $result:expr, $($msg:tt)+) => {{
        let message = format!($($msg)+);
        match $result {
            Err(err) => {
                $ctx.check(true, $crate::ledger::Check::new(&message, file!(), line!()));
                Some(err)
            }
            Ok(value) => {
                $ctx.check(
                    false,
                    $crate::ledger::Check::new(&message, file!(), line!())
                        .with_values("Err(..)", format!("Ok({value:?})")),
                );
                None
            }
        }
    }};
}
