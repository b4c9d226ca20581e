//! Case registration and the run loop.
//!
//! Cases run in registration order, once each. Per run the runner moves
//! through `Start`, then `Setup`/`Invoke`/`Assert`/`Teardown` for every case,
//! then `Report` and `Terminal`. Each transition is written to the structured
//! log when one is attached.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::HarnessConfig;
use crate::context::TestContext;
use crate::crash::{Crash, CrashGuard};
use crate::error::Result;
use crate::ledger::AssertionLedger;
use crate::outcome::{CaseOutcome, RunSummary};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

/// Body of a test case.
pub type CaseFn = fn(&mut TestContext<'_>);

/// A statically registered test.
#[derive(Clone, Copy)]
pub struct TestCase {
    pub name: &'static str,
    pub description: &'static str,
    run: CaseFn,
}

impl TestCase {
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, run: CaseFn) -> Self {
        Self {
            name,
            description,
            run,
        }
    }

    pub fn invoke(&self, ctx: &mut TestContext<'_>) {
        (self.run)(ctx);
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered cases for one focal function, with optional per-case hooks.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: &'static str,
    /// Name of the function under test.
    pub focal: &'static str,
    cases: Vec<TestCase>,
    setup: Option<fn()>,
    teardown: Option<fn()>,
}

impl Suite {
    #[must_use]
    pub fn new(name: &'static str, focal: &'static str) -> Self {
        Self {
            name,
            focal,
            cases: Vec::new(),
            setup: None,
            teardown: None,
        }
    }

    /// Register a case. Registration order is execution order.
    #[must_use]
    pub fn case(mut self, name: &'static str, description: &'static str, run: CaseFn) -> Self {
        self.cases.push(TestCase::new(name, description, run));
        self
    }

    /// Hook run before every case.
    #[must_use]
    pub fn with_setup(mut self, setup: fn()) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Hook run after every case, including crashed ones.
    #[must_use]
    pub fn with_teardown(mut self, teardown: fn()) -> Self {
        self.teardown = Some(teardown);
        self
    }

    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Setup,
    Invoke,
    Assert,
    Teardown,
    Report,
    Terminal,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Setup => "setup",
            Self::Invoke => "invoke",
            Self::Assert => "assert",
            Self::Teardown => "teardown",
            Self::Report => "report",
            Self::Terminal => "terminal",
        }
    }
}

/// Executes suites and produces a [`RunSummary`].
pub struct Runner {
    config: HarnessConfig,
    ledger: AssertionLedger,
    log: Option<LogEmitter>,
    trace: Vec<Phase>,
    log_errors: u32,
}

impl Runner {
    /// Runner without a structured log.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            ledger: AssertionLedger::new().with_echo(config.echo),
            config,
            log: None,
            trace: Vec::new(),
            log_errors: 0,
        }
    }

    /// Runner that opens the configured log path, if any. `-` logs to stderr.
    pub fn from_config(config: HarnessConfig) -> Result<Self> {
        let log = if config.logs_to_stderr() {
            Some(LogEmitter::to_stderr(&config.run_id))
        } else {
            match config.log_file() {
                Some(path) => Some(LogEmitter::to_file(path, &config.run_id)?),
                None => None,
            }
        };
        let mut runner = Self::new(config);
        runner.log = log;
        Ok(runner)
    }

    #[must_use]
    pub fn with_log(mut self, log: LogEmitter) -> Self {
        self.log = Some(log);
        self
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &AssertionLedger {
        &self.ledger
    }

    /// Phases entered during the last run.
    #[must_use]
    pub fn trace(&self) -> &[Phase] {
        &self.trace
    }

    /// Log writes that failed. They never fail the run.
    #[must_use]
    pub fn log_errors(&self) -> u32 {
        self.log_errors
    }

    /// Run every case of every suite, in order.
    ///
    /// The ledger starts from zero on every call, so repeated runs in one
    /// process produce identical summaries.
    pub fn run(&mut self, suites: &[Suite]) -> RunSummary {
        self.trace.clear();
        self.ledger.reset();
        self.enter(Phase::Start, None, None);
        self.log(
            LogEntry::new("", LogLevel::Info, "run_start")
                .with_suite("run")
                .with_phase(Phase::Start.as_str())
                .with_details(serde_json::json!({
                    "suites": suites.iter().map(|s| s.name).collect::<Vec<_>>(),
                    "catch_crashes": self.config.catch_crashes,
                })),
        );

        let mut outcomes = Vec::new();
        for suite in suites {
            for case in &suite.cases {
                outcomes.push(self.run_case(suite, case));
            }
        }

        let summary = RunSummary::from_outcomes(self.config.run_id.clone(), outcomes);
        let exit_code = summary.exit_code(self.config.exit_policy);
        self.enter(Phase::Report, None, None);
        if self.config.echo {
            println!("{}", summary.summary_line());
        }
        self.log(
            LogEntry::new(
                "",
                if summary.all_passed() {
                    LogLevel::Info
                } else {
                    LogLevel::Error
                },
                "run_summary",
            )
            .with_suite("run")
            .with_phase(Phase::Report.as_str())
            .with_assertions(summary.assertions_total, summary.assertions_failed)
            .with_exit_code(exit_code)
            .with_message(summary.summary_line()),
        );
        self.enter(Phase::Terminal, None, None);
        if let Some(log) = &mut self.log
            && log.flush().is_err()
        {
            self.log_errors += 1;
        }
        summary
    }

    fn run_case(&mut self, suite: &Suite, case: &TestCase) -> CaseOutcome {
        let started = Instant::now();
        self.ledger
            .enter_case(format!("{}::{}", suite.name, case.name));
        let mut guard = CrashGuard::new();

        self.enter(Phase::Setup, Some(suite.name), Some(case.name));
        let mut crash = suite
            .setup
            .and_then(|setup| self.guarded(&mut guard, setup).err());
        let mut hook_crashed = crash.is_some();

        let mark = self.ledger.mark();
        let mut notes = Vec::new();
        if crash.is_none() {
            self.enter(Phase::Invoke, Some(suite.name), Some(case.name));
            let catch = self.config.catch_crashes;
            let mut ctx = TestContext::new(&mut self.ledger, suite.name, case.name);
            let result = if catch {
                guard.run(|| case.invoke(&mut ctx))
            } else {
                case.invoke(&mut ctx);
                Ok(())
            };
            notes = ctx.take_notes();
            crash = result.err();
        }

        self.enter(Phase::Assert, Some(suite.name), Some(case.name));
        let (assertions, failed_assertions) = self.ledger.since(mark);
        let failures = self.ledger.failures_since(mark).to_vec();
        for failure in &failures {
            self.log(
                LogEntry::new("", LogLevel::Error, "assertion_failed")
                    .with_case(suite.name, case.name)
                    .with_phase(Phase::Assert.as_str())
                    .with_location(&failure.file, failure.line)
                    .with_message(&failure.message)
                    .with_values(failure.expected.clone(), failure.actual.clone()),
            );
        }

        self.enter(Phase::Teardown, Some(suite.name), Some(case.name));
        if let Some(teardown) = suite.teardown
            && let Err(teardown_crash) = self.guarded(&mut guard, teardown)
            && crash.is_none()
        {
            crash = Some(teardown_crash);
            hook_crashed = true;
        }

        let passed = failed_assertions == 0 && crash.is_none();
        let outcome = CaseOutcome {
            suite: suite.name.to_string(),
            case: case.name.to_string(),
            passed,
            assertions,
            failed_assertions,
            crash: crash.as_ref().map(Crash::to_string),
            failures,
            notes,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        if self.config.echo {
            if passed {
                println!("[PASS] {}", outcome.qualified_name());
            } else if let Some(crash) = &outcome.crash {
                eprintln!("[FAIL] {} ({crash})", outcome.qualified_name());
            } else {
                eprintln!("[FAIL] {}", outcome.qualified_name());
            }
        }
        // A crash in setup or teardown is a fixture error, not a case crash.
        let (level, tag) = match (&outcome.crash, passed) {
            (Some(_), _) if hook_crashed => (LogLevel::Error, Outcome::Error),
            (Some(_), _) => (LogLevel::Error, Outcome::Crash),
            (None, true) => (LogLevel::Info, Outcome::Pass),
            (None, false) => (LogLevel::Error, Outcome::Fail),
        };
        let mut entry = LogEntry::new("", level, "case_end")
            .with_case(suite.name, case.name)
            .with_outcome(tag)
            .with_assertions(assertions, failed_assertions)
            .with_duration_ms(outcome.duration_ms);
        if let Some(crash) = &outcome.crash {
            entry = entry.with_message(crash);
        }
        self.log(entry);
        outcome
    }

    fn guarded(&self, guard: &mut CrashGuard, hook: fn()) -> std::result::Result<(), Crash> {
        if self.config.catch_crashes {
            guard.run(hook)
        } else {
            hook();
            Ok(())
        }
    }

    fn enter(&mut self, phase: Phase, suite: Option<&str>, case: Option<&str>) {
        self.trace.push(phase);
        let mut entry = LogEntry::new("", LogLevel::Debug, "phase").with_phase(phase.as_str());
        entry = match (suite, case) {
            (Some(suite), Some(case)) => entry.with_case(suite, case),
            _ => entry.with_suite("run"),
        };
        self.log(entry);
    }

    fn log(&mut self, entry: LogEntry) {
        if let Some(log) = &mut self.log
            && log.emit_entry(entry).is_err()
        {
            self.log_errors += 1;
        }
    }
}
