//! Focal-function test harness.
//!
//! This crate provides:
//! - Assertion ledger: non-terminating `expect_*` checks that count and log failures
//! - Call recorders: captured-argument records with selectable stub behavior
//! - Fixture builders: zeroed values with only the fields a focal path reads set
//! - Crash survival: convert panics and fatal callbacks into recorded outcomes
//! - Runner: fixed-order case execution with a pass/fail summary and exit code
//! - Scratch resources, structured JSONL logging, and run reports

#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod crash;
pub mod diff;
pub mod error;
pub mod fixture;
pub mod ledger;
pub mod outcome;
pub mod recorder;
pub mod report;
pub mod runner;
pub mod scratch;
pub mod structured_log;

pub use config::{ExitPolicy, HarnessConfig};
pub use context::TestContext;
pub use crash::{Crash, CrashGuard, FatalError, FatalHook, FatalSignal, raise_fatal};
pub use error::{HarnessError, Result};
pub use fixture::{FixtureBuilder, LiteralCase, LiteralSet, zeroed};
pub use ledger::{AssertionLedger, Check, Failure};
pub use outcome::{CaseOutcome, RunSummary};
pub use recorder::{CallRecorder, StubMode, StubResponse};
pub use report::RunReport;
pub use runner::{Phase, Runner, Suite, TestCase};
pub use scratch::{ScratchDir, ScratchFile};
