//! Integration test: every expect macro adds exactly one check.

use focalkit_harness::{
    AssertionLedger, CallRecorder, HarnessConfig, Runner, StubMode, Suite, TestContext,
    expect_eq, expect_err, expect_false, expect_ne, expect_none, expect_not_null, expect_ok,
    expect_some, expect_true,
};

#[test]
fn each_macro_counts_once_whether_it_passes_or_not() {
    let mut ledger = AssertionLedger::new();
    let value = 1_i32;
    let ptr: *const i32 = &value;

    expect_eq!(ledger, 1, 1);
    expect_eq!(ledger, 1, 2);
    expect_ne!(ledger, 1, 2);
    expect_ne!(ledger, 1, 1);
    expect_true!(ledger, true);
    expect_true!(ledger, false);
    expect_false!(ledger, false);
    expect_false!(ledger, true);
    expect_some!(ledger, Some(1));
    expect_some!(ledger, None::<i32>);
    expect_none!(ledger, None::<i32>);
    expect_none!(ledger, Some(1));
    expect_not_null!(ledger, ptr);
    expect_not_null!(ledger, std::ptr::null::<i32>());
    expect_ok!(ledger, Ok::<i32, String>(1));
    expect_ok!(ledger, Err::<i32, String>("e".into()));
    expect_err!(ledger, Err::<i32, String>("e".into()));
    expect_err!(ledger, Ok::<i32, String>(1));

    assert_eq!(ledger.total(), 18);
    assert_eq!(ledger.failed(), 9);
    assert_eq!(ledger.passed(), 9);
    assert!(ledger.failures().iter().all(|f| f.line > 0));
    assert!(
        ledger
            .failures()
            .iter()
            .all(|f| f.file.ends_with("ledger_contract_test.rs"))
    );
}

fn uses_a_recorder(ctx: &mut TestContext<'_>) {
    let mut recorder = CallRecorder::new().with_mode(StubMode::FailAfter(1));
    let first = recorder.record("a");
    let second = recorder.record("b");
    expect_false!(ctx, first.is_fail());
    expect_true!(ctx, second.is_fail());
    expect_eq!(ctx, recorder.count(), 2);
    recorder.reset();
    expect_eq!(ctx, recorder.count(), 0, "reset clears recorded calls");
}

#[test]
fn context_checks_land_in_the_runner_ledger() {
    let suite = Suite::new("recorder", "stub").case("modes", "", uses_a_recorder);
    let mut runner = Runner::new(HarnessConfig::quiet());
    let summary = runner.run(&[suite]);
    assert!(summary.all_passed());
    assert_eq!(summary.outcomes[0].assertions, 4);
    assert_eq!(runner.ledger().total(), 4);
}
