//! Integration test: every built-in suite passes under the runner.

use focalkit_harness::{ExitPolicy, HarnessConfig, HarnessError, Runner};
use focalkit_suites::{all_suites, select, suite_names};

#[test]
fn every_builtin_suite_passes() {
    let suites = all_suites();
    let mut runner = Runner::new(HarnessConfig::quiet());
    let summary = runner.run(&suites);

    for outcome in summary.failed() {
        eprintln!("{}: {:?} {:?}", outcome.qualified_name(), outcome.crash, outcome.failures);
    }
    assert!(summary.all_passed(), "{}", summary.summary_line());
    assert_eq!(summary.crashed_cases, 0);
    assert_eq!(
        summary.total_cases,
        suites.iter().map(|s| s.cases().len()).sum::<usize>()
    );
    assert!(summary.assertions_total > summary.total_cases as u64);
    assert_eq!(summary.exit_code(ExitPolicy::FailureCount), 0);
}

#[test]
fn outcomes_follow_registration_order() {
    let suites = select(&["output_spy".to_string()]).unwrap();
    let mut runner = Runner::new(HarnessConfig::quiet());
    let summary = runner.run(&suites);
    let names: Vec<_> = summary.outcomes.iter().map(|o| o.case.as_str()).collect();
    let registered: Vec<_> = suites[0].cases().iter().map(|c| c.name).collect();
    assert_eq!(names, registered);
}

#[test]
fn crash_case_is_contained_by_the_btree_suite() {
    let suites = select(&["btree_cache_size".to_string()]).unwrap();
    let mut runner = Runner::new(HarnessConfig::quiet());
    let summary = runner.run(&suites);
    let unheld = summary
        .outcomes
        .iter()
        .find(|o| o.case == "mutex_not_held")
        .expect("mutex_not_held case registered");
    assert!(unheld.passed);
    assert!(unheld.crash.is_none(), "the case guards its own crash");
}

#[test]
fn registry_rejects_unknown_names() {
    let err = select(&["json_tree".to_string(), "nope".to_string()]).unwrap_err();
    assert!(matches!(err, HarnessError::UnknownSuite(ref name) if name == "nope"));
    assert_eq!(err.to_string(), "unknown suite 'nope'");
}

#[test]
fn zlib_suite_follows_the_feature() {
    let present = suite_names().contains(&"zlib_roundtrip");
    assert_eq!(present, cfg!(feature = "zlib"));
}

#[test]
fn int_array_table_loads_from_disk() {
    use focalkit_harness::LiteralSet;
    use focalkit_suites::int_array::{ExpectedVerdict, IntArrayInput};

    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/int_array_cases.json");
    let set = LiteralSet::<IntArrayInput, ExpectedVerdict>::from_file(&path).unwrap();
    assert_eq!(set.focal, "UnityAssertEqualIntArray");
    assert!(!set.cases.is_empty());
    assert!(set.cases.iter().all(|case| !case.name.is_empty()));
}
