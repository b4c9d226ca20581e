//! Named lookup over every built-in suite.

use focalkit_harness::{HarnessError, Result, Suite};

use crate::{btree_cache_size, int_array, json_tree, output_spy};

/// Every built-in suite, in run order.
#[must_use]
pub fn all_suites() -> Vec<Suite> {
    let mut suites = vec![
        json_tree::suite(),
        output_spy::suite(),
        int_array::suite(),
        btree_cache_size::suite(),
    ];
    #[cfg(feature = "zlib")]
    suites.push(crate::zlib_roundtrip::suite());
    suites
}

/// Names of every built-in suite, in run order.
#[must_use]
pub fn suite_names() -> Vec<&'static str> {
    all_suites().iter().map(|s| s.name).collect()
}

/// Suites matching `names`, in the order given. An empty selection means all.
pub fn select(names: &[String]) -> Result<Vec<Suite>> {
    let mut available = all_suites();
    if names.is_empty() {
        return Ok(available);
    }
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let Some(pos) = available.iter().position(|s| s.name == name.as_str()) else {
            return Err(HarnessError::UnknownSuite(name.clone()));
        };
        selected.push(available.swap_remove(pos));
    }
    Ok(selected)
}
