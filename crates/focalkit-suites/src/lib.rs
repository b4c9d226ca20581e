//! # focalkit-suites
//!
//! Built-in suites, one per focal function, and the `focalkit` CLI.
//!
//! | Suite | Focal function |
//! |-------|----------------|
//! | `json_tree` | cJSON delete and array replace with allocation hooks |
//! | `output_spy` | Unity character output spy |
//! | `int_array` | Unity integer array equality |
//! | `btree_cache_size` | SQLite B-tree cache size through stubbed collaborators |
//! | `zlib_roundtrip` | zlib one-shot compress and uncompress (feature `zlib`) |

pub mod btree_cache_size;
pub mod int_array;
pub mod json_tree;
pub mod output_spy;
pub mod registry;
#[cfg(feature = "zlib")]
pub mod zlib_roundtrip;

pub use registry::{all_suites, select, suite_names};
