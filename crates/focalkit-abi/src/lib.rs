// Focal entry points take raw pointers from test fixtures; their safety
// contracts are stated once on the shadow types they operate on.
#![allow(clippy::missing_safety_doc)]
//! # focalkit-abi
//!
//! C-linkage side of the harness.
//!
//! - `#[repr(C)]` shadow types standing in for library structs, each carrying
//!   a [`LayoutContract`] that is checked against the compiled layout.
//! - Focal functions exported with `extern "C-unwind"`, so an internal
//!   assertion unwinds into the crash guard instead of aborting.
//! - [`StubSlot`]: static, lock-protected call recorders for stubs that
//!   cannot capture a test context, plus the `stub_fn!` generator.
//!
//! ```text
//! test -> focal fn (this crate) -> method table -> stub_fn! stub -> StubSlot
//! ```

#[macro_use]
mod macros;

pub mod btree;
pub mod layout;
pub mod stub;

pub use layout::{FieldSpec, LayoutContract, LayoutMismatch, ObservedLayout, ShadowType};
pub use stub::{SlotScope, StubSlot};
