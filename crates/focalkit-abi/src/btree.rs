//! B-tree cache-size focal function over SQLite-shaped shadow types.
//!
//! `focal_btree_set_cache_size` mirrors `sqlite3BtreeSetCacheSize`: it
//! requires the connection mutex, enters the B-tree, forwards the cache size
//! to the pager and leaves again. Collaborators are reached through a
//! [`BtreeMethods`] table so tests can substitute recording stubs.

use std::ffi::c_void;
use std::ptr;

use libc::c_int;

use crate::layout::{FieldSpec, LayoutContract, ObservedLayout, PTR, PTR_ALIGN, ShadowType, round_up};

pub const SQLITE_OK: c_int = 0;
pub const SQLITE_MISUSE: c_int = 21;

/// Message of the internal assertion hit when the mutex is not held.
///
/// The assertion is an ordinary panic and goes through the panic hook unless
/// the caller runs it under `CrashGuard::quiet`.
pub const MUTEX_ASSERTION: &str = "assertion failed: sqlite3_mutex_held(p->db->mutex)";

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub cache_size: c_int,
    pub spill_size: c_int,
}

#[repr(C)]
#[derive(Debug)]
pub struct BtShared {
    pub pager: *mut Pager,
    pub page_size: u32,
}

impl Default for BtShared {
    fn default() -> Self {
        Self {
            pager: ptr::null_mut(),
            page_size: 0,
        }
    }
}

/// Connection handle; only the mutex pointer is read.
#[repr(C)]
#[derive(Debug)]
pub struct Db {
    pub mutex: *mut c_void,
    pub flags: u32,
}

impl Default for Db {
    fn default() -> Self {
        Self {
            mutex: ptr::null_mut(),
            flags: 0,
        }
    }
}

/// Collaborators of the focal function.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct BtreeMethods {
    pub mutex_held: unsafe extern "C" fn(mutex: *mut c_void) -> c_int,
    pub enter: unsafe extern "C" fn(p: *mut Btree),
    pub leave: unsafe extern "C" fn(p: *mut Btree),
    pub pager_set_cachesize: unsafe extern "C" fn(pager: *mut Pager, mx_page: c_int),
}

/// B-tree handle. `db`, `bt` and `methods` are each null or valid for the
/// duration of a focal call. `bt.pager` is passed to the pager collaborator
/// as is.
#[repr(C)]
#[derive(Debug)]
pub struct Btree {
    pub db: *mut Db,
    pub bt: *mut BtShared,
    pub methods: *const BtreeMethods,
}

impl Default for Btree {
    fn default() -> Self {
        Self {
            db: ptr::null_mut(),
            bt: ptr::null_mut(),
            methods: ptr::null(),
        }
    }
}

/// Set the page-cache size of the B-tree's pager.
///
/// Returns `SQLITE_MISUSE` for a null handle, connection, shared B-tree or
/// method table, before any collaborator is called.
/// Panics (unwinding to the caller) when the connection mutex is not held.
#[unsafe(no_mangle)]
pub unsafe extern "C-unwind" fn focal_btree_set_cache_size(p: *mut Btree, mx_page: c_int) -> c_int {
    if p.is_null() {
        return SQLITE_MISUSE;
    }
    // SAFETY: `p` is non-null and valid per the `Btree` contract.
    let (db, bt, methods) = unsafe { ((*p).db, (*p).bt, (*p).methods) };
    if db.is_null() || bt.is_null() || methods.is_null() {
        return SQLITE_MISUSE;
    }
    // SAFETY: non-null fields are valid per the `Btree` contract.
    let methods = unsafe { *methods };
    let mutex = unsafe { (*db).mutex };

    let held = unsafe { (methods.mutex_held)(mutex) };
    assert!(held != 0, "{MUTEX_ASSERTION}");

    unsafe { (methods.enter)(p) };
    let pager = unsafe { (*bt).pager };
    unsafe { (methods.pager_set_cachesize)(pager, mx_page) };
    unsafe { (methods.leave)(p) };
    SQLITE_OK
}

// ---------------------------------------------------------------------------
// Layout contracts
// ---------------------------------------------------------------------------

impl ShadowType for Pager {
    const CONTRACT: LayoutContract = LayoutContract {
        type_name: "Pager",
        size: 8,
        align: 4,
        fields: &[
            FieldSpec {
                name: "cache_size",
                offset: 0,
            },
            FieldSpec {
                name: "spill_size",
                offset: 4,
            },
        ],
    };

    fn observed() -> ObservedLayout {
        observe_layout!(Pager {
            cache_size,
            spill_size
        })
    }
}

impl ShadowType for BtShared {
    const CONTRACT: LayoutContract = LayoutContract {
        type_name: "BtShared",
        size: round_up(PTR + 4, PTR_ALIGN),
        align: PTR_ALIGN,
        fields: &[
            FieldSpec {
                name: "pager",
                offset: 0,
            },
            FieldSpec {
                name: "page_size",
                offset: PTR,
            },
        ],
    };

    fn observed() -> ObservedLayout {
        observe_layout!(BtShared { pager, page_size })
    }
}

impl ShadowType for Db {
    const CONTRACT: LayoutContract = LayoutContract {
        type_name: "Db",
        size: round_up(PTR + 4, PTR_ALIGN),
        align: PTR_ALIGN,
        fields: &[
            FieldSpec {
                name: "mutex",
                offset: 0,
            },
            FieldSpec {
                name: "flags",
                offset: PTR,
            },
        ],
    };

    fn observed() -> ObservedLayout {
        observe_layout!(Db { mutex, flags })
    }
}

impl ShadowType for BtreeMethods {
    const CONTRACT: LayoutContract = LayoutContract {
        type_name: "BtreeMethods",
        size: 4 * PTR,
        align: PTR_ALIGN,
        fields: &[
            FieldSpec {
                name: "mutex_held",
                offset: 0,
            },
            FieldSpec {
                name: "enter",
                offset: PTR,
            },
            FieldSpec {
                name: "leave",
                offset: 2 * PTR,
            },
            FieldSpec {
                name: "pager_set_cachesize",
                offset: 3 * PTR,
            },
        ],
    };

    fn observed() -> ObservedLayout {
        observe_layout!(BtreeMethods {
            mutex_held,
            enter,
            leave,
            pager_set_cachesize
        })
    }
}

impl ShadowType for Btree {
    const CONTRACT: LayoutContract = LayoutContract {
        type_name: "Btree",
        size: 3 * PTR,
        align: PTR_ALIGN,
        fields: &[
            FieldSpec {
                name: "db",
                offset: 0,
            },
            FieldSpec {
                name: "bt",
                offset: PTR,
            },
            FieldSpec {
                name: "methods",
                offset: 2 * PTR,
            },
        ],
    };

    fn observed() -> ObservedLayout {
        observe_layout!(Btree { db, bt, methods })
    }
}

/// Layout mismatches across every shadow type in this module.
#[must_use]
pub fn layout_report() -> Vec<crate::LayoutMismatch> {
    let mut out = crate::layout::check::<Pager>();
    out.extend(crate::layout::check::<BtShared>());
    out.extend(crate::layout::check::<Db>());
    out.extend(crate::layout::check::<BtreeMethods>());
    out.extend(crate::layout::check::<Btree>());
    out
}
