//! Suite for `focal_btree_set_cache_size` driven through recording stubs.
//!
//! Each case builds a heap fixture (pager, shared B-tree, connection, handle)
//! wired to a static method table of `stub_fn!` stubs, then takes exclusive
//! scopes on every stub slot. Scopes are always taken in the same order.

use std::ffi::c_void;
use std::ptr;

use focalkit_abi::btree::{
    self, Btree, BtreeMethods, BtShared, Db, MUTEX_ASSERTION, Pager, SQLITE_MISUSE, SQLITE_OK,
    focal_btree_set_cache_size,
};
use focalkit_abi::{SlotScope, StubSlot, stub_fn};
use focalkit_harness::{
    Crash, CrashGuard, FixtureBuilder, StubMode, Suite, TestContext, expect_eq, expect_false,
    expect_not_null, expect_true,
};
use libc::c_int;

pub const SUITE: &str = "btree_cache_size";

/// Address handed out as the connection mutex. Never dereferenced.
const MUTEX_TOKEN: usize = 0xA110;

static MUTEX_HELD: StubSlot<usize> = StubSlot::new("sqlite3_mutex_held");
static ENTER: StubSlot<usize> = StubSlot::new("sqlite3BtreeEnter");
static LEAVE: StubSlot<usize> = StubSlot::new("sqlite3BtreeLeave");
static SET_CACHESIZE: StubSlot<(usize, c_int)> = StubSlot::new("sqlite3PagerSetCachesize");

stub_fn! {
    fn stub_mutex_held(mutex: *mut c_void) -> c_int;
    records MUTEX_HELD => mutex as usize;
    returns 1, 0
}

stub_fn! {
    fn stub_enter(p: *mut Btree);
    records ENTER => p as usize;
}

stub_fn! {
    fn stub_leave(p: *mut Btree);
    records LEAVE => p as usize;
}

stub_fn! {
    fn stub_set_cachesize(pager: *mut Pager, mx_page: c_int);
    records SET_CACHESIZE => (pager as usize, mx_page);
    on_success {
        if !pager.is_null() {
            (*pager).cache_size = mx_page;
        }
    }
}

static METHODS: BtreeMethods = BtreeMethods {
    mutex_held: stub_mutex_held,
    enter: stub_enter,
    leave: stub_leave,
    pager_set_cachesize: stub_set_cachesize,
};

/// Exclusive use of every stub slot for one case.
struct Slots {
    held: SlotScope<'static, usize>,
    enter: SlotScope<'static, usize>,
    leave: SlotScope<'static, usize>,
    set: SlotScope<'static, (usize, c_int)>,
}

fn acquire_slots() -> Slots {
    Slots {
        held: MUTEX_HELD.scope(),
        enter: ENTER.scope(),
        leave: LEAVE.scope(),
        set: SET_CACHESIZE.scope(),
    }
}

/// Heap-allocated object graph behind one B-tree handle.
pub struct BtreeFixture {
    pager: *mut Pager,
    shared: *mut BtShared,
    db: *mut Db,
    btree: *mut Btree,
}

impl BtreeFixture {
    #[must_use]
    pub fn new(pager: Pager) -> Self {
        let pager = Box::into_raw(Box::new(pager));
        let shared = Box::into_raw(Box::new(BtShared {
            pager,
            page_size: 4096,
        }));
        let db = Box::into_raw(Box::new(Db {
            mutex: ptr::without_provenance_mut(MUTEX_TOKEN),
            ..Db::default()
        }));
        let btree = Box::into_raw(Box::new(Btree {
            db,
            bt: shared,
            methods: &METHODS,
        }));
        Self {
            pager,
            shared,
            db,
            btree,
        }
    }

    #[must_use]
    pub fn handle(&self) -> *mut Btree {
        self.btree
    }

    #[must_use]
    pub fn pager_addr(&self) -> usize {
        self.pager as usize
    }

    #[must_use]
    pub fn cache_size(&self) -> c_int {
        // SAFETY: `pager` is owned by this fixture until drop.
        unsafe { (*self.pager).cache_size }
    }

    /// Call the focal function on this fixture's handle.
    pub fn set_cache_size(&self, mx_page: c_int) -> c_int {
        // SAFETY: every pointer in the graph is live until drop.
        unsafe { focal_btree_set_cache_size(self.btree, mx_page) }
    }
}

impl Default for BtreeFixture {
    fn default() -> Self {
        Self::new(Pager::default())
    }
}

impl Drop for BtreeFixture {
    fn drop(&mut self) {
        // SAFETY: each pointer came from `Box::into_raw` in `new` and is freed once.
        unsafe {
            drop(Box::from_raw(self.btree));
            drop(Box::from_raw(self.db));
            drop(Box::from_raw(self.shared));
            drop(Box::from_raw(self.pager));
        }
    }
}

fn set_and_verify(ctx: &mut TestContext<'_>, mx_page: c_int) {
    let slots = acquire_slots();
    let fixture = BtreeFixture::default();
    expect_not_null!(ctx, fixture.handle());

    let rc = fixture.set_cache_size(mx_page);
    expect_eq!(ctx, rc, SQLITE_OK);
    expect_eq!(ctx, fixture.cache_size(), mx_page);
    expect_eq!(ctx, slots.held.calls(), vec![MUTEX_TOKEN]);
    expect_eq!(ctx, slots.enter.calls(), vec![fixture.handle() as usize]);
    expect_eq!(ctx, slots.leave.calls(), vec![fixture.handle() as usize]);
    expect_eq!(
        ctx,
        slots.set.last(),
        Some((fixture.pager_addr(), mx_page)),
        "pager receives the requested size"
    );
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

fn normal_value(ctx: &mut TestContext<'_>) {
    set_and_verify(ctx, 1234);
}

fn zero_value(ctx: &mut TestContext<'_>) {
    set_and_verify(ctx, 0);
}

fn max_value(ctx: &mut TestContext<'_>) {
    set_and_verify(ctx, c_int::MAX);
}

fn mutex_not_held(ctx: &mut TestContext<'_>) {
    let slots = acquire_slots();
    slots.held.set_mode(StubMode::AlwaysFail);
    let fixture = BtreeFixture::default();

    // The assertion is the expected outcome; keep it off the panic hook.
    let mut guard = CrashGuard::quiet();
    let result = guard.run(|| fixture.set_cache_size(500));
    match result {
        Err(Crash::Panic { message }) => {
            expect_eq!(ctx, message.as_str(), MUTEX_ASSERTION);
        }
        other => {
            expect_true!(ctx, false, "expected an assertion crash, got {other:?}");
        }
    }
    expect_eq!(ctx, guard.jumps(), 1);
    expect_true!(ctx, guard.fatal_called());
    expect_eq!(ctx, slots.held.count(), 1);
    expect_false!(ctx, slots.enter.was_called(), "enter skipped");
    expect_false!(ctx, slots.set.was_called(), "pager untouched");
    expect_eq!(ctx, fixture.cache_size(), 0);
}

fn pager_fails_on_second_call(ctx: &mut TestContext<'_>) {
    let slots = acquire_slots();
    slots.set.set_mode(StubMode::FailOnCall(2));
    let fixture = BtreeFixture::default();

    expect_eq!(ctx, fixture.set_cache_size(10), SQLITE_OK);
    expect_eq!(ctx, fixture.set_cache_size(20), SQLITE_OK);
    expect_eq!(ctx, slots.set.count(), 2);
    expect_eq!(ctx, fixture.cache_size(), 10, "second update was not applied");
    expect_eq!(ctx, slots.enter.count(), 2);
    expect_eq!(ctx, slots.leave.count(), 2);
}

fn guarded_success(ctx: &mut TestContext<'_>) {
    let slots = acquire_slots();
    let pager = FixtureBuilder::<Pager>::zeroed()
        .set(|p| p.spill_size = 64)
        .build();
    let fixture = BtreeFixture::new(pager);

    let mut guard = CrashGuard::new();
    let result = guard.run(|| fixture.set_cache_size(77));
    expect_eq!(ctx, result, Ok(SQLITE_OK));
    expect_eq!(ctx, guard.checkpoints(), 1);
    expect_false!(ctx, guard.fatal_called());
    expect_eq!(ctx, fixture.cache_size(), 77);
    expect_eq!(ctx, slots.held.count(), 1);
}

fn null_handles(ctx: &mut TestContext<'_>) {
    let slots = acquire_slots();
    // SAFETY: null handles are rejected before any dereference.
    let rc = unsafe { focal_btree_set_cache_size(ptr::null_mut(), 10) };
    expect_eq!(ctx, rc, SQLITE_MISUSE);

    let mut detached = Btree {
        methods: &METHODS,
        ..Btree::default()
    };
    // SAFETY: `detached` is live; its null connection is rejected.
    let rc = unsafe { focal_btree_set_cache_size(&mut detached, 10) };
    expect_eq!(ctx, rc, SQLITE_MISUSE, "null connection is misuse");

    let mut db = Db {
        mutex: ptr::without_provenance_mut(MUTEX_TOKEN),
        ..Db::default()
    };
    let mut unshared = Btree {
        db: &mut db,
        methods: &METHODS,
        ..Btree::default()
    };
    // SAFETY: `unshared` and `db` are live; the null shared B-tree is rejected.
    let rc = unsafe { focal_btree_set_cache_size(&mut unshared, 10) };
    expect_eq!(ctx, rc, SQLITE_MISUSE, "null shared B-tree is misuse");

    expect_false!(ctx, slots.held.was_called());
    expect_false!(ctx, slots.enter.was_called());
    expect_false!(ctx, slots.set.was_called());
}

fn layout_contracts(ctx: &mut TestContext<'_>) {
    let report = btree::layout_report();
    for mismatch in &report {
        ctx.note(mismatch.to_string());
    }
    expect_true!(ctx, report.is_empty(), "{} layout mismatches", report.len());
}

#[must_use]
pub fn suite() -> Suite {
    Suite::new(SUITE, "sqlite3BtreeSetCacheSize")
        .case("normal_value", "cache size 1234 reaches the pager", normal_value)
        .case("zero_value", "cache size 0 reaches the pager", zero_value)
        .case("max_value", "INT_MAX reaches the pager", max_value)
        .case(
            "mutex_not_held",
            "an unheld mutex trips the assertion before any side effect",
            mutex_not_held,
        )
        .case(
            "pager_fails_on_second_call",
            "a failing pager stub keeps the first update",
            pager_fails_on_second_call,
        )
        .case(
            "guarded_success",
            "a guarded call that returns does not count as fatal",
            guarded_success,
        )
        .case(
            "null_handles",
            "null handle, connection or shared B-tree is misuse",
            null_handles,
        )
        .case("layout_contracts", "shadow types match their C layouts", layout_contracts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_graph_is_wired() {
        let _slots = acquire_slots();
        let fixture = BtreeFixture::default();
        let btree = unsafe { &*fixture.handle() };
        assert_eq!(btree.bt, fixture.shared);
        assert_eq!(btree.db, fixture.db);
        assert!(ptr::eq(btree.methods, &METHODS));
        assert_eq!(fixture.set_cache_size(5), SQLITE_OK);
        assert_eq!(fixture.cache_size(), 5);
    }
}
