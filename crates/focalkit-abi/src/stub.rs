//! Static call-recorder slots for C-ABI stubs.
//!
//! An `extern "C"` stub has no closure environment, so its recorder lives in
//! a `static`. Tests take a [`SlotScope`] before arranging the slot: the
//! scope serializes users of the slot and resets it on entry and on drop, so
//! recorded calls never leak from one case into the next.

use std::ops::Deref;

use focalkit_harness::{CallRecorder, StubMode, StubResponse};
use parking_lot::{Mutex, MutexGuard, const_mutex};

pub struct StubSlot<C> {
    name: &'static str,
    recorder: Mutex<CallRecorder<C>>,
    scope_lock: Mutex<()>,
}

impl<C> StubSlot<C> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            recorder: const_mutex(CallRecorder::new()),
            scope_lock: const_mutex(()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Record one call. Called from stub bodies.
    pub fn record(&self, call: C) -> StubResponse {
        self.recorder.lock().record(call)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.recorder.lock().count()
    }

    #[must_use]
    pub fn was_called(&self) -> bool {
        self.recorder.lock().was_called()
    }

    pub fn set_mode(&self, mode: StubMode) {
        self.recorder.lock().set_mode(mode);
    }

    #[must_use]
    pub fn mode(&self) -> StubMode {
        self.recorder.lock().mode()
    }

    pub fn reset(&self) {
        self.recorder.lock().reset();
    }

    /// Exclusive, reset-on-entry-and-exit use of this slot.
    pub fn scope(&self) -> SlotScope<'_, C> {
        let lock = self.scope_lock.lock();
        self.reset();
        SlotScope { slot: self, _lock: lock }
    }
}

impl<C: Clone> StubSlot<C> {
    #[must_use]
    pub fn last(&self) -> Option<C> {
        self.recorder.lock().last().cloned()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<C> {
        self.recorder.lock().calls().to_vec()
    }
}

/// Guard returned by [`StubSlot::scope`].
pub struct SlotScope<'a, C> {
    slot: &'a StubSlot<C>,
    _lock: MutexGuard<'a, ()>,
}

impl<C> Deref for SlotScope<'_, C> {
    type Target = StubSlot<C>;

    fn deref(&self) -> &StubSlot<C> {
        self.slot
    }
}

impl<C> Drop for SlotScope<'_, C> {
    fn drop(&mut self) {
        self.slot.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SLOT: StubSlot<(usize, i32)> = StubSlot::new("test_slot");

    #[test]
    fn scope_resets_on_entry_and_exit() {
        SLOT.record((1, 1));
        {
            let slot = SLOT.scope();
            assert_eq!(slot.count(), 0);
            slot.set_mode(StubMode::FailOnCall(2));
            assert_eq!(slot.record((0x10, 5)), StubResponse::Succeed);
            assert_eq!(slot.record((0x20, 6)), StubResponse::Fail);
            assert_eq!(slot.last(), Some((0x20, 6)));
            assert_eq!(slot.calls().len(), 2);
        }
        let slot = SLOT.scope();
        assert_eq!(slot.count(), 0);
        assert_eq!(slot.mode(), StubMode::AlwaysSucceed);
        assert_eq!(slot.name(), "test_slot");
    }
}
