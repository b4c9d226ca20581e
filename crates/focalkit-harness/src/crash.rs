//! Crash survival for focal calls.
//!
//! [`CrashGuard::run`] sets a checkpoint, runs a closure, and turns a panic or
//! a [`raise_fatal`] unwind into `Err(Crash)`. The guard counts checkpoints
//! and jumps so a test can assert that an expected fatal path was taken
//! exactly once.
//!
//! Nothing mutated between the checkpoint and the jump is rolled back.
//! Callers that inspect shared state after a jump see it as the crashed code
//! left it.
//!
//! A quiet guard keeps the process panic hook from printing while its own
//! closure runs, for calls that are expected to crash.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Once;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

/// Typed unwind payload for a library fatal-error callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalSignal {
    pub source: &'static str,
    pub message: String,
}

/// Unwind out of the current focal call with a [`FatalSignal`].
///
/// Uses `resume_unwind`, so the panic hook does not run and nothing is
/// printed.
pub fn raise_fatal(source: &'static str, message: impl Into<String>) -> ! {
    panic::resume_unwind(Box::new(FatalSignal {
        source,
        message: message.into(),
    }))
}

/// What a guarded call died of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crash {
    Fatal(FatalSignal),
    Panic { message: String },
}

impl Crash {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Fatal(signal) => &signal.message,
            Self::Panic { message } => message,
        }
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl fmt::Display for Crash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(signal) => write!(f, "fatal from {}: {}", signal.source, signal.message),
            Self::Panic { message } => write!(f, "panic: {message}"),
        }
    }
}

/// Best-effort text of a panic payload.
#[must_use]
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(signal) = payload.downcast_ref::<FatalSignal>() {
        return signal.message.clone();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    "<non-string panic payload>".to_string()
}

/// Classify an unwind payload.
#[must_use]
pub fn classify(payload: Box<dyn Any + Send>) -> Crash {
    match payload.downcast::<FatalSignal>() {
        Ok(signal) => Crash::Fatal(*signal),
        Err(other) => Crash::Panic {
            message: payload_message(other.as_ref()),
        },
    }
}

thread_local! {
    static SILENCED: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the current panic hook once so it is skipped on silenced threads.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !SILENCED.try_with(Cell::get).unwrap_or(false) {
                previous(info);
            }
        }));
    });
}

/// Checkpoint/jump counter around guarded calls.
#[derive(Debug, Default)]
pub struct CrashGuard {
    checkpoints: u32,
    jumps: u32,
    last: Option<Crash>,
    quiet: bool,
}

impl CrashGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard whose calls do not reach the panic hook. Other threads still do.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Run `f` behind a checkpoint.
    pub fn run<T>(&mut self, f: impl FnOnce() -> T) -> Result<T, Crash> {
        self.checkpoints += 1;
        let outcome = if self.quiet {
            install_quiet_hook();
            let outer = SILENCED.replace(true);
            let outcome = panic::catch_unwind(AssertUnwindSafe(f));
            SILENCED.set(outer);
            outcome
        } else {
            panic::catch_unwind(AssertUnwindSafe(f))
        };
        match outcome {
            Ok(value) => Ok(value),
            Err(payload) => {
                let crash = classify(payload);
                self.jumps += 1;
                self.last = Some(crash.clone());
                Err(crash)
            }
        }
    }

    #[must_use]
    pub fn checkpoints(&self) -> u32 {
        self.checkpoints
    }

    #[must_use]
    pub fn jumps(&self) -> u32 {
        self.jumps
    }

    /// True once any guarded call has crashed.
    #[must_use]
    pub fn fatal_called(&self) -> bool {
        self.jumps > 0
    }

    #[must_use]
    pub fn last_crash(&self) -> Option<&Crash> {
        self.last.as_ref()
    }

    /// Zero the counters, keeping quiet mode.
    pub fn reset(&mut self) {
        *self = Self {
            quiet: self.quiet,
            ..Self::default()
        };
    }
}

/// Error returned by a [`FatalHook`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fatal: {message}")]
pub struct FatalError {
    pub message: String,
}

/// Non-unwinding fatal callback for Rust-native focal code.
///
/// The focal code calls [`FatalHook::fire`] and returns the error with `?`.
#[derive(Debug, Default)]
pub struct FatalHook {
    fired: Cell<u32>,
    last: RefCell<Option<String>>,
}

impl FatalHook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self, message: impl Into<String>) -> FatalError {
        let message = message.into();
        self.fired.set(self.fired.get() + 1);
        *self.last.borrow_mut() = Some(message.clone());
        FatalError { message }
    }

    #[must_use]
    pub fn fired(&self) -> u32 {
        self.fired.get()
    }

    #[must_use]
    pub fn fatal_called(&self) -> bool {
        self.fired.get() > 0
    }

    #[must_use]
    pub fn last_message(&self) -> Option<String> {
        self.last.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_call_leaves_fatal_unset() {
        let mut guard = CrashGuard::new();
        assert_eq!(guard.run(|| 7), Ok(7));
        assert_eq!(guard.checkpoints(), 1);
        assert_eq!(guard.jumps(), 0);
        assert!(!guard.fatal_called());
    }

    #[test]
    fn raised_fatal_is_one_jump() {
        let mut guard = CrashGuard::new();
        let result: Result<(), Crash> = guard.run(|| raise_fatal("png", "bad CRC"));
        let crash = result.unwrap_err();
        assert!(crash.is_fatal());
        assert_eq!(crash.message(), "bad CRC");
        assert_eq!(guard.jumps(), 1);
        assert!(guard.fatal_called());
        assert_eq!(crash.to_string(), "fatal from png: bad CRC");
    }

    #[test]
    fn panics_are_classified_with_their_message() {
        let mut guard = CrashGuard::new();
        let result: Result<(), Crash> = guard.run(|| panic!("index {} out of range", 3));
        assert_eq!(
            result.unwrap_err(),
            Crash::Panic {
                message: "index 3 out of range".into()
            }
        );
        assert!(guard.last_crash().is_some());
    }

    #[test]
    fn state_between_checkpoint_and_jump_is_kept() {
        let mut guard = CrashGuard::new();
        let mut touched = 0;
        let _ = guard.run(|| {
            touched = 1;
            raise_fatal("test", "after write");
        });
        assert_eq!(touched, 1);
    }

    #[test]
    fn fatal_hook_counts_without_unwinding() {
        fn focal(hook: &FatalHook, bad: bool) -> Result<u8, FatalError> {
            if bad {
                return Err(hook.fire("invalid header"));
            }
            Ok(1)
        }
        let hook = FatalHook::new();
        assert_eq!(focal(&hook, false), Ok(1));
        assert!(!hook.fatal_called());
        let err = focal(&hook, true).unwrap_err();
        assert_eq!(err.to_string(), "fatal: invalid header");
        assert_eq!(hook.fired(), 1);
        assert_eq!(hook.last_message().as_deref(), Some("invalid header"));
    }

    #[test]
    fn quiet_guard_still_classifies_and_restores_the_thread_flag() {
        let mut guard = CrashGuard::quiet();
        let result: Result<(), Crash> = guard.run(|| panic!("expected assertion"));
        assert_eq!(result.unwrap_err().message(), "expected assertion");
        assert_eq!(guard.jumps(), 1);
        assert!(!SILENCED.with(Cell::get));
        guard.reset();
        assert!(guard.is_quiet());
        assert_eq!(guard.jumps(), 0);
    }

    #[test]
    fn nested_quiet_guards_restore_the_outer_state() {
        let mut outer = CrashGuard::quiet();
        let inner_result = outer.run(|| {
            let mut inner = CrashGuard::quiet();
            let _ = inner.run(|| raise_fatal("inner", "x"));
            SILENCED.with(Cell::get)
        });
        assert_eq!(inner_result, Ok(true));
        assert!(!SILENCED.with(Cell::get));
    }
}
