//! Stub generation and layout observation macros.
//!
//! `stub_fn!` generates `unsafe extern "C" fn` collaborators that record their
//! arguments into a [`StubSlot`](crate::StubSlot) and return a value chosen by
//! the slot's active mode.

/// Generate a C-ABI stub that records into a static slot.
///
/// # Usage
///
/// ```ignore
/// static HELD: StubSlot<usize> = StubSlot::new("mutex_held");
///
/// stub_fn! {
///     /// Reports the mutex as held unless the slot is in a failing mode.
///     pub fn stub_mutex_held(mutex: *mut c_void) -> c_int;
///     records HELD => mutex as usize;
///     returns 1, 0
/// }
/// ```
///
/// An optional `on_success { .. }` block runs (inside `unsafe`) only when the
/// slot selects a successful response, before the value is returned. The
/// unit-returning form has no `returns` clause.
#[macro_export]
macro_rules! stub_fn {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) -> $ret:ty;
        records $slot:path => $capture:expr;
        $(on_success $effect:block)?
        returns $ok:expr, $fail:expr $(;)?
    ) => {
        $(#[$meta])*
        #[allow(unused_unsafe)]
        $vis unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            let response = $slot.record($capture);
            $(
                if !response.is_fail() {
                    unsafe { $effect }
                }
            )?
            response.select($ok, $fail)
        }
    };

    // Variant without return type (returns ())
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident( $($arg:ident : $argty:ty),* $(,)? );
        records $slot:path => $capture:expr;
        $(on_success $effect:block)?
    ) => {
        $(#[$meta])*
        #[allow(unused_unsafe)]
        $vis unsafe extern "C" fn $name( $($arg : $argty),* ) {
            let response = $slot.record($capture);
            $(
                if !response.is_fail() {
                    unsafe { $effect }
                }
            )?
            let _ = response;
        }
    };
}

/// Observe the compiled layout of a `#[repr(C)]` type.
///
/// ```ignore
/// let observed = observe_layout!(Pager { cache_size, spill_size });
/// ```
#[macro_export]
macro_rules! observe_layout {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        $crate::layout::ObservedLayout {
            size: ::core::mem::size_of::<$ty>(),
            align: ::core::mem::align_of::<$ty>(),
            fields: vec![
                $(
                    $crate::layout::FieldSpec {
                        name: stringify!($field),
                        offset: ::core::mem::offset_of!($ty, $field),
                    }
                ),*
            ],
        }
    };
}
