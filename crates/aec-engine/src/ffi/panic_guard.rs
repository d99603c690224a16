//! Keeps panics from unwinding into C callers.
//!
//! `ffi_guard!` runs a function body under [`std::panic::catch_unwind`] and
//! substitutes a fallback value if it panics. Without an explicit fallback
//! the body must produce an [`AecError`](super::types::AecError) and a panic
//! becomes `AecError::Internal`. Constructors pass `or ptr::null_mut();` so
//! that a panic yields a null handle.
//!
//! A `return` inside the body leaves the guarded closure, so argument checks
//! can return their error code early:
//!
//! ```ignore
//! pub extern "C" fn aec_cancel_echo(aec: *mut Aec, ...) -> AecError {
//!     ffi_guard! {
//!         if aec.is_null() {
//!             return AecError::NullPointer;
//!         }
//!         AecError::None
//!     }
//! }
//! ```

macro_rules! ffi_guard {
    (or $fallback:expr; $($body:tt)*) => {{
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || { $($body)* })) {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("panic caught at the C API boundary");
                $fallback
            }
        }
    }};
    ($($body:tt)*) => {
        $crate::ffi::panic_guard::ffi_guard!(or $crate::ffi::types::AecError::Internal; $($body)*)
    };
}

pub(crate) use ffi_guard;
