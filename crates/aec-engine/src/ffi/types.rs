//! C-compatible type definitions for the echo canceller C API.

use crate::EchoCanceller;

// ---------------------------------------------------------------------------
// Error codes
// ---------------------------------------------------------------------------

/// Error codes returned by C API functions.
///
/// `0` = success, negative = error.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AecError {
    /// Operation succeeded.
    None = 0,
    /// Null pointer passed to a function that requires non-null.
    NullPointer = -1,
    /// Internal error (panic caught at FFI boundary).
    Internal = -2,
    /// Buffer length differs from the frame size the instance was created
    /// with.
    BadFrameLength = -3,
    /// The output buffer partially overlaps an input buffer.
    OverlappingBuffers = -4,
}

impl From<crate::Error> for AecError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::BadFrameLength => Self::BadFrameLength,
            // Configuration errors surface as a null handle from `aec_new`.
            _ => Self::Internal,
        }
    }
}

// ---------------------------------------------------------------------------
// Opaque handle
// ---------------------------------------------------------------------------

/// Opaque handle to an echo canceller instance.
///
/// Created via `aec_new()`. Destroyed via `aec_destroy()`.
///
/// **NOT thread-safe**: all calls on the same handle must be serialized.
pub struct Aec {
    pub(crate) inner: EchoCanceller,
}
