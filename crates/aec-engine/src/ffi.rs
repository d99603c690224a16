//! C-compatible FFI layer for the echo canceller.
//!
//! This module exposes `extern "C"` functions and `#[repr(C)]` types that
//! allow C and C++ consumers to create an echo canceller, feed it frames and
//! destroy it.
//!
//! # Symbol prefix
//!
//! - Functions: `aec_*`
//! - Types: `Aec*`
//!
//! # Thread safety
//!
//! **NOT thread-safe.** All calls on the same [`Aec`](types::Aec) handle
//! must be serialized by the caller. Distinct handles are independent.

pub mod types;

pub mod functions;
mod panic_guard;
