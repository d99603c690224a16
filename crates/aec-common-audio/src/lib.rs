//! Common audio utilities for the echo canceller.
//!
//! Sample format conversions between the i16 boundary format and the
//! floating point formats used internally, dB helpers, and exponential
//! smoothers whose time constants are expressed in milliseconds.

pub mod audio_util;
pub mod smoothing;
