//! Acoustic echo cancellation engine.
//!
//! Removes the echo of a known loudspeaker (reference) signal from a
//! microphone (capture) signal, frame by frame. An NLMS filter estimates the
//! echo path, a step-size controller keeps it from adapting to near-end
//! speech, and an optional spectral suppressor removes residual echo and
//! stationary noise.
//!
//! The crate exposes both a Rust API ([`EchoCanceller`]) and a C ABI
//! ([`ffi`]), whose header is generated into `include/aec.h`.

pub mod config;
pub mod ffi;
pub mod stats;

mod echo_canceller;

pub use aec_filter::AdaptationConfig;
pub use aec_preprocess::PreprocessConfig;
pub use config::Config;
pub use echo_canceller::{EchoCanceller, EchoCancellerBuilder, Error};
pub use stats::EchoCancellerStats;
