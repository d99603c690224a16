//! Property-based test support for the echo canceller crates.
//!
//! Provides `Arbitrary` engine configurations, frame strategies,
//! deterministic synthetic signals (white noise, tones, echo paths) and
//! comparison helpers.
//!
//! # Usage
//!
//! ```ignore
//! use aec_proptest::generators::*;
//! use test_strategy::proptest;
//!
//! #[proptest]
//! fn my_test(params: EngineParams) {
//!     assert!(params.frame_size > 0);
//! }
//! ```

pub mod comparison;
pub mod generators;
pub mod signals;

pub use proptest;
pub use test_strategy;
