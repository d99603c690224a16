//! Residual echo and noise suppression.
//!
//! Runs after the adaptive filter on its residual. Each frame is analysed
//! with a 50% overlapped short-time Fourier transform, a per-bin gain is
//! derived from a noise estimate and a residual echo model, and the frame is
//! resynthesised by overlap-add. Output lags the input by one frame.

pub mod config;
pub mod noise_estimator;
pub mod preprocessor;
pub mod stft;
pub mod suppression_gain;

pub use config::PreprocessConfig;
pub use preprocessor::Preprocessor;
