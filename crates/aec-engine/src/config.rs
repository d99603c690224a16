//! Echo canceller configuration.

use aec_filter::AdaptationConfig;
use aec_preprocess::PreprocessConfig;

/// Default frame size, 10 ms at 16 kHz.
pub const DEFAULT_FRAME_SIZE: usize = 160;

/// Default filter length, 64 ms at 16 kHz.
pub const DEFAULT_FILTER_LENGTH: usize = 1024;

pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;

/// Largest accepted frame size in samples, 100 ms at 48 kHz.
pub const MAX_FRAME_SIZE: usize = 4800;

/// Largest accepted filter length in taps, 170 ms at 48 kHz or 512 ms at
/// 16 kHz.
///
/// Processing costs about `4 * filter_length` multiply-adds per sample: the
/// foreground and background filters each run a dot product and a tap
/// update. At this length and 48 kHz that is 1.6e9 per second of audio.
pub const MAX_FILTER_LENGTH: usize = 8192;

/// Top-level configuration of an [`EchoCanceller`](crate::EchoCanceller).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Samples per frame, for both the reference and the capture signal.
    pub frame_size: usize,
    /// Echo path span in samples.
    pub filter_length: usize,
    pub sample_rate_hz: u32,
    /// Adaptive filter settings.
    pub adaptation: AdaptationConfig,
    /// Residual echo and noise suppressor settings.
    pub preprocess: PreprocessConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            filter_length: DEFAULT_FILTER_LENGTH,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            adaptation: AdaptationConfig::default(),
            preprocess: PreprocessConfig::default(),
        }
    }
}
