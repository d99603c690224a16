//! Strategies and `Arbitrary` structs for echo canceller inputs.

use proptest::prelude::*;
use test_strategy::Arbitrary;

/// A sample rate the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum SampleRate {
    #[weight(1)]
    Hz8000,
    #[weight(1)]
    Hz16000,
    #[weight(1)]
    Hz32000,
    #[weight(1)]
    Hz44100,
    #[weight(1)]
    Hz48000,
}

impl SampleRate {
    pub fn hz(self) -> u32 {
        match self {
            Self::Hz8000 => 8000,
            Self::Hz16000 => 16000,
            Self::Hz32000 => 32000,
            Self::Hz44100 => 44100,
            Self::Hz48000 => 48000,
        }
    }

    /// Number of samples in a 10ms frame at this rate.
    pub fn frame_size(self) -> usize {
        (self.hz() / 100) as usize
    }
}

/// A small but valid engine configuration.
///
/// Sizes are kept modest so that many frames can be processed per case.
#[derive(Debug, Clone, Arbitrary)]
pub struct EngineParams {
    #[strategy(1usize..=256)]
    pub frame_size: usize,
    #[strategy(1usize..=512)]
    pub filter_length: usize,
    pub sample_rate: SampleRate,
    pub preprocess: bool,
}

/// A stream of reference/capture frame pairs for some engine configuration.
#[derive(Debug, Clone, Arbitrary)]
pub struct FrameStream {
    pub params: EngineParams,
    #[strategy(frame_pairs(#params.frame_size, 1..=6))]
    pub frames: Vec<(Vec<i16>, Vec<i16>)>,
}

/// Generate an i16 frame of exactly `frame_size` samples.
pub fn frame_i16(frame_size: usize) -> impl Strategy<Value = Vec<i16>> {
    prop::collection::vec(any::<i16>(), frame_size..=frame_size)
}

/// Generate `(reference, capture)` frame pairs.
pub fn frame_pairs(
    frame_size: usize,
    count: std::ops::RangeInclusive<usize>,
) -> impl Strategy<Value = Vec<(Vec<i16>, Vec<i16>)>> {
    prop::collection::vec((frame_i16(frame_size), frame_i16(frame_size)), count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn frame_has_requested_length(
        #[strategy(1usize..=512)] n: usize,
        #[strategy(frame_i16(#n))] frame: Vec<i16>,
    ) {
        assert_eq!(frame.len(), n);
    }

    #[proptest]
    fn engine_params_in_range(params: EngineParams) {
        assert!((1..=256).contains(&params.frame_size));
        assert!((1..=512).contains(&params.filter_length));
        assert!((8000..=48000).contains(&params.sample_rate.hz()));
    }

    #[proptest]
    fn stream_frames_match_params(stream: FrameStream) {
        assert!(!stream.frames.is_empty());
        for (reference, capture) in &stream.frames {
            assert_eq!(reference.len(), stream.params.frame_size);
            assert_eq!(capture.len(), stream.params.frame_size);
        }
    }

    #[proptest]
    fn sample_rate_frame_sizes(sr: SampleRate) {
        assert_eq!(sr.frame_size() as u32, sr.hz() / 100);
    }
}
