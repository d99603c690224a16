//! Sliding history of reference samples.

use aec_common_audio::audio_util::s16_to_float_s16_slice;

/// The most recent `filter_length - 1 + frame_size` reference samples,
/// oldest first, in FloatS16.
///
/// After [`push_frame`](Self::push_frame) the newest frame occupies the
/// tail, and every sample of that frame has a full `filter_length` window
/// of history behind it. Starts zero-filled.
#[derive(derive_more::Debug, Clone)]
pub struct ReferenceHistory {
    filter_length: usize,
    frame_size: usize,
    #[debug(skip)]
    samples: Vec<f64>,
}

impl ReferenceHistory {
    pub fn new(filter_length: usize, frame_size: usize) -> Self {
        debug_assert!(filter_length > 0);
        debug_assert!(frame_size > 0);
        Self {
            filter_length,
            frame_size,
            samples: vec![0.0; filter_length - 1 + frame_size],
        }
    }

    pub fn filter_length(&self) -> usize {
        self.filter_length
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Drops the oldest `frame_size` samples and appends `frame`.
    pub fn push_frame(&mut self, frame: &[i16]) {
        debug_assert_eq!(frame.len(), self.frame_size);
        let len = self.samples.len();
        self.samples.copy_within(self.frame_size..len, 0);
        s16_to_float_s16_slice(frame, &mut self.samples[len - self.frame_size..]);
    }

    /// The `filter_length` samples ending at sample `n` of the newest frame,
    /// oldest first.
    #[inline]
    pub fn window(&self, n: usize) -> &[f64] {
        debug_assert!(n < self.frame_size);
        &self.samples[n..n + self.filter_length]
    }

    /// The sample that leaves the window when moving from `n - 1` to `n`.
    #[inline]
    pub(crate) fn departing(&self, n: usize) -> f64 {
        debug_assert!(n >= 1 && n < self.frame_size);
        self.samples[n - 1]
    }
}
