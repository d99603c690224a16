//! Time-domain normalized least-mean-squares echo path filter.
//!
//! Per sample `n` of a frame, with `x(n)` the reference window ending at `n`:
//!
//! ```text
//! y(n) = w · x(n)
//! e(n) = d(n) - y(n)
//! w   += rate · e(n) · x(n) / (|x(n)|² + eps)
//! ```
//!
//! `|x(n)|²` is computed exactly at the start of every frame and then
//! updated recursively as the window slides, so rounding error cannot
//! accumulate across frames.

use aec_common_audio::audio_util::{energy, s16_to_float_s16};

use crate::history::ReferenceHistory;

/// Per-tap regularisation added to the window power, the FloatS16 energy of
/// a -70 dBFS sample.
pub const REGULARIZATION_PER_TAP: f64 = 107.4;

/// Mean per-sample powers observed while filtering one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameEnergies {
    /// Reference power averaged over the filter windows of the frame.
    pub far: f64,
    /// Microphone power.
    pub mic: f64,
    /// Echo estimate power.
    pub echo: f64,
    /// Residual (microphone minus echo estimate) power.
    pub residual: f64,
}

/// Adaptive FIR estimate of the echo path.
#[derive(derive_more::Debug, Clone)]
pub struct NlmsFilter {
    #[debug(skip)]
    taps: Vec<f64>,
    regularization: f64,
}

impl NlmsFilter {
    /// Creates a filter with `filter_length` zero taps.
    pub fn new(filter_length: usize) -> Self {
        debug_assert!(filter_length > 0);
        Self {
            taps: vec![0.0; filter_length],
            regularization: filter_length as f64 * REGULARIZATION_PER_TAP,
        }
    }

    pub fn filter_length(&self) -> usize {
        self.taps.len()
    }

    /// Current echo path estimate, oldest reference sample first.
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Overwrites the taps with those of another filter of the same length.
    pub(crate) fn set_filter(&mut self, taps: &[f64]) {
        debug_assert_eq!(taps.len(), self.taps.len());
        self.taps.copy_from_slice(taps);
    }

    /// Filters one frame and adapts the taps sample by sample.
    ///
    /// `history` must already contain the reference frame that is aligned
    /// with `mic`. Writes the residual to `error` and the echo estimate to
    /// `echo`, both in FloatS16. `adaptation_rate` is the effective step
    /// size; zero freezes the taps.
    pub fn process(
        &mut self,
        history: &ReferenceHistory,
        mic: &[i16],
        adaptation_rate: f64,
        error: &mut [f64],
        echo: &mut [f64],
    ) -> FrameEnergies {
        let frame_size = history.frame_size();
        debug_assert_eq!(history.filter_length(), self.taps.len());
        debug_assert_eq!(mic.len(), frame_size);
        debug_assert_eq!(error.len(), frame_size);
        debug_assert_eq!(echo.len(), frame_size);
        debug_assert!(adaptation_rate >= 0.0);

        let filter_length = self.taps.len();
        let mut power = energy(history.window(0));
        let mut sums = FrameEnergies::default();

        for n in 0..frame_size {
            let window = history.window(n);
            if n > 0 {
                let incoming = window[filter_length - 1];
                let outgoing = history.departing(n);
                power = (power + incoming * incoming - outgoing * outgoing).max(0.0);
            }

            let estimate = dot(&self.taps, window);
            let near = s16_to_float_s16(mic[n]);
            let residual = near - estimate;

            if adaptation_rate > 0.0 && residual != 0.0 {
                let gain = adaptation_rate * residual / (power + self.regularization);
                for (tap, &x) in self.taps.iter_mut().zip(window) {
                    *tap += gain * x;
                }
            }

            echo[n] = estimate;
            error[n] = residual;

            sums.far += power;
            sums.mic += near * near;
            sums.echo += estimate * estimate;
            sums.residual += residual * residual;
        }

        let scale = 1.0 / frame_size as f64;
        FrameEnergies {
            far: sums.far * scale / filter_length as f64,
            mic: sums.mic * scale,
            echo: sums.echo * scale,
            residual: sums.residual * scale,
        }
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
