//! Short-time Fourier transform with 50% overlap.
//!
//! Frames of `hop` samples are analysed over a window of `2 * hop` samples.
//! The sine window is applied both before the forward transform and after
//! the inverse one; its square sums to one at 50% overlap, so an unmodified
//! spectrum reconstructs the input exactly, delayed by `hop` samples.

use std::f32::consts::PI;
use std::sync::Arc;

use realfft::num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

/// Forward and inverse real FFT of length `2 * hop` with windowing.
#[derive(derive_more::Debug)]
pub struct Stft {
    hop: usize,
    #[debug(skip)]
    window: Vec<f32>,
    #[debug(skip)]
    forward: Arc<dyn RealToComplex<f32>>,
    #[debug(skip)]
    inverse: Arc<dyn ComplexToReal<f32>>,
    #[debug(skip)]
    time: Vec<f32>,
    #[debug(skip)]
    forward_scratch: Vec<Complex32>,
    #[debug(skip)]
    inverse_scratch: Vec<Complex32>,
}

impl Stft {
    pub fn new(hop: usize) -> Self {
        debug_assert!(hop > 0);
        let size = 2 * hop;
        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let window = (0..size)
            .map(|n| (PI * (n as f32 + 0.5) / size as f32).sin())
            .collect();
        Self {
            hop,
            window,
            time: forward.make_input_vec(),
            forward_scratch: forward.make_scratch_vec(),
            inverse_scratch: inverse.make_scratch_vec(),
            forward,
            inverse,
        }
    }

    /// Transform length.
    pub fn size(&self) -> usize {
        2 * self.hop
    }

    /// Number of frequency bins, `hop + 1`.
    pub fn num_bins(&self) -> usize {
        self.hop + 1
    }

    /// A zeroed spectrum buffer.
    pub fn make_spectrum(&self) -> Vec<Complex32> {
        self.forward.make_output_vec()
    }

    /// Slides `frame` into `buffer` (length `2 * hop`) and writes the
    /// windowed spectrum of the updated buffer to `spectrum`.
    pub fn analyze(&mut self, buffer: &mut [f32], frame: &[f32], spectrum: &mut [Complex32]) {
        debug_assert_eq!(buffer.len(), self.size());
        debug_assert_eq!(frame.len(), self.hop);
        debug_assert_eq!(spectrum.len(), self.num_bins());

        buffer.copy_within(self.hop.., 0);
        buffer[self.hop..].copy_from_slice(frame);
        for ((t, &x), &w) in self.time.iter_mut().zip(buffer.iter()).zip(&self.window) {
            *t = x * w;
        }
        if let Err(e) =
            self.forward
                .process_with_scratch(&mut self.time, spectrum, &mut self.forward_scratch)
        {
            tracing::warn!("forward FFT failed: {e}");
            spectrum.fill(Complex32::new(0.0, 0.0));
        }
    }

    /// Inverse transforms `spectrum`, windows the result and overlap-adds it
    /// with `overlap` (length `hop`). Writes `hop` finished samples to `out`
    /// and keeps the second half in `overlap` for the next call.
    ///
    /// `spectrum` is used as scratch and is clobbered.
    pub fn synthesize(&mut self, spectrum: &mut [Complex32], overlap: &mut [f32], out: &mut [f32]) {
        debug_assert_eq!(spectrum.len(), self.num_bins());
        debug_assert_eq!(overlap.len(), self.hop);
        debug_assert_eq!(out.len(), self.hop);

        // DC and Nyquist of a real signal have no imaginary part.
        spectrum[0].im = 0.0;
        if let Some(last) = spectrum.last_mut() {
            last.im = 0.0;
        }
        if let Err(e) =
            self.inverse
                .process_with_scratch(spectrum, &mut self.time, &mut self.inverse_scratch)
        {
            tracing::warn!("inverse FFT failed: {e}");
            self.time.fill(0.0);
        }

        // The inverse transform is unnormalized.
        let scale = 1.0 / self.size() as f32;
        let (head, tail) = self.time.split_at(self.hop);
        let (head_window, tail_window) = self.window.split_at(self.hop);
        for (i, o) in out.iter_mut().enumerate() {
            *o = overlap[i] + head[i] * head_window[i] * scale;
        }
        for (i, o) in overlap.iter_mut().enumerate() {
            *o = tail[i] * tail_window[i] * scale;
        }
    }
}
