//! Residual echo and noise suppressor.

use aec_common_audio::audio_util::float_s16_f32_to_s16_slice;
use realfft::num_complex::Complex32;

use crate::config::PreprocessConfig;
use crate::noise_estimator::NoiseEstimator;
use crate::stft::Stft;
use crate::suppression_gain::SuppressionGain;

/// Suppresses stationary noise and the residual echo left by the adaptive
/// filter.
///
/// The residual echo in each bin is modelled as `leak * |Y|^2`, where `Y` is
/// the spectrum of the filter's echo estimate and `leak` the ratio of
/// residual to echo-estimate power reported by the step-size controller.
/// The output is delayed by one frame relative to the input.
#[derive(derive_more::Debug)]
pub struct Preprocessor {
    frame_size: usize,
    stft: Stft,
    noise_estimator: NoiseEstimator,
    suppression_gain: SuppressionGain,
    #[debug(skip)]
    residual_buffer: Vec<f32>,
    #[debug(skip)]
    echo_buffer: Vec<f32>,
    #[debug(skip)]
    overlap: Vec<f32>,
    #[debug(skip)]
    residual_spectrum: Vec<Complex32>,
    #[debug(skip)]
    echo_spectrum: Vec<Complex32>,
    #[debug(skip)]
    observed: Vec<f32>,
    #[debug(skip)]
    echo_power: Vec<f32>,
    #[debug(skip)]
    noise_input: Vec<f32>,
    #[debug(skip)]
    frame: Vec<f32>,
}

impl Preprocessor {
    pub fn new(frame_size: usize, sample_rate_hz: u32, config: &PreprocessConfig) -> Self {
        let stft = Stft::new(frame_size);
        let num_bins = stft.num_bins();
        Self {
            frame_size,
            noise_estimator: NoiseEstimator::new(num_bins, frame_size, sample_rate_hz),
            suppression_gain: SuppressionGain::new(num_bins, config),
            residual_buffer: vec![0.0; stft.size()],
            echo_buffer: vec![0.0; stft.size()],
            overlap: vec![0.0; frame_size],
            residual_spectrum: stft.make_spectrum(),
            echo_spectrum: stft.make_spectrum(),
            observed: vec![0.0; num_bins],
            echo_power: vec![0.0; num_bins],
            noise_input: vec![0.0; num_bins],
            frame: vec![0.0; frame_size],
            stft,
        }
    }

    /// Processes one frame.
    ///
    /// `residual` and `echo` are the filter's error signal and echo estimate
    /// in FloatS16. Writes the suppressed residual of the previous frame to
    /// `out`.
    pub fn process(&mut self, residual: &[f64], echo: &[f64], leak: f64, out: &mut [i16]) {
        debug_assert_eq!(residual.len(), self.frame_size);
        debug_assert_eq!(echo.len(), self.frame_size);
        debug_assert_eq!(out.len(), self.frame_size);

        for (f, &x) in self.frame.iter_mut().zip(residual) {
            *f = x as f32;
        }
        self.stft
            .analyze(&mut self.residual_buffer, &self.frame, &mut self.residual_spectrum);

        for (f, &x) in self.frame.iter_mut().zip(echo) {
            *f = x as f32;
        }
        self.stft
            .analyze(&mut self.echo_buffer, &self.frame, &mut self.echo_spectrum);

        let leak = leak as f32;
        for k in 0..self.observed.len() {
            let observed = self.residual_spectrum[k].norm_sqr();
            let echo = leak * self.echo_spectrum[k].norm_sqr();
            self.observed[k] = observed;
            self.echo_power[k] = echo;
            self.noise_input[k] = (observed - echo).max(0.0);
        }

        self.noise_estimator.update(&self.noise_input, &self.observed);
        let gains = self.suppression_gain.update(
            &self.observed,
            self.noise_estimator.noise(),
            &self.echo_power,
        );
        for (bin, &g) in self.residual_spectrum.iter_mut().zip(gains) {
            *bin *= g;
        }

        self.stft
            .synthesize(&mut self.residual_spectrum, &mut self.overlap, &mut self.frame);
        float_s16_f32_to_s16_slice(&self.frame, out);
    }

    /// Near-end speech presence of the last processed frame, in `[0, 1]`.
    pub fn speech_presence(&self) -> f64 {
        f64::from(self.suppression_gain.speech_presence())
    }
}
