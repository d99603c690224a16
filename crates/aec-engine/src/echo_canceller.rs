//! The echo canceller: public API over the filter, controller and
//! suppressor.
//!
//! Per frame, the reference frame is appended to the filter history, the
//! subtractor removes its echo estimate from the capture frame, the
//! step-size controller updates the adaptation rate for the next frame, and
//! the residual is either rounded to i16 directly or passed through the
//! suppressor. When the subtractor swaps in its background filter the
//! controller is told that the echo path changed.

use aec_common_audio::audio_util::{
    MAX_SAMPLE_RATE_HZ, MIN_SAMPLE_RATE_HZ, float_s16_to_s16_slice, power_ratio_to_db,
};
use aec_filter::{ReferenceHistory, StepSizeController, Subtractor};
use aec_preprocess::Preprocessor;

use crate::config::{Config, MAX_FILTER_LENGTH, MAX_FRAME_SIZE};
use crate::stats::EchoCancellerStats;

// ─── Error ───────────────────────────────────────────────────────────

/// Errors returned by echo canceller operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Frame size zero or above the supported maximum.
    BadFrameSize,
    /// Filter length zero or above the supported maximum.
    BadFilterLength,
    /// Sample rate outside 8 kHz to 48 kHz.
    BadSampleRate,
    /// Step size not in `(0, 1]`.
    BadStepSize,
    /// A suppression level that is not a finite value `<= 0` dB.
    BadSuppressionLevel,
    /// A frame passed to `process` does not hold exactly `frame_size`
    /// samples.
    BadFrameLength,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadFrameSize => write!(f, "bad frame size"),
            Self::BadFilterLength => write!(f, "bad filter length"),
            Self::BadSampleRate => write!(f, "bad sample rate"),
            Self::BadStepSize => write!(f, "bad step size"),
            Self::BadSuppressionLevel => write!(f, "bad suppression level"),
            Self::BadFrameLength => write!(f, "frame length does not match frame size"),
        }
    }
}

impl std::error::Error for Error {}

// ─── Validation ──────────────────────────────────────────────────────

fn validate_config(config: &Config) -> Result<(), Error> {
    if config.frame_size == 0 || config.frame_size > MAX_FRAME_SIZE {
        tracing::warn!(frame_size = config.frame_size, "frame size out of range");
        return Err(Error::BadFrameSize);
    }
    if config.filter_length == 0 || config.filter_length > MAX_FILTER_LENGTH {
        tracing::warn!(filter_length = config.filter_length, "filter length out of range");
        return Err(Error::BadFilterLength);
    }
    if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&config.sample_rate_hz) {
        tracing::warn!(sample_rate_hz = config.sample_rate_hz, "sample rate out of range");
        return Err(Error::BadSampleRate);
    }
    if !config.adaptation.is_valid() {
        tracing::warn!(step_size = config.adaptation.step_size, "step size out of range");
        return Err(Error::BadStepSize);
    }
    if let Some(level) = config.preprocess.invalid_level() {
        tracing::warn!(level_db = level, "suppression level must be finite and <= 0 dB");
        return Err(Error::BadSuppressionLevel);
    }
    Ok(())
}

// ─── EchoCancellerBuilder ────────────────────────────────────────────

/// Builder for an [`EchoCanceller`].
///
/// # Example
/// ```
/// use aec_engine::EchoCanceller;
///
/// let aec = EchoCanceller::builder()
///     .frame_size(160)
///     .filter_length(1024)
///     .sample_rate_hz(16000)
///     .preprocess(true)
///     .build()
///     .unwrap();
/// assert_eq!(aec.frame_size(), 160);
/// ```
#[derive(Debug, Clone)]
pub struct EchoCancellerBuilder {
    config: Config,
}

impl EchoCancellerBuilder {
    fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn frame_size(mut self, frame_size: usize) -> Self {
        self.config.frame_size = frame_size;
        self
    }

    pub fn filter_length(mut self, filter_length: usize) -> Self {
        self.config.filter_length = filter_length;
        self
    }

    pub fn sample_rate_hz(mut self, sample_rate_hz: u32) -> Self {
        self.config.sample_rate_hz = sample_rate_hz;
        self
    }

    /// Enable or disable the residual echo and noise suppressor.
    pub fn preprocess(mut self, enabled: bool) -> Self {
        self.config.preprocess.enabled = enabled;
        self
    }

    /// Validate the configuration and allocate all state.
    pub fn build(self) -> Result<EchoCanceller, Error> {
        validate_config(&self.config)?;
        Ok(EchoCanceller::with_config(self.config))
    }
}

// ─── EchoCanceller ───────────────────────────────────────────────────

/// Acoustic echo canceller for one mono stream pair.
///
/// # Usage
///
/// 1. Create an instance via [`EchoCanceller::builder()`] or
///    [`EchoCanceller::new()`].
/// 2. For each frame, call [`process()`](EchoCanceller::process) with the
///    reference frame that was played and the capture frame that was
///    recorded at the same time.
/// 3. Drop the instance when the stream ends.
///
/// All buffers are allocated at construction; processing does not allocate.
#[derive(derive_more::Debug)]
pub struct EchoCanceller {
    config: Config,
    history: ReferenceHistory,
    subtractor: Subtractor,
    controller: StepSizeController,
    preprocessor: Option<Preprocessor>,
    #[debug(skip)]
    error: Vec<f64>,
    #[debug(skip)]
    echo: Vec<f64>,
    frames_processed: u64,
    echo_path_changes: u64,
}

impl EchoCanceller {
    /// Creates an instance with the default adaptation and suppression
    /// settings.
    pub fn new(
        frame_size: usize,
        filter_length: usize,
        sample_rate_hz: u32,
        enable_preprocess: bool,
    ) -> Result<Self, Error> {
        Self::builder()
            .frame_size(frame_size)
            .filter_length(filter_length)
            .sample_rate_hz(sample_rate_hz)
            .preprocess(enable_preprocess)
            .build()
    }

    /// Returns a builder starting from [`Config::default()`].
    pub fn builder() -> EchoCancellerBuilder {
        EchoCancellerBuilder::new()
    }

    fn with_config(config: Config) -> Self {
        let Config {
            frame_size,
            filter_length,
            sample_rate_hz,
            ..
        } = config;
        tracing::debug!(
            frame_size,
            filter_length,
            sample_rate_hz,
            step_size = config.adaptation.step_size,
            preprocess = config.preprocess.enabled,
            "creating echo canceller"
        );
        Self {
            history: ReferenceHistory::new(filter_length, frame_size),
            subtractor: Subtractor::new(filter_length, frame_size),
            controller: StepSizeController::new(frame_size, sample_rate_hz),
            preprocessor: config
                .preprocess
                .enabled
                .then(|| Preprocessor::new(frame_size, sample_rate_hz, &config.preprocess)),
            error: vec![0.0; frame_size],
            echo: vec![0.0; frame_size],
            frames_processed: 0,
            echo_path_changes: 0,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn frame_size(&self) -> usize {
        self.config.frame_size
    }

    pub fn filter_length(&self) -> usize {
        self.config.filter_length
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.config.sample_rate_hz
    }

    pub fn preprocess_enabled(&self) -> bool {
        self.preprocessor.is_some()
    }

    // ─── Processing ──────────────────────────────────────────────

    /// Removes the echo of `reference` from `capture` and writes the result
    /// to `output`.
    ///
    /// All three slices must hold exactly `frame_size` samples; otherwise
    /// [`Error::BadFrameLength`] is returned and no state changes. With the
    /// suppressor enabled, `output` lags `capture` by one frame.
    pub fn process(
        &mut self,
        reference: &[i16],
        capture: &[i16],
        output: &mut [i16],
    ) -> Result<(), Error> {
        self.check_length(reference)?;
        self.check_length(capture)?;
        self.check_length(output)?;
        self.cancel(reference, capture);
        self.write_output(output);
        Ok(())
    }

    /// Like [`process()`](Self::process), writing the output over `capture`.
    pub fn process_in_place(&mut self, reference: &[i16], capture: &mut [i16]) -> Result<(), Error> {
        self.check_length(reference)?;
        self.check_length(capture)?;
        self.cancel(reference, capture);
        self.write_output(capture);
        Ok(())
    }

    fn check_length(&self, frame: &[i16]) -> Result<(), Error> {
        if frame.len() != self.config.frame_size {
            return Err(Error::BadFrameLength);
        }
        Ok(())
    }

    /// Runs the adaptive filters over one frame, leaving the residual in
    /// `self.error` and the echo estimate in `self.echo`.
    fn cancel(&mut self, reference: &[i16], capture: &[i16]) {
        self.history.push_frame(reference);
        let step_size = self.config.adaptation.step_size;
        let output = self.subtractor.process(
            &self.history,
            capture,
            step_size * self.controller.multiplier(),
            step_size * self.controller.far_activity(),
            &mut self.error,
            &mut self.echo,
        );
        self.controller.update(&output.energies);
        if output.echo_path_changed {
            self.controller.on_echo_path_change();
            self.echo_path_changes += 1;
        }
        self.frames_processed += 1;
    }

    fn write_output(&mut self, output: &mut [i16]) {
        match &mut self.preprocessor {
            Some(preprocessor) => {
                preprocessor.process(&self.error, &self.echo, self.controller.leak(), output)
            }
            None => float_s16_to_s16_slice(&self.error, output),
        }
    }

    // ─── Statistics ──────────────────────────────────────────────

    /// Returns the current estimates.
    pub fn stats(&self) -> EchoCancellerStats {
        let smoothed = self.controller.smoothed();
        let ratio_db = |num: f64, den: f64| {
            if num > 0.0 && den > 0.0 {
                power_ratio_to_db(num / den)
            } else {
                None
            }
        };
        EchoCancellerStats {
            echo_return_loss: ratio_db(smoothed.far, smoothed.mic),
            echo_return_loss_enhancement: ratio_db(smoothed.mic, smoothed.residual),
            double_talk_likelihood: self.controller.double_talk_likelihood(),
            adaptation_multiplier: self.controller.multiplier(),
            residual_echo_leak: self.controller.leak(),
            speech_presence: self.preprocessor.as_ref().map(Preprocessor::speech_presence),
            frames_processed: self.frames_processed,
            echo_path_changes: self.echo_path_changes,
        }
    }
}
