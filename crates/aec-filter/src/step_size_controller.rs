//! Double-talk aware step-size control.
//!
//! Tracks smoothed far-end, microphone, echo-estimate and residual powers
//! and derives three per-frame quantities from them:
//!
//! - a double-talk likelihood, the share of microphone power that the far
//!   end cannot explain given the tracked echo return loss,
//! - an adaptation multiplier that scales the NLMS step size for the next
//!   frame,
//! - a residual echo leakage, the ratio of residual to echo-estimate power
//!   while the far end is active.
//!
//! The echo return loss tracker follows drops of the observed
//! microphone-to-far ratio immediately but may only rise slowly. A burst of
//! near-end speech raises the observed ratio much faster than the tracker,
//! which is what the likelihood measures. When the subtractor reports an
//! echo path change the tracker is re-seeded from the current observation,
//! so a louder path is not mistaken for double talk.

use aec_common_audio::audio_util::dbfs_to_float_s16_power;
use aec_common_audio::smoothing::{ExponentialSmoother, rise_factor, smoothing_coefficient};

use crate::nlms::FrameEnergies;

const ENERGY_TIME_CONSTANT_MS: f64 = 40.0;
const MULTIPLIER_RELEASE_MS: f64 = 60.0;
const LEAK_TIME_CONSTANT_MS: f64 = 100.0;
const ERL_RISE_DB_PER_SECOND: f64 = 1.0;

// Microphone to far-end power ratio bounds (+20 dB .. -40 dB).
const MAX_ECHO_RATIO: f64 = 100.0;
const MIN_ECHO_RATIO: f64 = 1e-4;

// Near-end power must exceed this multiple of the expected echo before it
// counts towards double talk.
const ECHO_RATIO_MARGIN: f64 = 2.0;

const MIN_LEAK: f64 = 0.005;
const MAX_LEAK: f64 = 1.0;

/// Smoothed energies above which the far end counts as active, -60 dBFS.
fn far_activity_floor() -> f64 {
    dbfs_to_float_s16_power(-60.0)
}

/// Smoothed microphone energy below which the echo ratio is not tracked,
/// -70 dBFS.
fn mic_activity_floor() -> f64 {
    dbfs_to_float_s16_power(-70.0)
}

/// Continuous double-talk detector and step-size controller.
#[derive(Debug, Clone)]
pub struct StepSizeController {
    far: ExponentialSmoother,
    mic: ExponentialSmoother,
    echo: ExponentialSmoother,
    residual: ExponentialSmoother,
    leak: ExponentialSmoother,
    echo_ratio: f64,
    echo_ratio_rise: f64,
    release: f64,
    multiplier: f64,
    double_talk_likelihood: f64,
    far_activity: f64,
    far_floor: f64,
    mic_floor: f64,
}

impl StepSizeController {
    pub fn new(frame_size: usize, sample_rate_hz: u32) -> Self {
        let energy = || {
            ExponentialSmoother::with_time_constant(
                ENERGY_TIME_CONSTANT_MS,
                frame_size,
                sample_rate_hz,
            )
        };
        let mut leak =
            ExponentialSmoother::with_time_constant(LEAK_TIME_CONSTANT_MS, frame_size, sample_rate_hz);
        leak.set(MAX_LEAK);
        Self {
            far: energy(),
            mic: energy(),
            echo: energy(),
            residual: energy(),
            leak,
            echo_ratio: MAX_ECHO_RATIO,
            echo_ratio_rise: rise_factor(ERL_RISE_DB_PER_SECOND, frame_size, sample_rate_hz),
            release: smoothing_coefficient(MULTIPLIER_RELEASE_MS, frame_size, sample_rate_hz),
            multiplier: 1.0,
            double_talk_likelihood: 0.0,
            far_activity: 0.0,
            far_floor: far_activity_floor(),
            mic_floor: mic_activity_floor(),
        }
    }

    /// Folds in the energies of the frame just filtered. The resulting
    /// multiplier applies to the next frame.
    pub fn update(&mut self, energies: &FrameEnergies) {
        let far = self.far.update(energies.far);
        let mic = self.mic.update(energies.mic);
        let echo = self.echo.update(energies.echo);
        let residual = self.residual.update(energies.residual);

        self.far_activity = far / (far + self.far_floor);
        let far_active = far > self.far_floor;

        if far_active && mic > self.mic_floor {
            let observed = mic / far;
            let ceiling = self.echo_ratio * self.echo_ratio_rise;
            self.echo_ratio = observed.min(ceiling).clamp(MIN_ECHO_RATIO, MAX_ECHO_RATIO);
        }

        self.double_talk_likelihood = if mic > 0.0 {
            ((mic - ECHO_RATIO_MARGIN * self.echo_ratio * far) / mic).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let openness = 1.0 - self.double_talk_likelihood;
        let target = openness * openness * self.far_activity;
        if target < self.multiplier {
            self.multiplier = target;
        } else {
            self.multiplier += self.release * (target - self.multiplier);
        }

        if far_active && echo > 0.0 {
            let observed = (residual / echo).min(MAX_LEAK);
            self.leak.update_weighted(observed, openness);
            self.leak.set(self.leak.value().clamp(MIN_LEAK, MAX_LEAK));
        }
    }

    /// Re-seeds the echo return loss tracker after the echo path estimate
    /// was replaced. The microphone power seen now is taken to be echo.
    pub fn on_echo_path_change(&mut self) {
        let (far, mic) = (self.far.value(), self.mic.value());
        if far > self.far_floor && mic > self.mic_floor {
            self.echo_ratio = (mic / far).clamp(MIN_ECHO_RATIO, MAX_ECHO_RATIO);
        }
        self.double_talk_likelihood = 0.0;
    }

    /// Factor in `[0, 1]` applied to the base step size.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Far-end activity in `[0, 1)`, independent of double talk.
    pub fn far_activity(&self) -> f64 {
        self.far_activity
    }

    /// Estimated share of microphone power caused by near-end activity.
    pub fn double_talk_likelihood(&self) -> f64 {
        self.double_talk_likelihood
    }

    /// Residual echo power relative to the echo estimate power.
    pub fn leak(&self) -> f64 {
        self.leak.value()
    }

    /// Tracked microphone-to-far power ratio of the echo path.
    pub fn echo_ratio(&self) -> f64 {
        self.echo_ratio
    }

    /// Smoothed energies, in the same units as [`FrameEnergies`].
    pub fn smoothed(&self) -> FrameEnergies {
        FrameEnergies {
            far: self.far.value(),
            mic: self.mic.value(),
            echo: self.echo.value(),
            residual: self.residual.value(),
        }
    }
}
