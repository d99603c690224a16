//! Per-bin suppression gain.
//!
//! A decision-directed Wiener gain against the combined noise and residual
//! echo power, floored per bin by a mix of the noise and echo suppression
//! levels weighted by which of the two dominates the bin. The echo level
//! itself moves towards the "active" level as near-end speech presence
//! grows.

use aec_common_audio::audio_util::db_to_power_ratio;

use crate::config::PreprocessConfig;

/// Weight of the previous frame's clean speech estimate in the a-priori SNR.
const DECISION_DIRECTED_WEIGHT: f32 = 0.98;

const MAX_PRIOR_SNR: f32 = 1e3;

/// Interference power below which a bin is left untouched.
const MIN_INTERFERENCE: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct SuppressionGain {
    noise_suppress_db: f64,
    echo_suppress_db: f64,
    echo_suppress_active_db: f64,
    /// Clean speech power estimate of the previous frame, per bin.
    previous_clean: Vec<f32>,
    gains: Vec<f32>,
    speech_presence: f32,
}

impl SuppressionGain {
    pub fn new(num_bins: usize, config: &PreprocessConfig) -> Self {
        Self {
            noise_suppress_db: config.noise_suppress_db,
            echo_suppress_db: config.echo_suppress_db,
            echo_suppress_active_db: config.echo_suppress_active_db,
            previous_clean: vec![0.0; num_bins],
            gains: vec![1.0; num_bins],
            speech_presence: 0.0,
        }
    }

    /// Computes gains for one frame from the observed, noise and residual
    /// echo powers per bin.
    pub fn update(&mut self, observed: &[f32], noise: &[f32], echo: &[f32]) -> &[f32] {
        debug_assert_eq!(observed.len(), self.gains.len());
        debug_assert_eq!(noise.len(), self.gains.len());
        debug_assert_eq!(echo.len(), self.gains.len());

        // Unfloored Wiener gains first; they also give the speech presence.
        let mut total = 0.0f32;
        let mut speech = 0.0f32;
        for k in 0..self.gains.len() {
            let interference = noise[k] + echo[k];
            self.gains[k] = if interference <= MIN_INTERFERENCE {
                1.0
            } else {
                let posterior = observed[k] / interference;
                let prior = (DECISION_DIRECTED_WEIGHT * self.previous_clean[k] / interference
                    + (1.0 - DECISION_DIRECTED_WEIGHT) * (posterior - 1.0).max(0.0))
                .min(MAX_PRIOR_SNR);
                prior / (1.0 + prior)
            };
            total += observed[k];
            speech += self.gains[k] * observed[k];
        }
        self.speech_presence = if total > 0.0 {
            (speech / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let presence = f64::from(self.speech_presence);
        let echo_db =
            self.echo_suppress_db + presence * (self.echo_suppress_active_db - self.echo_suppress_db);
        let noise_floor = db_to_power_ratio(self.noise_suppress_db) as f32;
        let echo_floor = db_to_power_ratio(echo_db) as f32;

        for k in 0..self.gains.len() {
            let interference = noise[k] + echo[k];
            if interference > MIN_INTERFERENCE {
                let floor = ((noise_floor * noise[k] + echo_floor * echo[k]) / interference).sqrt();
                self.gains[k] = self.gains[k].clamp(floor, 1.0);
            }
            self.previous_clean[k] = self.gains[k] * self.gains[k] * observed[k];
        }
        &self.gains
    }

    pub fn gains(&self) -> &[f32] {
        &self.gains
    }

    /// Share of the last frame's power attributed to near-end speech.
    pub fn speech_presence(&self) -> f32 {
        self.speech_presence
    }
}
