//! Per-bin noise power estimation.
//!
//! The first [`STARTUP_FRAMES`] frames are averaged directly. Afterwards
//! each bin follows the observed power in the log domain, falling quickly
//! and rising slowly, which keeps speech and tones from inflating the
//! estimate. Tracking that way settles below the mean of a noise-like bin,
//! so the tracked level is scaled by [`TRACKING_BIAS`] on the way out.

use aec_common_audio::smoothing::smoothing_coefficient;

/// Frames averaged before switching to minimum tracking.
pub const STARTUP_FRAMES: usize = 20;

const RISE_TIME_CONSTANT_MS: f64 = 2000.0;
const FALL_TIME_CONSTANT_MS: f64 = 200.0;

/// Ratio of the mean of an exponentially distributed bin power to the level
/// the fast-fall/slow-rise tracker settles on.
const TRACKING_BIAS: f32 = 6.0;

/// Keeps the log domain finite for digital silence.
const POWER_FLOOR: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct NoiseEstimator {
    num_frames: usize,
    rise: f32,
    fall: f32,
    /// Natural log of the tracked level, valid after startup.
    log_level: Vec<f32>,
    noise: Vec<f32>,
}

impl NoiseEstimator {
    pub fn new(num_bins: usize, frame_size: usize, sample_rate_hz: u32) -> Self {
        Self {
            num_frames: 0,
            rise: smoothing_coefficient(RISE_TIME_CONSTANT_MS, frame_size, sample_rate_hz) as f32,
            fall: smoothing_coefficient(FALL_TIME_CONSTANT_MS, frame_size, sample_rate_hz) as f32,
            log_level: vec![POWER_FLOOR.ln(); num_bins],
            noise: vec![0.0; num_bins],
        }
    }

    /// Updates the estimate from `power`, the per-bin residual power with
    /// the modelled residual echo removed. `observed` is the residual power
    /// before that removal; bins where echo masks everything are left alone.
    pub fn update(&mut self, power: &[f32], observed: &[f32]) {
        debug_assert_eq!(power.len(), self.noise.len());
        debug_assert_eq!(observed.len(), self.noise.len());

        if self.num_frames < STARTUP_FRAMES {
            let weight = 1.0 / (self.num_frames + 1) as f32;
            for (n, &p) in self.noise.iter_mut().zip(power) {
                *n += weight * (p - *n);
            }
            self.num_frames += 1;
            if self.num_frames == STARTUP_FRAMES {
                for (level, &n) in self.log_level.iter_mut().zip(&self.noise) {
                    *level = (n / TRACKING_BIAS).max(POWER_FLOOR).ln();
                }
            }
            return;
        }

        for ((level, n), (&p, &o)) in self
            .log_level
            .iter_mut()
            .zip(self.noise.iter_mut())
            .zip(power.iter().zip(observed))
        {
            if p <= 0.0 && o > 0.0 {
                continue;
            }
            let target = p.max(POWER_FLOOR).ln();
            let rate = if target < *level { self.fall } else { self.rise };
            *level += rate * (target - *level);
            *n = TRACKING_BIAS * level.exp();
        }
    }

    /// Noise power per bin.
    pub fn noise(&self) -> &[f32] {
        &self.noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aec_proptest::signals::Noise;

    // Exponentially distributed bin powers with the given mean.
    fn periodogram(noise: &mut Noise, bins: usize, mean: f32) -> Vec<f32> {
        (0..bins)
            .map(|_| {
                let u = 0.5 * (noise.next_f64() + 1.0);
                -mean * (1.0 - u as f32).max(1e-12).ln()
            })
            .collect()
    }

    #[test]
    fn startup_is_plain_average() {
        let mut estimator = NoiseEstimator::new(2, 160, 16000);
        estimator.update(&[2.0, 4.0], &[2.0, 4.0]);
        estimator.update(&[4.0, 8.0], &[4.0, 8.0]);
        assert_eq!(estimator.noise(), &[3.0, 6.0]);
        assert!(estimator.num_frames < STARTUP_FRAMES);
    }

    #[test]
    fn silence_stays_zero_during_startup() {
        let mut estimator = NoiseEstimator::new(4, 160, 16000);
        for _ in 0..STARTUP_FRAMES {
            estimator.update(&[0.0; 4], &[0.0; 4]);
        }
        assert_eq!(estimator.num_frames, STARTUP_FRAMES);
        assert_eq!(estimator.noise(), &[0.0; 4]);
    }

    #[test]
    fn tracks_stationary_noise_level() {
        let bins = 64;
        let mut estimator = NoiseEstimator::new(bins, 160, 16000);
        let mut noise = Noise::new(17);
        for _ in 0..600 {
            estimator.update(
                &periodogram(&mut noise, bins, 1000.0),
                &vec![1000.0; bins],
            );
        }
        let mean = estimator.noise().iter().sum::<f32>() / bins as f32;
        // Within a factor of two of the true level.
        assert!(mean > 500.0 && mean < 2000.0, "{mean}");
    }

    #[test]
    fn rises_slowly_on_loud_bursts() {
        let mut estimator = NoiseEstimator::new(1, 160, 16000);
        for _ in 0..STARTUP_FRAMES {
            estimator.update(&[100.0], &[100.0]);
        }
        for _ in 0..10 {
            estimator.update(&[1e6], &[1e6]);
        }
        // 100 ms of a 40 dB burst may not lift the estimate by 10 dB.
        assert!(estimator.noise()[0] < 1000.0, "{}", estimator.noise()[0]);
    }

    #[test]
    fn falls_quickly() {
        let mut estimator = NoiseEstimator::new(1, 160, 16000);
        for _ in 0..STARTUP_FRAMES {
            estimator.update(&[1e6], &[1e6]);
        }
        for _ in 0..100 {
            estimator.update(&[100.0], &[100.0]);
        }
        assert!(estimator.noise()[0] < 1000.0, "{}", estimator.noise()[0]);
    }

    #[test]
    fn echo_masked_bins_are_frozen() {
        let mut estimator = NoiseEstimator::new(1, 160, 16000);
        for _ in 0..STARTUP_FRAMES {
            estimator.update(&[500.0], &[500.0]);
        }
        estimator.update(&[500.0], &[500.0]);
        let before = estimator.noise()[0];
        for _ in 0..50 {
            estimator.update(&[0.0], &[1e5]);
        }
        assert_eq!(estimator.noise()[0], before);
    }
}
