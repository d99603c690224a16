//! First-order exponential smoothing with frame-rate aware coefficients.
//!
//! Estimates are updated once per processed frame, so the smoothing
//! coefficient depends on how much time a frame covers. Callers specify a
//! time constant in milliseconds and the coefficient is derived from the
//! frame size and sample rate.

/// Values below this magnitude are flushed to zero so that long stretches
/// of silence never leave an estimate in the subnormal range.
pub const FLUSH_THRESHOLD: f64 = 1e-30;

/// Smoothing coefficient for a first-order IIR with time constant `tau_ms`
/// that is updated once every `frame_size` samples at `sample_rate_hz`.
///
/// Returns a value in `(0, 1]`. A zero or negative time constant means "no
/// smoothing" and yields `1.0`.
pub fn smoothing_coefficient(tau_ms: f64, frame_size: usize, sample_rate_hz: u32) -> f64 {
    debug_assert!(sample_rate_hz > 0);
    if tau_ms <= 0.0 {
        return 1.0;
    }
    let frame_ms = 1000.0 * frame_size as f64 / f64::from(sample_rate_hz);
    (1.0 - (-frame_ms / tau_ms).exp()).clamp(f64::MIN_POSITIVE, 1.0)
}

/// Per-frame growth factor for a quantity allowed to rise by at most
/// `db_per_second` (power dB).
pub fn rise_factor(db_per_second: f64, frame_size: usize, sample_rate_hz: u32) -> f64 {
    debug_assert!(sample_rate_hz > 0);
    let frame_seconds = frame_size as f64 / f64::from(sample_rate_hz);
    10.0_f64.powf(db_per_second * frame_seconds / 10.0)
}

/// Exponentially smoothed estimate of a scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoother {
    coefficient: f64,
    value: f64,
}

impl ExponentialSmoother {
    /// Creates a smoother with the given coefficient and a zero estimate.
    pub fn new(coefficient: f64) -> Self {
        debug_assert!(coefficient > 0.0 && coefficient <= 1.0);
        Self {
            coefficient,
            value: 0.0,
        }
    }

    /// Creates a smoother from a time constant in milliseconds.
    pub fn with_time_constant(tau_ms: f64, frame_size: usize, sample_rate_hz: u32) -> Self {
        Self::new(smoothing_coefficient(tau_ms, frame_size, sample_rate_hz))
    }

    /// Feeds a new observation and returns the updated estimate.
    #[inline]
    pub fn update(&mut self, observation: f64) -> f64 {
        self.value += self.coefficient * (observation - self.value);
        if self.value.abs() < FLUSH_THRESHOLD {
            self.value = 0.0;
        }
        debug_assert!(self.value.is_finite());
        self.value
    }

    /// Feeds an observation with an extra weight in `[0, 1]` that scales the
    /// smoothing coefficient. A zero weight leaves the estimate unchanged.
    #[inline]
    pub fn update_weighted(&mut self, observation: f64, weight: f64) -> f64 {
        let weight = weight.clamp(0.0, 1.0);
        self.value += weight * self.coefficient * (observation - self.value);
        if self.value.abs() < FLUSH_THRESHOLD {
            self.value = 0.0;
        }
        self.value
    }

    /// Overrides the current estimate.
    pub fn set(&mut self, value: f64) {
        self.value = value;
    }

    /// The current estimate.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }
}
