//! Adaptive filter configuration.

/// Default NLMS step size.
pub const DEFAULT_STEP_SIZE: f64 = 0.5;

/// Adaptation settings for the echo path filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptationConfig {
    /// Base NLMS step size in `(0, 1]`. The step-size controller scales it
    /// down per frame, never up.
    pub step_size: f64,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            step_size: DEFAULT_STEP_SIZE,
        }
    }
}

impl AdaptationConfig {
    /// Whether `step_size` lies in `(0, 1]`.
    pub fn is_valid(&self) -> bool {
        self.step_size.is_finite() && self.step_size > 0.0 && self.step_size <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(AdaptationConfig::default().is_valid());
        assert_eq!(AdaptationConfig::default().step_size, 0.5);
    }

    #[test]
    fn rejects_out_of_range_step_sizes() {
        for step_size in [0.0, -0.1, 1.01, f64::NAN, f64::INFINITY] {
            assert!(!AdaptationConfig { step_size }.is_valid(), "{step_size}");
        }
        assert!(AdaptationConfig { step_size: 1.0 }.is_valid());
    }
}
