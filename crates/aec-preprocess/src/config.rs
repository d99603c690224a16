//! Preprocessor configuration.

/// Default noise suppression floor (dB).
pub const DEFAULT_NOISE_SUPPRESS_DB: f64 = -15.0;

/// Default residual echo suppression floor without near-end speech (dB).
pub const DEFAULT_ECHO_SUPPRESS_DB: f64 = -40.0;

/// Default residual echo suppression floor during near-end speech (dB).
pub const DEFAULT_ECHO_SUPPRESS_ACTIVE_DB: f64 = -15.0;

/// Configuration for the residual echo and noise suppressor.
///
/// The suppression levels are the lowest gains (in dB) applied to bins
/// dominated by noise or residual echo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessConfig {
    pub enabled: bool,
    pub noise_suppress_db: f64,
    pub echo_suppress_db: f64,
    pub echo_suppress_active_db: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            noise_suppress_db: DEFAULT_NOISE_SUPPRESS_DB,
            echo_suppress_db: DEFAULT_ECHO_SUPPRESS_DB,
            echo_suppress_active_db: DEFAULT_ECHO_SUPPRESS_ACTIVE_DB,
        }
    }
}

impl PreprocessConfig {
    /// Returns the first suppression level that is not a finite value
    /// `<= 0`, if any.
    pub fn invalid_level(&self) -> Option<f64> {
        [
            self.noise_suppress_db,
            self.echo_suppress_db,
            self.echo_suppress_active_db,
        ]
        .into_iter()
        .find(|db| !db.is_finite() || *db > 0.0)
    }
}
