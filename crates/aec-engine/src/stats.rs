//! Echo canceller statistics.

/// Snapshot of the echo canceller's internal estimates.
///
/// Levels are derived from energies smoothed over roughly 40 ms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EchoCancellerStats {
    /// ERL = 10 log10(P_far / P_mic). `None` until both are non-zero.
    pub echo_return_loss: Option<f64>,
    /// ERLE = 10 log10(P_mic / P_residual). `None` until both are non-zero.
    pub echo_return_loss_enhancement: Option<f64>,
    /// Share of microphone power attributed to near-end activity, `[0, 1]`.
    pub double_talk_likelihood: f64,
    /// Factor currently applied to the base step size, `[0, 1]`.
    pub adaptation_multiplier: f64,
    /// Residual to echo-estimate power ratio used by the suppressor.
    pub residual_echo_leak: f64,
    /// Near-end speech presence seen by the suppressor. `None` when the
    /// suppressor is disabled.
    pub speech_presence: Option<f64>,
    /// Frames processed since creation.
    pub frames_processed: u64,
    /// Times the echo path estimate was replaced by the background filter.
    pub echo_path_changes: u64,
}
