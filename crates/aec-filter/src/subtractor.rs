//! Echo subtraction with a foreground and a background filter.
//!
//! The foreground filter produces the echo estimate and adapts at the rate
//! the step-size controller allows. The background filter sees the same
//! signals but adapts whenever the far end is active, regardless of double
//! talk.
//!
//! - When the background filter removes clearly more echo than the
//!   foreground for a few consecutive frames, the echo path has changed in
//!   a way the throttled foreground cannot follow, so the foreground takes
//!   over the background taps.
//! - When the background filter does worse for a few consecutive frames it
//!   has drifted on near-end signal and is reset to the foreground taps.

use aec_common_audio::audio_util::dbfs_to_float_s16_power;

use crate::history::ReferenceHistory;
use crate::nlms::{FrameEnergies, NlmsFilter};

/// Background residual power, relative to the foreground's, below which the
/// background counts as better (-3 dB).
const BACKGROUND_ADVANTAGE: f64 = 0.5;

/// Consecutive better frames before the foreground is replaced.
const COPY_HANGOVER_FRAMES: usize = 3;

/// Consecutive worse frames before the background is reset.
const POOR_BACKGROUND_FRAMES: usize = 5;

/// Outcome of subtracting the echo from one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubtractorOutput {
    /// Energies of the foreground filter, which produced the output.
    pub energies: FrameEnergies,
    /// The foreground filter was replaced by the background filter at the
    /// end of this frame.
    pub echo_path_changed: bool,
}

#[derive(derive_more::Debug, Clone)]
pub struct Subtractor {
    foreground: NlmsFilter,
    background: NlmsFilter,
    #[debug(skip)]
    background_error: Vec<f64>,
    #[debug(skip)]
    background_echo: Vec<f64>,
    better_background_frames: usize,
    poor_background_frames: usize,
    /// Foreground residual power below which the foreground is never
    /// replaced, -70 dBFS.
    residual_floor: f64,
}

impl Subtractor {
    pub fn new(filter_length: usize, frame_size: usize) -> Self {
        Self {
            foreground: NlmsFilter::new(filter_length),
            background: NlmsFilter::new(filter_length),
            background_error: vec![0.0; frame_size],
            background_echo: vec![0.0; frame_size],
            better_background_frames: 0,
            poor_background_frames: 0,
            residual_floor: dbfs_to_float_s16_power(-70.0),
        }
    }

    /// The filter whose estimate is subtracted from the microphone signal.
    pub fn foreground(&self) -> &NlmsFilter {
        &self.foreground
    }

    /// Subtracts the foreground echo estimate from `mic`, writing the
    /// residual to `error` and the estimate to `echo`, and adapts both
    /// filters.
    pub fn process(
        &mut self,
        history: &ReferenceHistory,
        mic: &[i16],
        foreground_rate: f64,
        background_rate: f64,
        error: &mut [f64],
        echo: &mut [f64],
    ) -> SubtractorOutput {
        let foreground = self
            .foreground
            .process(history, mic, foreground_rate, error, echo);
        let background = self.background.process(
            history,
            mic,
            background_rate,
            &mut self.background_error,
            &mut self.background_echo,
        );

        let background_better = foreground.residual > self.residual_floor
            && background.residual < BACKGROUND_ADVANTAGE * foreground.residual;
        self.better_background_frames = if background_better {
            self.better_background_frames + 1
        } else {
            0
        };
        self.poor_background_frames = if foreground.residual < background.residual {
            self.poor_background_frames + 1
        } else {
            0
        };

        let echo_path_changed = self.better_background_frames >= COPY_HANGOVER_FRAMES;
        if echo_path_changed {
            self.foreground.set_filter(self.background.taps());
            self.better_background_frames = 0;
        } else if self.poor_background_frames >= POOR_BACKGROUND_FRAMES {
            self.background.set_filter(self.foreground.taps());
            self.poor_background_frames = 0;
        }

        SubtractorOutput {
            energies: foreground,
            echo_path_changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aec_proptest::signals::{convolve, echo_path, mix, to_i16, white_noise};

    const LENGTH: usize = 64;
    const FRAME: usize = 80;

    struct Run {
        outputs: Vec<SubtractorOutput>,
    }

    fn run(
        subtractor: &mut Subtractor,
        history: &mut ReferenceHistory,
        reference: &[i16],
        mic: &[i16],
        foreground_rate: f64,
        background_rate: f64,
    ) -> Run {
        let mut error = vec![0.0; FRAME];
        let mut echo = vec![0.0; FRAME];
        let outputs = reference
            .chunks_exact(FRAME)
            .zip(mic.chunks_exact(FRAME))
            .map(|(far, near)| {
                history.push_frame(far);
                subtractor.process(
                    history,
                    near,
                    foreground_rate,
                    background_rate,
                    &mut error,
                    &mut echo,
                )
            })
            .collect();
        Run { outputs }
    }

    fn converged(gain: f64) -> (Subtractor, ReferenceHistory) {
        let mut subtractor = Subtractor::new(LENGTH, FRAME);
        let mut history = ReferenceHistory::new(LENGTH, FRAME);
        let reference = white_noise(1, FRAME * 100, 8000);
        let mic = to_i16(&convolve(&reference, &echo_path(2, 48, 3, gain)));
        run(&mut subtractor, &mut history, &reference, &mic, 0.5, 0.5);
        (subtractor, history)
    }

    #[test]
    fn louder_path_is_handed_to_frozen_foreground() {
        let (mut subtractor, mut history) = converged(0.1);

        // Same path, 20 dB louder. The foreground does not adapt at all.
        let reference = white_noise(3, FRAME * 60, 8000);
        let mic = to_i16(&convolve(&reference, &echo_path(2, 48, 3, 1.0)));
        let result = run(&mut subtractor, &mut history, &reference, &mic, 0.0, 0.5);

        let changes = result.outputs.iter().filter(|o| o.echo_path_changed).count();
        assert!(changes >= 1);
        let first = result
            .outputs
            .iter()
            .position(|o| o.echo_path_changed)
            .unwrap();
        assert!(first < 10, "first change after {first} frames");

        let last = result.outputs.last().unwrap().energies;
        let erle_db = 10.0 * (last.mic / last.residual.max(1e-9)).log10();
        assert!(erle_db > 25.0, "ERLE {erle_db} dB");
    }

    #[test]
    fn near_end_noise_keeps_foreground() {
        let (mut subtractor, mut history) = converged(0.5);
        let taps = subtractor.foreground().taps().to_vec();

        let reference = white_noise(4, FRAME * 200, 8000);
        let echo = to_i16(&convolve(&reference, &echo_path(2, 48, 3, 0.5)));
        let near = white_noise(5, reference.len(), 12_000);
        let mic = mix(&echo, &near);
        let result = run(&mut subtractor, &mut history, &reference, &mic, 0.0, 0.5);

        assert!(result.outputs.iter().all(|o| !o.echo_path_changed));
        assert_eq!(subtractor.foreground().taps(), &taps[..]);
    }

    #[test]
    fn poor_background_is_reset_to_foreground() {
        let (mut subtractor, mut history) = converged(0.5);
        subtractor.background.set_filter(&[0.3; LENGTH]);

        let reference = white_noise(6, FRAME * POOR_BACKGROUND_FRAMES, 8000);
        let mic = to_i16(&convolve(&reference, &echo_path(2, 48, 3, 0.5)));
        let frames: Vec<_> = reference
            .chunks_exact(FRAME)
            .zip(mic.chunks_exact(FRAME))
            .collect();
        let (last, first) = frames.split_last().unwrap();

        run(
            &mut subtractor,
            &mut history,
            &first.iter().flat_map(|(r, _)| r.iter().copied()).collect::<Vec<_>>(),
            &first.iter().flat_map(|(_, m)| m.iter().copied()).collect::<Vec<_>>(),
            0.0,
            0.0,
        );
        assert_ne!(subtractor.background.taps(), subtractor.foreground().taps());

        run(&mut subtractor, &mut history, last.0, last.1, 0.0, 0.0);
        assert_eq!(subtractor.background.taps(), subtractor.foreground().taps());
    }

    #[test]
    fn silence_never_switches() {
        let mut subtractor = Subtractor::new(LENGTH, FRAME);
        let mut history = ReferenceHistory::new(LENGTH, FRAME);
        let zeros = vec![0i16; FRAME * 20];
        let result = run(&mut subtractor, &mut history, &zeros, &zeros, 0.5, 0.5);
        assert!(result.outputs.iter().all(|o| !o.echo_path_changed));
        assert!(subtractor.foreground().taps().iter().all(|&t| t == 0.0));
    }
}
