//! Echo path estimation.
//!
//! A time-domain NLMS filter models the loudspeaker-to-microphone path from
//! a rolling history of the reference signal. A step-size controller watches
//! smoothed frame energies and throttles adaptation while the near end is
//! talking, so the path estimate does not drift towards near-end speech.
//! A background filter that ignores the controller catches echo path
//! changes the throttled foreground filter would otherwise miss.

pub mod config;
pub mod history;
pub mod nlms;
pub mod step_size_controller;
pub mod subtractor;

pub use config::AdaptationConfig;
pub use history::ReferenceHistory;
pub use nlms::{FrameEnergies, NlmsFilter};
pub use step_size_controller::StepSizeController;
pub use subtractor::{Subtractor, SubtractorOutput};
