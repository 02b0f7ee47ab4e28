pub use api::{
    CalibrationEvent, ClickEvent, LandmarkSample, LandmarkSource, TrackerOutput,
};

mod affine;
mod blink;
mod calibration;
mod config;
mod ear;
mod landmarks;
pub mod profile;
mod stabilizer;
mod stats;
mod tracker;

pub use affine::AffineMapping;
pub use blink::{BlinkClassifier, BlinkOutcome, Fixation};
pub use calibration::{ScreenCalibrator, CALIBRATION_GRID};
pub use config::{
    BlinkConfig, CalibrationConfig, EarConfig, IoConfig, OutputMode, ScreenConfig,
    StabilizerConfig, TrackerConfig,
};
pub use ear::EarBaselineCalibrator;
pub use profile::GazeProfile;
pub use stabilizer::PositionStabilizer;
pub use tracker::GazeTracker;

/// Downstream consumer seam: cursor renderers and click dispatchers receive
/// every frame's output through this.
pub trait PointerSink: Send {
    fn initialize(&mut self) -> anyhow::Result<()>;
    fn send(&self, output: &TrackerOutput) -> anyhow::Result<()>;
}
