use crate::blink::{BlinkClassifier, BlinkOutcome, Fixation};
use crate::calibration::ScreenCalibrator;
use crate::config::TrackerConfig;
use crate::ear::EarBaselineCalibrator;
use crate::landmarks;
use crate::profile::GazeProfile;
use crate::stabilizer::PositionStabilizer;
use api::{ClickEvent, LandmarkSample, TrackerOutput};
use glam::DVec2;
use log::info;

/// Session-level tracking state: owns every sub-component and runs the
/// per-frame pipeline. Not reentrant; one instance per tracking session.
pub struct GazeTracker {
    config: TrackerConfig,
    screen: DVec2,
    ear_baseline: EarBaselineCalibrator,
    blink: BlinkClassifier,
    calibrator: ScreenCalibrator,
    stabilizer: PositionStabilizer,
    session_start_ms: Option<f64>,
    last_timestamp_ms: Option<f64>,
}

impl GazeTracker {
    pub fn new(config: TrackerConfig, screen_width: f64, screen_height: f64) -> Self {
        let screen = DVec2::new(screen_width, screen_height);
        Self {
            ear_baseline: EarBaselineCalibrator::new(config.ear.clone()),
            blink: BlinkClassifier::new(config.blink.clone()),
            calibrator: ScreenCalibrator::new(config.calibration.clone()),
            stabilizer: PositionStabilizer::new(config.stabilizer.clone(), screen),
            config,
            screen,
            session_start_ms: None,
            last_timestamp_ms: None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.mapping().is_some()
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrator.is_active()
    }

    pub fn active_calibration_point(&self) -> Option<usize> {
        self.calibrator.active_point()
    }

    pub fn ear_baseline(&self) -> Option<f64> {
        self.ear_baseline.baseline()
    }

    /// Begin the guided calibration sequence at the session clock's current
    /// position. Tracking keeps running (fallback or prior mapping) while
    /// the sequence collects.
    pub fn start_calibration(&mut self) {
        let now = self.last_timestamp_ms.unwrap_or(0.0);
        self.calibrator.start(now);
    }

    pub fn abort_calibration(&mut self) {
        self.calibrator.abort();
    }

    /// Host window resized: re-clamp positions, keep calibration.
    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen = DVec2::new(width, height);
        self.stabilizer.set_screen(self.screen);
        info!("Screen size updated to {}x{}", width, height);
    }

    /// Snapshot for persistence.
    pub fn profile(&self) -> GazeProfile {
        GazeProfile {
            ear_baseline: self.ear_baseline.baseline(),
            mapping: self.calibrator.mapping().copied(),
        }
    }

    /// Restore a saved session: baseline skips warm-up, mapping skips the
    /// guided sequence.
    pub fn apply_profile(&mut self, profile: &GazeProfile) {
        if let Some(baseline) = profile.ear_baseline {
            self.ear_baseline.restore(baseline);
        }
        if let Some(mapping) = profile.mapping {
            self.calibrator.restore(mapping);
        }
    }

    /// Per-frame entry point. The step order is load-bearing: the blink gate
    /// must run before any position work so that eyelid-occluded frames can
    /// never touch the buffer or the mapping.
    pub fn process(&mut self, sample: &LandmarkSample) -> TrackerOutput {
        let now = self.bump_timestamp(sample.timestamp_ms);
        let start = *self.session_start_ms.get_or_insert(now);

        // 1. Blink signal.
        let mut click: Option<ClickEvent> = None;
        if let Some(ear) = landmarks::eye_aspect_ratio(sample) {
            if self.ear_baseline.baseline().is_none() {
                self.ear_baseline.observe(ear, now - start);
            }
            let threshold =
                self.ear_baseline.baseline().unwrap_or(0.0) * self.config.ear.threshold_ratio;

            // 2. Classify. The fixation snapshot is the buffer as it stood
            // before this closure; the freeze below keeps it that way.
            let fixation = Fixation {
                mad: self.stabilizer.mad(),
                position: self.stabilizer.position(),
            };
            match self.blink.update(ear, threshold, now, fixation) {
                BlinkOutcome::Click(at) => {
                    click = Some(ClickEvent { x: at.x, y: at.y });
                    self.stabilizer.clear();
                }
                BlinkOutcome::Closed | BlinkOutcome::None => {}
            }
        }

        // While the lid is down the last reported position is re-emitted
        // untouched; mapping an occluded eye would drag the cursor.
        if self.blink.is_closed() {
            let held = self.stabilizer.position();
            return TrackerOutput {
                x: held.x,
                y: held.y,
                calibrated: self.is_calibrated(),
                click: None,
                calibration: None,
            };
        }

        // 3. Calibration script and sample collection.
        let calibration = self.calibrator.advance(now, self.screen);
        let uv = landmarks::iris_center(sample);
        self.calibrator.observe(uv);

        // 4. Map and stabilize.
        let calibrated = self.is_calibrated();
        let candidate = match self.calibrator.mapping() {
            Some(mapping) => mapping.map(uv),
            None => {
                let delta =
                    landmarks::gaze_offset(sample) * self.config.calibration.fallback_sensitivity;
                self.stabilizer.position() + delta
            }
        };
        let frozen = self.blink.in_click_freeze(now);
        let position = self.stabilizer.update(candidate, calibrated, frozen);

        // 5. Emit.
        TrackerOutput {
            x: position.x,
            y: position.y,
            calibrated,
            click,
            calibration,
        }
    }

    /// The upstream video clock is only approximately monotonic; duplicates
    /// and regressions are corrected in place rather than rejected.
    fn bump_timestamp(&mut self, timestamp_ms: f64) -> f64 {
        let now = match self.last_timestamp_ms {
            Some(prev) if timestamp_ms <= prev => prev + 1.0,
            _ => timestamp_ms,
        };
        self.last_timestamp_ms = Some(now);
        now
    }
}
