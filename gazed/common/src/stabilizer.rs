use crate::config::StabilizerConfig;
use crate::stats;
use glam::DVec2;
use std::collections::VecDeque;

/// Decides, frame by frame, whether the reported cursor should snap, glide,
/// or hold. Constant-factor smoothing alone trades lag against overshoot;
/// switching on measured dispersion gets precision while fixating and
/// stability while scanning.
pub struct PositionStabilizer {
    config: StabilizerConfig,
    buffer: VecDeque<DVec2>,
    position: DVec2,
    screen: DVec2,
    initialized: bool,
}

impl PositionStabilizer {
    pub fn new(config: StabilizerConfig, screen: DVec2) -> Self {
        let capacity = config.buffer_capacity.max(1);
        Self {
            config,
            buffer: VecDeque::with_capacity(capacity),
            position: screen * 0.5,
            screen,
            initialized: false,
        }
    }

    /// The currently reported position.
    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Dispersion of the buffered candidates; zero when the buffer is too
    /// small to measure.
    pub fn mad(&self) -> f64 {
        stats::mad(self.buffer.as_slices().0).unwrap_or(0.0)
    }

    /// Drop buffered candidates. Called after an accepted click so a stale
    /// pre-click cluster cannot vouch for the next blink's fixation.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// The host resized: clamp everything into the new bounds, keep the
    /// calibration untouched.
    pub fn set_screen(&mut self, screen: DVec2) {
        self.screen = screen;
        self.position = self.clamp_to_screen(self.position);
        for p in self.buffer.iter_mut() {
            *p = p.clamp(DVec2::ZERO, screen);
        }
    }

    /// Feed one mapped candidate and get the position to report this frame.
    pub fn update(&mut self, candidate: DVec2, calibrated: bool, frozen: bool) -> DVec2 {
        if !candidate.x.is_finite() || !candidate.y.is_finite() {
            return self.position;
        }

        if !self.initialized {
            self.initialized = true;
            self.position = self.clamp_to_screen(candidate);
            self.buffer.push_back(self.position);
            return self.position;
        }

        self.buffer.push_back(candidate);
        while self.buffer.len() > self.config.buffer_capacity.max(1) {
            self.buffer.pop_front();
        }
        // Keep the ring contiguous so median/MAD can see a single slice.
        self.buffer.make_contiguous();

        if frozen {
            return self.position;
        }

        let contiguous = self.buffer.as_slices().0;
        let median = match stats::median_point(contiguous) {
            Some(m) => m,
            None => return self.position,
        };
        let dispersion = stats::mad(contiguous).unwrap_or(0.0);

        // A single-frame tracking glitch must not teleport the cursor.
        let max_jump = self.config.max_jump_frac * self.screen.x.max(self.screen.y);
        let to_target = median - self.position;
        let target = if to_target.length() > max_jump {
            self.position + to_target.normalize() * max_jump
        } else {
            median
        };

        if dispersion <= self.config.snap_mad_px {
            self.position = self.clamp_to_screen(target);
        } else {
            let alpha = if calibrated {
                self.config.smoothing_calibrated
            } else {
                self.config.smoothing_fallback
            };
            self.position = self.clamp_to_screen(self.position + (target - self.position) * alpha);
        }
        self.position
    }

    fn clamp_to_screen(&self, p: DVec2) -> DVec2 {
        p.clamp(DVec2::ZERO, self.screen)
    }
}
