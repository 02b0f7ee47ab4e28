use crate::config::BlinkConfig;
use glam::DVec2;
use log::debug;

/// Stabilizer snapshot handed to the classifier at the moment the eye
/// reopens. The freeze invariant guarantees the buffer was last touched
/// before the closure, so this reads as "was the user fixating before they
/// blinked".
#[derive(Debug, Clone, Copy)]
pub struct Fixation {
    pub mad: f64,
    pub position: DVec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlinkOutcome {
    None,
    /// The eye just transitioned to closed this frame.
    Closed,
    /// A deliberate blink was accepted; click at this position.
    Click(DVec2),
}

/// Open/Closed state machine over the EAR threshold. A closure only becomes
/// a click if its duration, the click cooldown, and the pre-closure fixation
/// all check out.
pub struct BlinkClassifier {
    config: BlinkConfig,
    closed: bool,
    closed_since_ms: f64,
    last_click_ms: f64,
    freeze_until_ms: f64,
}

impl BlinkClassifier {
    pub fn new(config: BlinkConfig) -> Self {
        Self {
            config,
            closed: false,
            closed_since_ms: 0.0,
            last_click_ms: f64::NEG_INFINITY,
            freeze_until_ms: f64::NEG_INFINITY,
        }
    }

    /// Advance the state machine one frame. A zero threshold (baseline never
    /// established) keeps the state permanently open: EAR never drops below
    /// zero, so classification is effectively disabled.
    pub fn update(&mut self, ear: f64, threshold: f64, now_ms: f64, fixation: Fixation) -> BlinkOutcome {
        if !self.closed {
            if ear < threshold {
                self.closed = true;
                self.closed_since_ms = now_ms;
                return BlinkOutcome::Closed;
            }
            return BlinkOutcome::None;
        }

        if ear < threshold {
            // Still closed.
            return BlinkOutcome::None;
        }

        self.closed = false;
        let duration = now_ms - self.closed_since_ms;

        if duration < self.config.min_blink_ms || duration > self.config.max_blink_ms {
            debug!("blink discarded: duration {:.0}ms out of range", duration);
            return BlinkOutcome::None;
        }
        if now_ms - self.last_click_ms < self.config.cooldown_ms {
            debug!("blink discarded: within {:.0}ms cooldown", self.config.cooldown_ms);
            return BlinkOutcome::None;
        }
        if fixation.mad > self.config.fixation_mad_px {
            debug!(
                "blink discarded: pre-closure MAD {:.1}px above {:.1}px",
                fixation.mad, self.config.fixation_mad_px
            );
            return BlinkOutcome::None;
        }

        self.last_click_ms = now_ms;
        self.freeze_until_ms = now_ms + self.config.click_freeze_ms;
        debug!("click accepted at ({:.0}, {:.0})", fixation.position.x, fixation.position.y);
        BlinkOutcome::Click(fixation.position)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True inside the post-click window during which position updates are
    /// suppressed so the blink itself cannot perturb the cursor.
    pub fn in_click_freeze(&self, now_ms: f64) -> bool {
        now_ms < self.freeze_until_ms
    }
}
