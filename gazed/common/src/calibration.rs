use crate::affine::AffineMapping;
use crate::config::CalibrationConfig;
use crate::stats;
use api::CalibrationEvent;
use glam::DVec2;
use log::{debug, info, warn};
use std::collections::VecDeque;

/// Guided calibration targets as screen fractions: corners, edge midpoints,
/// center, visited in raster order.
pub const CALIBRATION_GRID: [(f64, f64); 9] = [
    (0.1, 0.1),
    (0.5, 0.1),
    (0.9, 0.1),
    (0.1, 0.5),
    (0.5, 0.5),
    (0.9, 0.5),
    (0.1, 0.9),
    (0.5, 0.9),
    (0.9, 0.9),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    /// Collecting samples for a grid point until the deadline.
    Dwell { index: usize, until_ms: f64 },
    /// Saccade debounce before the next point activates.
    Pause { next: usize, until_ms: f64 },
}

struct CalibrationPoint {
    target_frac: DVec2,
    samples: Vec<DVec2>,
}

/// Clock-driven 9-point calibration sequence. No timers: `advance` is called
/// once per frame with the frame timestamp, which keeps the whole procedure
/// deterministic under test.
pub struct ScreenCalibrator {
    config: CalibrationConfig,
    phase: Phase,
    points: Vec<CalibrationPoint>,
    mapping: Option<AffineMapping>,
    events: VecDeque<CalibrationEvent>,
}

impl ScreenCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            points: Vec::new(),
            mapping: None,
            events: VecDeque::new(),
        }
    }

    pub fn mapping(&self) -> Option<&AffineMapping> {
        self.mapping.as_ref()
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Index of the currently active grid point, for status reporting.
    pub fn active_point(&self) -> Option<usize> {
        match self.phase {
            Phase::Dwell { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Install a previously solved mapping (profile load).
    pub fn restore(&mut self, mapping: AffineMapping) {
        if mapping.is_finite() {
            self.mapping = Some(mapping);
        }
    }

    /// Begin the guided sequence. Any prior collection state is discarded;
    /// an existing mapping stays live until the new sequence resolves.
    pub fn start(&mut self, now_ms: f64) {
        self.points = CALIBRATION_GRID
            .iter()
            .map(|&(fx, fy)| CalibrationPoint {
                target_frac: DVec2::new(fx, fy),
                samples: Vec::new(),
            })
            .collect();
        self.phase = Phase::Dwell {
            index: 0,
            until_ms: now_ms + self.config.dwell_ms,
        };
        self.events.clear();
        self.events.push_back(CalibrationEvent::Point {
            index: 0,
            total: CALIBRATION_GRID.len(),
        });
        info!("Screen calibration started ({} points)", CALIBRATION_GRID.len());
    }

    /// Abandon an active sequence. Partial coefficients must never leak, so
    /// the mapping is cleared and the session falls back to relative
    /// tracking. A no-op when nothing is running.
    pub fn abort(&mut self) {
        if !self.is_active() {
            return;
        }
        info!("Screen calibration aborted");
        self.phase = Phase::Idle;
        self.points.clear();
        self.mapping = None;
        self.events.push_back(CalibrationEvent::Finished { success: false });
    }

    /// Advance the dwell/pause script to the frame timestamp. Emits at most
    /// one queued event per call.
    pub fn advance(&mut self, now_ms: f64, screen: DVec2) -> Option<CalibrationEvent> {
        match self.phase {
            Phase::Idle => {}
            Phase::Dwell { index, until_ms } if now_ms >= until_ms => {
                debug!(
                    "calibration point {} collected {} samples",
                    index,
                    self.points[index].samples.len()
                );
                let next = index + 1;
                if next < CALIBRATION_GRID.len() {
                    self.phase = Phase::Pause {
                        next,
                        until_ms: now_ms + self.config.pause_ms,
                    };
                } else {
                    self.finish(screen);
                }
            }
            Phase::Pause { next, until_ms } if now_ms >= until_ms => {
                self.phase = Phase::Dwell {
                    index: next,
                    until_ms: now_ms + self.config.dwell_ms,
                };
                self.events.push_back(CalibrationEvent::Point {
                    index: next,
                    total: CALIBRATION_GRID.len(),
                });
            }
            _ => {}
        }
        self.events.pop_front()
    }

    /// Record one iris observation for the active point, if any.
    pub fn observe(&mut self, uv: DVec2) {
        if let Phase::Dwell { index, .. } = self.phase {
            self.points[index].samples.push(uv);
        }
    }

    fn finish(&mut self, screen: DVec2) {
        self.phase = Phase::Idle;

        let observations: Vec<(DVec2, DVec2)> = self
            .points
            .iter()
            .filter(|p| p.samples.len() >= self.config.min_point_samples)
            .filter_map(|p| {
                stats::median_point(&p.samples).map(|uv| (uv, p.target_frac * screen))
            })
            .collect();

        if observations.len() < self.config.min_solve_points {
            warn!(
                "Calibration failed: only {} of {} points usable (need {})",
                observations.len(),
                CALIBRATION_GRID.len(),
                self.config.min_solve_points
            );
            self.mapping = None;
            self.points.clear();
            self.events.push_back(CalibrationEvent::Finished { success: false });
            return;
        }

        match AffineMapping::solve(&observations) {
            Some(mapping) => {
                info!(
                    "Calibration solved from {} points: x=({:.1}, {:.1}, {:.1}) y=({:.1}, {:.1}, {:.1})",
                    observations.len(),
                    mapping.ax, mapping.bx, mapping.cx,
                    mapping.ay, mapping.by, mapping.cy
                );
                self.mapping = Some(mapping);
                self.events.push_back(CalibrationEvent::Finished { success: true });
            }
            None => {
                warn!("Calibration failed: singular system, falling back to relative tracking");
                self.mapping = None;
                self.events.push_back(CalibrationEvent::Finished { success: false });
            }
        }
        self.points.clear();
    }
}
