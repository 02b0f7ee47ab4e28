use anyhow::Result;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Six points around the left eye socket, MediaPipe FaceMesh indexing.
/// Order matters for the aspect-ratio formula: outer corner, upper lid (x2),
/// inner corner, lower lid (x2).
pub const LEFT_EYE_RING: [u16; 6] = [33, 160, 158, 133, 153, 144];

/// Four points on the left iris boundary (MediaPipe refined landmarks).
pub const LEFT_IRIS: [u16; 4] = [469, 470, 471, 472];

/// Four points on the right iris boundary.
pub const RIGHT_IRIS: [u16; 4] = [474, 475, 476, 477];

/// Substituted for any landmark the detector failed to deliver.
pub const NEUTRAL_POINT: DVec2 = DVec2::new(0.5, 0.5);

/// One detector frame: normalized `[0,1]` landmark points keyed by index,
/// plus the frame timestamp in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSample {
    pub timestamp_ms: f64,
    points: BTreeMap<u16, DVec2>,
}

impl LandmarkSample {
    pub fn new(timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            points: BTreeMap::new(),
        }
    }

    pub fn with_points<I>(timestamp_ms: f64, points: I) -> Self
    where
        I: IntoIterator<Item = (u16, DVec2)>,
    {
        Self {
            timestamp_ms,
            points: points.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, index: u16, point: DVec2) {
        self.points.insert(index, point);
    }

    /// Landmark lookup with neutral substitution: a missing or non-finite
    /// point degrades to the frame center instead of failing the frame.
    pub fn point(&self, index: u16) -> DVec2 {
        match self.points.get(&index) {
            Some(p) if p.x.is_finite() && p.y.is_finite() => *p,
            _ => NEUTRAL_POINT,
        }
    }

    pub fn has_point(&self, index: u16) -> bool {
        self.points.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Discrete click, dispatched at the position the gaze was holding before
/// the blink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub x: f64,
    pub y: f64,
}

/// Calibration notifications for a guided-dot UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationEvent {
    /// A grid point became active; the UI should render the dot there.
    Point { index: usize, total: usize },
    /// The sequence ended, successfully or not.
    Finished { success: bool },
}

/// Per-frame engine output: the stabilized pointer position in screen
/// pixels, whether the absolute mapping is active, and any events raised
/// while processing this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerOutput {
    pub x: f64,
    pub y: f64,
    pub calibrated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click: Option<ClickEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationEvent>,
}

/// The seam a landmark-producing collaborator plugs into. The engine never
/// talks to cameras or detection models directly; it consumes whatever
/// samples the source yields.
pub trait LandmarkSource {
    fn initialize(&mut self) -> Result<()>;

    /// Non-blocking: `Ok(None)` when no new frame has arrived.
    fn poll(&mut self) -> Result<Option<LandmarkSample>>;

    fn unload(&mut self);
}
