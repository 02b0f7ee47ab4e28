use serde::{Deserialize, Serialize};

/// Engine tuning. Every threshold here was arrived at empirically; none is a
/// physiological constant, so all of them stay adjustable per deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    pub ear: EarConfig,
    pub blink: BlinkConfig,
    pub calibration: CalibrationConfig,
    pub stabilizer: StabilizerConfig,
    pub screen: ScreenConfig,
    pub io: IoConfig,
}

/// How the daemon publishes per-frame output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum OutputMode {
    /// `TrackerOutput` as one JSON datagram per frame.
    #[default]
    #[serde(alias = "Json", alias = "JsonUdp")]
    Generic,
    /// OSC messages under the `/gaze` address space.
    #[serde(alias = "OSC")]
    Osc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// UDP port landmark datagrams arrive on.
    pub listen_port: u16,
    pub output_mode: OutputMode,
    pub send_address: String,
    pub send_port: u16,
    /// Control/status HTTP server.
    pub http_port: u16,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            listen_port: 9870,
            output_mode: OutputMode::default(),
            send_address: "127.0.0.1".to_string(),
            send_port: 9871,
            http_port: 9872,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EarConfig {
    /// How long to collect eyes-open samples before fixing the baseline.
    pub warmup_ms: f64,
    /// Baselines outside this range are treated as sensor garbage.
    pub plausible_min: f64,
    pub plausible_max: f64,
    /// Substituted when the measured baseline is implausible.
    pub fallback_baseline: f64,
    /// Closed threshold as a fraction of the open baseline.
    pub threshold_ratio: f64,
}

impl Default for EarConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 2000.0,
            plausible_min: 0.12,
            plausible_max: 0.45,
            fallback_baseline: 0.25,
            threshold_ratio: 0.65,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Closures shorter than this are noise, longer ones are look-aways.
    pub min_blink_ms: f64,
    pub max_blink_ms: f64,
    /// Minimum spacing between accepted clicks.
    pub cooldown_ms: f64,
    /// Position updates are suppressed this long after an accepted click.
    pub click_freeze_ms: f64,
    /// Pre-closure buffer MAD must be at or below this for a click to count
    /// as intentional.
    pub fixation_mad_px: f64,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            min_blink_ms: 60.0,
            max_blink_ms: 400.0,
            cooldown_ms: 600.0,
            click_freeze_ms: 280.0,
            fixation_mad_px: 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Per-point sample collection window.
    pub dwell_ms: f64,
    /// Saccade debounce between points.
    pub pause_ms: f64,
    /// A grid point needs at least this many observations to be usable.
    pub min_point_samples: usize,
    /// The affine solve needs at least this many usable points.
    pub min_solve_points: usize,
    /// Pixels of cursor motion per unit of normalized iris offset when
    /// running the relative-motion fallback.
    pub fallback_sensitivity: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            dwell_ms: 900.0,
            pause_ms: 350.0,
            min_point_samples: 3,
            min_solve_points: 5,
            fallback_sensitivity: 900.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Candidate ring size. Odd keeps the median on a real sample.
    pub buffer_capacity: usize,
    /// At or below this dispersion the gaze counts as fixating and the
    /// cursor snaps without smoothing lag.
    pub snap_mad_px: f64,
    /// Exponential smoothing factors toward the clamped target.
    pub smoothing_calibrated: f64,
    pub smoothing_fallback: f64,
    /// Single-frame moves are clamped to this fraction of the larger screen
    /// dimension.
    pub max_jump_frac: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 11,
            snap_mad_px: 7.0,
            smoothing_calibrated: 0.22,
            smoothing_fallback: 0.12,
            max_jump_frac: 0.15,
        }
    }
}
