use crate::config::EarConfig;
use crate::stats;
use log::{info, warn};

/// Learns the user's neutral eyes-open aspect ratio during a warm-up window.
/// One-shot: once the baseline is fixed it never drifts for the session.
/// Median over mean keeps transient squints and detector glitches out of
/// the estimate.
pub struct EarBaselineCalibrator {
    config: EarConfig,
    samples: Vec<f64>,
    baseline: Option<f64>,
}

impl EarBaselineCalibrator {
    pub fn new(config: EarConfig) -> Self {
        Self {
            config,
            samples: Vec::new(),
            baseline: None,
        }
    }

    /// Feed one EAR sample. Returns `None` until the warm-up window has
    /// elapsed, then the fixed baseline on every subsequent call.
    pub fn observe(&mut self, ear: f64, elapsed_ms: f64) -> Option<f64> {
        if let Some(baseline) = self.baseline {
            return Some(baseline);
        }

        if elapsed_ms < self.config.warmup_ms {
            self.samples.push(ear);
            return None;
        }

        let measured = stats::median(&self.samples);
        let baseline = match measured {
            Some(m) if m >= self.config.plausible_min && m <= self.config.plausible_max => {
                info!("EAR baseline calibrated: {:.4}", m);
                m
            }
            Some(m) => {
                warn!(
                    "EAR baseline {:.4} outside plausible range [{:.2}, {:.2}], using fallback {:.2}",
                    m, self.config.plausible_min, self.config.plausible_max,
                    self.config.fallback_baseline
                );
                self.config.fallback_baseline
            }
            None => {
                warn!(
                    "No EAR samples collected during warm-up, using fallback {:.2}",
                    self.config.fallback_baseline
                );
                self.config.fallback_baseline
            }
        };

        self.baseline = Some(baseline);
        self.samples.clear();
        Some(baseline)
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Install a previously saved baseline, skipping warm-up entirely.
    pub fn restore(&mut self, baseline: f64) {
        self.baseline = Some(baseline);
        self.samples.clear();
    }
}
