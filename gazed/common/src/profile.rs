use crate::affine::AffineMapping;
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const PROFILE_FILENAME: &str = "gaze_profile.json";

/// Persisted per-user calibration: the learned EAR baseline and the solved
/// screen mapping. A returning user starts with both already in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeProfile {
    pub ear_baseline: Option<f64>,
    pub mapping: Option<AffineMapping>,
}

impl GazeProfile {
    /// Non-finite values never reach disk; a corrupted save must not poison
    /// the next session.
    fn sanitized(&self) -> GazeProfile {
        let mut profile = self.clone();
        if let Some(b) = profile.ear_baseline {
            if !b.is_finite() {
                profile.ear_baseline = None;
            }
        }
        if let Some(m) = &profile.mapping {
            if !m.is_finite() {
                profile.mapping = None;
            }
        }
        profile
    }
}

pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            path: storage_dir.join(PROFILE_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, profile: &GazeProfile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create profile dir: {:?}", parent))?;
            }
        }
        let file = File::create(&self.path).context("Failed to create profile file")?;
        serde_json::to_writer_pretty(file, &profile.sanitized())
            .context("Failed to serialize gaze profile")?;
        info!("Saved gaze profile to {:?}", self.path);
        Ok(())
    }

    /// `Ok(None)` when no profile exists yet; parse errors are real errors.
    pub fn load(&self) -> Result<Option<GazeProfile>> {
        if !self.path.exists() {
            info!("No gaze profile found at {:?}", self.path);
            return Ok(None);
        }
        let file = File::open(&self.path).context("Failed to open profile file")?;
        let reader = BufReader::new(file);
        let profile: GazeProfile =
            serde_json::from_reader(reader).context("Failed to deserialize gaze profile")?;
        info!("Loaded gaze profile from {:?}", self.path);
        Ok(Some(profile))
    }
}
