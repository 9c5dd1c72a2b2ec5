use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::media::cache::DEFAULT_MAX_FRAME_COUNT;
use crate::media::types::{FitPolicy, RepeatCount, TargetSize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub version: u32,
    /// Upper bound on decoded frames held in memory.
    #[serde(default = "default_max_frame_count")]
    pub max_frame_count: usize,
    /// Largest time step one tick may apply, in seconds.
    #[serde(default = "default_max_time_step")]
    pub max_time_step_secs: f32,
    #[serde(default)]
    pub target_size: Option<TargetSize>,
    #[serde(default)]
    pub fit_policy: FitPolicy,
    #[serde(default = "default_true")]
    pub needs_prescaling: bool,
    #[serde(default)]
    pub repeat: RepeatCount,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_max_frame_count() -> usize {
    DEFAULT_MAX_FRAME_COUNT
}

fn default_max_time_step() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_speed() -> f32 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            version: 1,
            max_frame_count: default_max_frame_count(),
            max_time_step_secs: default_max_time_step(),
            target_size: None,
            fit_policy: FitPolicy::default(),
            needs_prescaling: true,
            repeat: RepeatCount::default(),
            speed: default_speed(),
        }
    }
}

impl PlaybackConfig {
    /// `<config dir>/flipbook/playback.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("flipbook").join("playback.json"))
    }

    /// Load from the default location. Missing or malformed files give defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    log::warn!("Ignoring playback config: {e:#}");
                }
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            log::warn!("Failed to save playback config: {e:#}");
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }
}
