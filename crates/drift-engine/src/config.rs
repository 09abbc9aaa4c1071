//! Runtime settings loaded from JSON.
//!
//! Every field has a default, so a partial file only overrides what it
//! names. Out-of-range values are clamped with a warning rather than
//! rejected; only unreadable or syntactically broken files are errors.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::ClockConfig;
use crate::DriftError;

/// Smallest accepted window width, in pixels.
pub const MIN_WIDTH: u32 = 320;
/// Smallest accepted window height, in pixels.
pub const MIN_HEIGHT: u32 = 240;
pub const MIN_RENDER_FPS: u32 = 10;
pub const MIN_LOGIC_FPS: u32 = 15;
pub const MAX_SUBSTEPS: u32 = 8;

/// Window, timing, physics and persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Screen width in pixels.
    pub width: u32,
    /// Screen height in pixels.
    pub height: u32,
    /// Target presentation rate, frames per second.
    pub render_fps: u32,
    /// Fixed simulation rate, ticks per second.
    pub logic_fps: u32,
    /// Physics sub-steps per tick, `1..=8`.
    pub physics_substeps: u32,
    /// Seed for all gameplay randomness.
    pub seed: u64,
    /// Particle pool cap; spawns past it are dropped.
    pub max_particles: usize,
    /// Where the high score is kept; `None` keeps it in memory only.
    pub high_score_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            render_fps: 60,
            logic_fps: 60,
            physics_substeps: 4,
            seed: 0x5eed,
            max_particles: 4096,
            high_score_path: None,
        }
    }
}

impl Settings {
    /// Read and sanitize a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriftError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DriftError::Io {
            action: "read settings",
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&text).map_err(|source| DriftError::Parse {
            what: "settings",
            path: path.to_path_buf(),
            source,
        })?;
        Ok(settings.sanitized())
    }

    /// Load, or fall back to defaults with a warning.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "using default settings");
            Self::default()
        })
    }

    /// Clamp every field into its supported range.
    pub fn sanitized(mut self) -> Self {
        fn at_least(name: &str, value: &mut u32, min: u32) {
            if *value < min {
                warn!(setting = name, value = *value, min, "setting below minimum, clamped");
                *value = min;
            }
        }
        at_least("width", &mut self.width, MIN_WIDTH);
        at_least("height", &mut self.height, MIN_HEIGHT);
        at_least("render_fps", &mut self.render_fps, MIN_RENDER_FPS);
        at_least("logic_fps", &mut self.logic_fps, MIN_LOGIC_FPS);
        at_least("physics_substeps", &mut self.physics_substeps, 1);
        if self.physics_substeps > MAX_SUBSTEPS {
            warn!(value = self.physics_substeps, max = MAX_SUBSTEPS, "too many physics substeps, clamped");
            self.physics_substeps = MAX_SUBSTEPS;
        }
        self
    }

    pub fn clock_config(&self) -> ClockConfig {
        ClockConfig {
            logic_rate_hz: f64::from(self.logic_fps),
            render_rate_hz: f64::from(self.render_fps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"logic_fps": 120, "seed": 9}"#).expect("valid");
        assert_eq!(settings.logic_fps, 120);
        assert_eq!(settings.seed, 9);
        assert_eq!(settings.width, 1280);
        assert_eq!(settings.physics_substeps, 4);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let settings = Settings {
            width: 10,
            height: 10,
            render_fps: 1,
            logic_fps: 2,
            physics_substeps: 50,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(
            (settings.width, settings.height, settings.render_fps, settings.logic_fps, settings.physics_substeps),
            (MIN_WIDTH, MIN_HEIGHT, MIN_RENDER_FPS, MIN_LOGIC_FPS, MAX_SUBSTEPS)
        );
        let zero = Settings {
            physics_substeps: 0,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(zero.physics_substeps, 1);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        assert!(matches!(
            Settings::load("/no/such/settings.json"),
            Err(DriftError::Io { .. })
        ));
        assert_eq!(Settings::load_or_default("/no/such/settings.json"), Settings::default());
    }

    #[test]
    fn clock_config_follows_rates() {
        let config = Settings::default().clock_config();
        assert_eq!(config.logic_rate_hz, 60.0);
        assert_eq!(config.render_rate_hz, 60.0);
    }
}
