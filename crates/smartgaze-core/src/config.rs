//! TOML-based application configuration.
//!
//! Stores the per-mode image source folders, the mode order, the gaze
//! confidence threshold, the condition-assignment seed, and the export
//! directory. Stored at `~/.config/smartgaze/config.toml`; set
//! `SMARTGAZE_ENV=dev` to use a development data directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError};
use crate::gaze::CONFIDENCE_THRESHOLD;
use crate::modes::ModeKind;

/// Image source folders, one per viewing mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDirs {
    #[serde(default)]
    pub paired: Option<PathBuf>,
    #[serde(default)]
    pub grid: Option<PathBuf>,
    #[serde(default)]
    pub sequential: Option<PathBuf>,
}

impl ImageDirs {
    pub fn for_mode(&self, mode: ModeKind) -> Option<&PathBuf> {
        match mode {
            ModeKind::PairedElimination => self.paired.as_ref(),
            ModeKind::Grid => self.grid.as_ref(),
            ModeKind::Sequential => self.sequential.as_ref(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/smartgaze/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_mode_order")]
    pub mode_order: Vec<ModeKind>,
    #[serde(default)]
    pub image_dirs: ImageDirs,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Seed for condition assignment; unset means non-reproducible.
    #[serde(default)]
    pub assignment_seed: Option<u64>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    #[serde(default = "default_ranking_top_k")]
    pub ranking_top_k: usize,
}

fn default_mode_order() -> Vec<ModeKind> {
    vec![
        ModeKind::PairedElimination,
        ModeKind::Grid,
        ModeKind::Sequential,
    ]
}

fn default_confidence_threshold() -> f64 {
    CONFIDENCE_THRESHOLD
}

fn default_ranking_top_k() -> usize {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode_order: default_mode_order(),
            image_dirs: ImageDirs::default(),
            confidence_threshold: default_confidence_threshold(),
            assignment_seed: None,
            export_dir: None,
            ranking_top_k: default_ranking_top_k(),
        }
    }
}

impl Config {
    /// Load from the default path; a missing file yields the defaults.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let config = toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), CoreError> {
        let path = Self::path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<(), CoreError> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }
}

/// Returns `~/.config/smartgaze[-dev]/` based on SMARTGAZE_ENV.
///
/// Set SMARTGAZE_ENV=dev to use the development data directory.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SMARTGAZE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("smartgaze-dev")
    } else {
        base_dir.join("smartgaze")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_fields() {
        let config = Config::default();
        assert_eq!(config.mode_order.len(), 3);
        assert_eq!(config.confidence_threshold, CONFIDENCE_THRESHOLD);
        assert_eq!(config.ranking_top_k, 3);
        assert!(config.assignment_seed.is_none());
    }

    #[test]
    fn toml_round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.assignment_seed = Some(7);
        config.image_dirs.paired = Some(PathBuf::from("/assets/paired"));
        config.confidence_threshold = 0.8;

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "assignment_seed = 3\n").unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.assignment_seed, Some(3));
        assert_eq!(loaded.mode_order.len(), 3);
        assert_eq!(loaded.confidence_threshold, CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn image_dirs_lookup_by_mode() {
        let mut dirs = ImageDirs::default();
        dirs.grid = Some(PathBuf::from("/assets/grid"));
        assert!(dirs.for_mode(ModeKind::Grid).is_some());
        assert!(dirs.for_mode(ModeKind::Sequential).is_none());
    }
}
