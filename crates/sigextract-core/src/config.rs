// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extractor configuration.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SigextractError};
use crate::types::{
    DEFAULT_HISTORY_LIMIT, EditMode, INK_DARKEN, MAX_ERASER_RADIUS, MIN_CROP_SIZE,
    MIN_ERASER_RADIUS,
};

/// Tunable settings for thresholding and the edit session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Sensitivity applied to a freshly loaded image (0–100).
    pub default_sensitivity_percent: u8,
    /// Eraser radius in display pixels (10–150).
    pub eraser_radius: f64,
    /// Maximum number of undo snapshots kept.
    pub history_limit: usize,
    /// Minimum crop width/height in bitmap pixels.
    pub min_crop_size: f64,
    /// Per-channel darkening applied to ink pixels.
    pub ink_darken: u8,
    /// Mode the session starts in.
    pub initial_mode: EditMode,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            default_sensitivity_percent: 15,
            eraser_radius: 30.0,
            history_limit: DEFAULT_HISTORY_LIMIT,
            min_crop_size: MIN_CROP_SIZE,
            ink_darken: INK_DARKEN,
            initial_mode: EditMode::Crop,
        }
    }
}

impl ExtractorConfig {
    /// Read a JSON configuration file. Missing fields take their defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw).map_err(|err| {
            SigextractError::Config(format!("{}: {err}", path.as_ref().display()))
        })?;
        info!("configuration loaded");
        Ok(config.validated())
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&std::path::Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                debug!("no configuration file; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Clamp every field into the range the editor supports.
    pub fn validated(mut self) -> Self {
        if self.default_sensitivity_percent > 100 {
            warn!(value = self.default_sensitivity_percent, "sensitivity clamped to 100");
            self.default_sensitivity_percent = 100;
        }
        let radius = if self.eraser_radius.is_finite() {
            self.eraser_radius
        } else {
            MIN_ERASER_RADIUS
        };
        self.eraser_radius = radius.clamp(MIN_ERASER_RADIUS, MAX_ERASER_RADIUS);
        self.history_limit = self.history_limit.max(1);
        if !self.min_crop_size.is_finite() || self.min_crop_size < 1.0 {
            self.min_crop_size = MIN_CROP_SIZE;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor() {
        let config = ExtractorConfig::default();
        assert_eq!(config.default_sensitivity_percent, 15);
        assert_eq!(config.eraser_radius, 30.0);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.min_crop_size, 20.0);
        assert_eq!(config.initial_mode, EditMode::Crop);
    }

    #[test]
    fn validated_clamps_out_of_range() {
        let config = ExtractorConfig {
            default_sensitivity_percent: 180,
            eraser_radius: 500.0,
            history_limit: 0,
            min_crop_size: f64::NAN,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.default_sensitivity_percent, 100);
        assert_eq!(config.eraser_radius, 150.0);
        assert_eq!(config.history_limit, 1);
        assert_eq!(config.min_crop_size, 20.0);

        let tiny = ExtractorConfig {
            eraser_radius: 2.0,
            ..Default::default()
        }
        .validated();
        assert_eq!(tiny.eraser_radius, 10.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extractor.json");
        std::fs::write(&path, r#"{ "eraser_radius": 60.0, "initial_mode": "erase" }"#).unwrap();

        let config = ExtractorConfig::load(&path).unwrap();
        assert_eq!(config.eraser_radius, 60.0);
        assert_eq!(config.initial_mode, EditMode::Erase);
        assert_eq!(config.history_limit, 10);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extractor.json");
        let config = ExtractorConfig {
            default_sensitivity_percent: 40,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ExtractorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ExtractorConfig::load(&path),
            Err(SigextractError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ExtractorConfig::load("/nonexistent/extractor.json");
        assert!(matches!(result, Err(SigextractError::Io(_))));
    }

    #[test]
    fn no_path_gives_defaults() {
        assert_eq!(
            ExtractorConfig::load_or_default(None).unwrap(),
            ExtractorConfig::default()
        );
    }
}
