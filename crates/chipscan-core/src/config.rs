// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::types::{CameraConstraints, RoiSpec};

/// Words that show up on component packages but are never chip codes.
pub const DEFAULT_DENYLIST: &[&str] = &["THE", "AND", "CHIP", "MADE", "CHINA", "SERIES"];

/// Manufacturer prefixes that mark a token as a likely chip code.
pub const DEFAULT_PREFIX_PATTERN: &str = "^(K|H|J|S|T|MT|NH)";

/// Persistent scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Interval between automatic captures, in milliseconds.
    pub scan_interval_ms: u64,
    /// Portion of each frame handed to recognition.
    pub roi: RoiSpec,
    pub preprocess: PreprocessConfig,
    pub selection: SelectionConfig,
    pub recognition: RecognitionConfig,
    pub camera: CameraConstraints,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: 3000,
            roi: RoiSpec::default(),
            preprocess: PreprocessConfig::default(),
            selection: SelectionConfig::default(),
            recognition: RecognitionConfig::default(),
            camera: CameraConstraints::default(),
        }
    }
}

impl ScannerConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    /// Check the settings can drive a scan session.
    pub fn validate(&self) -> Result<()> {
        if self.scan_interval_ms == 0 {
            return Err(ScanError::InvalidConfig(
                "scan interval must be greater than zero".into(),
            ));
        }
        self.roi.validate()?;
        self.preprocess.validate()?;
        self.selection.validate()?;
        if self.recognition.timeout_ms == Some(0) {
            return Err(ScanError::InvalidConfig(
                "recognition timeout must be greater than zero (omit it for no limit)".into(),
            ));
        }
        let cam = &self.camera;
        if !cam.max.contains(cam.min.width, cam.min.height) {
            return Err(ScanError::InvalidConfig(format!(
                "camera minimum {}x{} exceeds maximum {}x{}",
                cam.min.width, cam.min.height, cam.max.width, cam.max.height
            )));
        }
        Ok(())
    }
}

/// Tuning for the optional high-contrast pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Initial state of the user's high-contrast toggle.
    pub high_contrast: bool,
    /// Contrast multiplier around mid-grey (1.0 is a no-op).
    pub contrast_factor: f32,
    /// Brightness offset added after the contrast stretch (-255..=255).
    pub brightness: i32,
    /// Gaussian blur applied before the contrast stretch to flatten sensor noise.
    pub denoise_sigma: Option<f32>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            high_contrast: false,
            contrast_factor: 1.4,
            brightness: 10,
            denoise_sigma: None,
        }
    }
}

impl PreprocessConfig {
    fn validate(&self) -> Result<()> {
        if !self.contrast_factor.is_finite() || self.contrast_factor <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "contrast factor {} must be positive",
                self.contrast_factor
            )));
        }
        if let Some(sigma) = self.denoise_sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(ScanError::InvalidConfig(format!(
                    "denoise sigma {sigma} must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Rules for turning recognized words into a chip code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Shortest token (after normalization) that can be a chip code.
    pub min_length: usize,
    /// Tokens that are never chip codes.
    pub denylist: Vec<String>,
    /// Regex for manufacturer prefixes; matches win over longer tokens.
    pub prefix_pattern: Option<String>,
    /// Rewrite OCR look-alikes (`O→0, I→1, L→1, S→5, B→8, Z→2`).
    ///
    /// Fixes misreads in numeric runs but corrupts codes that really contain
    /// those letters, so it stays off unless asked for.
    pub remap_confusables: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_length: 4,
            denylist: DEFAULT_DENYLIST.iter().map(|w| w.to_string()).collect(),
            prefix_pattern: Some(DEFAULT_PREFIX_PATTERN.to_string()),
            remap_confusables: false,
        }
    }
}

impl SelectionConfig {
    /// Stricter preset: longer minimum and look-alike remapping.
    pub fn strict() -> Self {
        Self {
            min_length: 6,
            remap_confusables: true,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.min_length == 0 {
            return Err(ScanError::InvalidConfig(
                "minimum candidate length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Settings passed to the recognition engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Language hint for the engine.
    pub language: String,
    /// Abandon a recognition after this many milliseconds. `None` waits forever.
    pub timeout_ms: Option<u64>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "eng".into(),
            timeout_ms: Some(15_000),
        }
    }
}

impl RecognitionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Resolution;

    #[test]
    fn defaults_are_valid() {
        let config = ScannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scan_interval(), Duration::from_secs(3));
        assert_eq!(config.recognition.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.selection.min_length, 4);
        assert!(!config.selection.remap_confusables);
    }

    #[test]
    fn strict_preset_raises_length_and_remaps() {
        let strict = SelectionConfig::strict();
        assert_eq!(strict.min_length, 6);
        assert!(strict.remap_confusables);
        assert_eq!(strict.denylist, SelectionConfig::default().denylist);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = ScannerConfig {
            scan_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn inverted_camera_bounds_are_rejected() {
        let mut config = ScannerConfig::default();
        config.camera.min = Resolution::new(4000, 3000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: ScannerConfig =
            serde_json::from_str(r#"{"scan_interval_ms": 4000, "selection": {"min_length": 6}}"#)
                .unwrap();
        assert_eq!(config.scan_interval_ms, 4000);
        assert_eq!(config.selection.min_length, 6);
        assert_eq!(config.selection.denylist.len(), DEFAULT_DENYLIST.len());
        assert_eq!(config.roi, RoiSpec::default());
    }
}
