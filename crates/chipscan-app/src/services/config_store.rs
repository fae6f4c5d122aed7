// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner settings persisted as pretty-printed JSON.

use std::path::{Path, PathBuf};

use chipscan_core::ScannerConfig;
use chipscan_core::error::Result;
use tracing::{debug, info, warn};

use super::data_dir;

pub const CONFIG_FILE: &str = "config.json";

/// Reads and writes one `config.json`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store in the application data directory.
    pub fn default_location() -> Self {
        Self::new(data_dir::data_dir().join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved settings; a missing file yields the defaults.
    ///
    /// Fields absent from the file take their default values.
    pub fn load(&self) -> Result<ScannerConfig> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No saved config; using defaults");
            return Ok(ScannerConfig::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Like [`load`](Self::load), but an unreadable file also yields the defaults.
    pub fn load_or_default(&self) -> ScannerConfig {
        self.load().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "Saved config unreadable; using defaults");
            ScannerConfig::default()
        })
    }

    pub fn save(&self, config: &ScannerConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json)?;
        info!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipscan_core::ScanError;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join(CONFIG_FILE));
        let config = store.load().unwrap();
        assert_eq!(config.scan_interval_ms, ScannerConfig::default().scan_interval_ms);
    }

    #[test]
    fn saved_settings_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join(CONFIG_FILE));

        let mut config = ScannerConfig::default();
        config.scan_interval_ms = 4000;
        config.preprocess.high_contrast = true;
        config.selection.min_length = 6;
        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.scan_interval_ms, 4000);
        assert!(loaded.preprocess.high_contrast);
        assert_eq!(loaded.selection.min_length, 6);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "scan_interval_ms": 3500 }"#).unwrap();

        let config = ConfigStore::new(&path).load().unwrap();
        assert_eq!(config.scan_interval_ms, 3500);
        assert_eq!(config.selection.min_length, 4);
        assert_eq!(config.recognition.language, "eng");
    }

    #[test]
    fn malformed_file_is_reported_then_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::new(&path);
        assert!(matches!(store.load(), Err(ScanError::Serialization(_))));
        let config = store.load_or_default();
        assert_eq!(config.scan_interval_ms, ScannerConfig::default().scan_interval_ms);
    }
}
