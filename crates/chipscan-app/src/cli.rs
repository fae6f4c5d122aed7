// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use chipscan_core::ScannerConfig;
use chipscan_core::config::SelectionConfig;
use chipscan_core::error::Result;
use clap::Parser;

use crate::services::config_store::ConfigStore;

/// Point a camera at a chip and print its part code.
#[derive(Parser, Debug)]
#[command(name = "chipscan", version)]
#[command(about = "Read the part code printed on an integrated circuit")]
pub struct Args {
    /// Still images to replay as the camera stream (platform camera if none)
    pub images: Vec<PathBuf>,

    /// Strict matching: longer codes and O/I/L/S/B/Z look-alike correction
    #[arg(long)]
    pub strict: bool,

    /// Start with the high-contrast pass enabled
    #[arg(long)]
    pub high_contrast: bool,

    /// Config file to use instead of the one in the data directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding text-detection.rten and text-recognition.rten
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Milliseconds between automatic captures
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Keep scanning and print every code instead of exiting on the first
    #[arg(short, long)]
    pub watch: bool,

    /// Write the effective settings to the config file and exit
    #[arg(long)]
    pub save_config: bool,
}

impl Args {
    /// Settings for this run: the saved file, then command-line overrides.
    ///
    /// With `--save-config` an unreadable file is an error, so a broken file
    /// is never silently replaced by defaults.
    pub fn resolve_config(&self, store: &ConfigStore) -> Result<ScannerConfig> {
        let mut config = if self.save_config {
            store.load()?
        } else {
            store.load_or_default()
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Layer command-line overrides on top of the saved settings.
    pub fn apply(&self, config: &mut ScannerConfig) {
        if self.strict {
            config.selection = SelectionConfig::strict();
        }
        if self.high_contrast {
            config.preprocess.high_contrast = true;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.scan_interval_ms = interval_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_keep_saved_settings() {
        let args = Args::try_parse_from(["chipscan"]).unwrap();
        let mut config = ScannerConfig::default();
        config.scan_interval_ms = 4000;
        args.apply(&mut config);
        assert_eq!(config.scan_interval_ms, 4000);
        assert_eq!(config.selection.min_length, 4);
        assert!(!config.preprocess.high_contrast);
        assert!(args.images.is_empty());
    }

    #[test]
    fn flags_override_settings() {
        let args = Args::try_parse_from([
            "chipscan",
            "--strict",
            "--high-contrast",
            "--interval-ms",
            "3500",
            "board.jpg",
            "board2.png",
        ])
        .unwrap();
        let mut config = ScannerConfig::default();
        args.apply(&mut config);

        assert_eq!(config.scan_interval_ms, 3500);
        assert!(config.preprocess.high_contrast);
        assert_eq!(config.selection.min_length, 6);
        assert!(config.selection.remap_confusables);
        assert_eq!(args.images.len(), 2);
    }

    #[test]
    fn save_config_refuses_a_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::new(&path);

        let args = Args::try_parse_from(["chipscan", "--save-config", "--strict"]).unwrap();
        let err = args.resolve_config(&store).unwrap_err();
        assert!(matches!(err, chipscan_core::ScanError::Serialization(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn scanning_falls_back_to_defaults_on_a_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::new(&path);

        let args = Args::try_parse_from(["chipscan", "--interval-ms", "2500"]).unwrap();
        let config = args.resolve_config(&store).unwrap();
        assert_eq!(config.scan_interval_ms, 2500);
        assert_eq!(config.selection.min_length, 4);
    }

    #[test]
    fn rejects_non_numeric_interval() {
        assert!(Args::try_parse_from(["chipscan", "--interval-ms", "soon"]).is_err());
    }
}
