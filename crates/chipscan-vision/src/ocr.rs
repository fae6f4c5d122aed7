// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR recognizer backed by the `ocrs` crate, a pure-Rust OCR engine running
// neural network models through `rten`.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// chipscan-vision = { path = "crates/chipscan-vision", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs two model files:
//
// - **Detection model** (`text-detection.rten`): locates text regions.
// - **Recognition model** (`text-recognition.rten`): decodes characters.
//
// Running the `ocrs-cli` tool once downloads both into the default cache
// directory, `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`):
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png
//   ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chipscan_core::error::{Result, ScanError};
use chipscan_core::types::Frame;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument, warn};

use crate::recognize::{ProgressReporter, RecognitionResult, Recognizer};

/// Default directory for cached OCR model files.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Progress checkpoints after each engine stage.
const PROGRESS_PREPARED: u8 = 10;
const PROGRESS_WORDS_DETECTED: u8 = 40;
const PROGRESS_LINES_GROUPED: u8 = 60;
const PROGRESS_DONE: u8 = 100;

/// Where to find the `ocrs` models.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expect `text-detection.rten` and `text-recognition.rten` in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(ScanError::Recognition(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// [`Recognizer`] running `ocrs` on the blocking thread pool.
///
/// Model loading is the expensive step, so build one recognizer per scanner
/// view and reuse it for every frame.
#[derive(Clone)]
pub struct OcrsRecognizer {
    engine: Arc<OcrsEngine>,
}

impl OcrsRecognizer {
    /// Load both models and initialise the engine.
    ///
    /// `language` is the hint from the scanner config; `ocrs` only ships a
    /// Latin-script model, so anything else is logged and ignored.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OcrConfig, language: &str) -> Result<Self> {
        config.validate()?;
        if language != "eng" {
            warn!(language, "ocrs only recognizes Latin script; language hint ignored");
        }

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            ScanError::Recognition(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                ScanError::Recognition(format!(
                    "failed to load recognition model from {}: {}",
                    config.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| ScanError::Recognition(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine initialised");
        Ok(Self {
            engine: Arc::new(engine),
        })
    }

    /// Load models from `dir`, which must hold both `.rten` files.
    pub fn from_model_dir(dir: impl AsRef<Path>, language: &str) -> Result<Self> {
        Self::new(&OcrConfig::from_dir(dir), language)
    }
}

impl Recognizer for OcrsRecognizer {
    async fn recognize(&self, image: Frame, progress: ProgressReporter) -> Result<RecognitionResult> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || run_engine(&engine, image, &progress))
            .await
            .map_err(|err| ScanError::Recognition(format!("OCR worker failed: {err}")))?
    }
}

/// Report a finished stage, or stop if the scan loop has given up on this run.
fn checkpoint(progress: &ProgressReporter, percent: u8) -> Result<()> {
    if progress.is_abandoned() {
        debug!(percent, "Recognition abandoned; stopping OCR pass");
        return Err(ScanError::Recognition("recognition abandoned".into()));
    }
    progress.report(percent);
    Ok(())
}

/// Detect, group and decode text lines, reporting after each stage.
///
/// Stops between stages once the run has been abandoned.
fn run_engine(
    engine: &OcrsEngine,
    image: Frame,
    progress: &ProgressReporter,
) -> Result<RecognitionResult> {
    let rgb = DynamicImage::ImageRgba8(image.into_image()).to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!(width, height, "Starting OCR pass");

    let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
        ScanError::Recognition(format!(
            "failed to create image source ({width}x{height}): {err}"
        ))
    })?;
    let input = engine
        .prepare_input(source)
        .map_err(|err| ScanError::Recognition(format!("OCR preprocessing failed: {err}")))?;
    checkpoint(progress, PROGRESS_PREPARED)?;

    let word_rects = engine
        .detect_words(&input)
        .map_err(|err| ScanError::Recognition(format!("word detection failed: {err}")))?;
    checkpoint(progress, PROGRESS_WORDS_DETECTED)?;

    let line_rects = engine.find_text_lines(&input, &word_rects);
    checkpoint(progress, PROGRESS_LINES_GROUPED)?;

    let line_texts = engine
        .recognize_text(&input, &line_rects)
        .map_err(|err| ScanError::Recognition(format!("line recognition failed: {err}")))?;
    progress.report(PROGRESS_DONE);

    let text = line_texts
        .iter()
        .flatten()
        .map(|line| line.to_string())
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    debug!(
        words = word_rects.len(),
        lines = line_rects.len(),
        chars = text.len(),
        "OCR pass complete"
    );
    Ok(RecognitionResult { text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_expected_filenames() {
        let config = OcrConfig::default();
        assert!(
            config
                .detection_model_path
                .ends_with(DETECTION_MODEL_FILENAME)
        );
        assert!(
            config
                .recognition_model_path
                .ends_with(RECOGNITION_MODEL_FILENAME)
        );
        assert_eq!(
            config.detection_model_path.parent(),
            Some(default_model_dir().as_path())
        );
    }

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn missing_models_fail_validation() {
        let config = OcrConfig::from_dir("/nonexistent/path/ocr-models");
        assert!(matches!(config.validate(), Err(ScanError::Recognition(_))));
        assert!(OcrsRecognizer::new(&config, "eng").is_err());
    }
}
