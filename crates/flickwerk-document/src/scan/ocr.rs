// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) for the patch engine.
//
// The engine consumes recognition through the [`TextRecognizer`] trait so
// the platform can supply its own service (Vision, MLKit, ...) and tests can
// inject fakes. A pure-Rust implementation backed by the `ocrs` crate is
// available behind the `ocr` feature gate:
//
// ```toml
// flickwerk-document = { path = "crates/flickwerk-document", features = ["ocr"] }
// ```
//
// # Model Setup (feature `ocr`)
//
// The ocrs engine requires two model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Models can be downloaded from the ocrs-models repository, or obtained
// automatically by running the `ocrs-cli` tool once:
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png  # downloads models to ~/.cache/ocrs/
//   ```
//
// The default cache directory is `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`).

use image::DynamicImage;

use flickwerk_core::geometry::RelativeRect;
use flickwerk_core::types::LanguageHint;

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedLine {
    /// The recognised text content of this line.
    pub text: String,
    /// The line's bounding box as fractions of the submitted crop's
    /// dimensions (top-left origin, like the crop bitmap itself).
    pub bounds: RelativeRect,
}

/// Text recognition service.
///
/// Contract: lines come back in the service's reported order (no
/// layout-aware reordering), each with crop-relative bounds. Recognition
/// failure yields an empty list — it must never error into the caller's
/// flow, because a failed recognition still opens an (empty) edit session.
/// Implementations must support the full hint set simultaneously; documents
/// mix scripts.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage, hints: &[LanguageHint]) -> Vec<RecognizedLine>;
}

#[cfg(feature = "ocr")]
pub use engine::{OcrConfig, OcrsRecognizer};

#[cfg(feature = "ocr")]
mod engine {
    use std::path::{Path, PathBuf};

    use image::DynamicImage;
    use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
    use rten::Model;
    use tracing::{debug, info, instrument, warn};

    use flickwerk_core::error::FlickwerkError;
    use flickwerk_core::geometry::RelativeRect;
    use flickwerk_core::types::LanguageHint;

    use super::{RecognizedLine, TextRecognizer};

    /// Default directory for cached OCR model files.
    ///
    /// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`,
    /// falling back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
    fn default_model_dir() -> PathBuf {
        if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
            PathBuf::from(xdg).join("ocrs")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".cache").join("ocrs")
        } else {
            // Last resort — current directory.
            PathBuf::from("ocrs-models")
        }
    }

    /// Well-known filenames for the detection and recognition models.
    const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
    const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

    /// Configuration for constructing an [`OcrsRecognizer`].
    #[derive(Debug, Clone)]
    pub struct OcrConfig {
        /// Path to the text-detection model file (`.rten`).
        pub detection_model_path: PathBuf,
        /// Path to the text-recognition model file (`.rten`).
        pub recognition_model_path: PathBuf,
    }

    impl Default for OcrConfig {
        /// Returns a config pointing at the default model cache directory.
        fn default() -> Self {
            let dir = default_model_dir();
            Self {
                detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
                recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
            }
        }
    }

    impl OcrConfig {
        /// Create a config with explicit model directory.
        pub fn from_dir(dir: impl AsRef<Path>) -> Self {
            let dir = dir.as_ref();
            Self {
                detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
                recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
            }
        }

        /// Verify that both model files exist and are readable.
        pub fn validate(&self) -> Result<(), FlickwerkError> {
            if !self.detection_model_path.exists() {
                return Err(FlickwerkError::OcrError(format!(
                    "detection model not found at {}; run `ocrs-cli` once to download models",
                    self.detection_model_path.display()
                )));
            }
            if !self.recognition_model_path.exists() {
                return Err(FlickwerkError::OcrError(format!(
                    "recognition model not found at {}; run `ocrs-cli` once to download models",
                    self.recognition_model_path.display()
                )));
            }
            Ok(())
        }
    }

    /// Pure-Rust recognizer backed by the `ocrs` engine.
    ///
    /// Model loading is the expensive step — keep the recognizer around and
    /// reuse it for many crops.
    ///
    /// # Performance
    ///
    /// **Important:** The `ocrs` and `rten` crates must be compiled in
    /// release mode. Debug builds will be extremely slow (10-100x slower).
    pub struct OcrsRecognizer {
        engine: OcrsEngine,
    }

    impl OcrsRecognizer {
        /// Create a recognizer, loading models from the paths in `config`.
        #[instrument(skip_all, fields(
            detection = %config.detection_model_path.display(),
            recognition = %config.recognition_model_path.display(),
        ))]
        pub fn new(config: OcrConfig) -> Result<Self, FlickwerkError> {
            config.validate()?;

            info!("Loading OCR detection model");
            let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
                FlickwerkError::OcrError(format!(
                    "failed to load detection model from {}: {}",
                    config.detection_model_path.display(),
                    err
                ))
            })?;

            info!("Loading OCR recognition model");
            let recognition_model =
                Model::load_file(&config.recognition_model_path).map_err(|err| {
                    FlickwerkError::OcrError(format!(
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
            .map_err(|err| {
                FlickwerkError::OcrError(format!("failed to initialise OCR engine: {}", err))
            })?;

            info!("OCR engine initialised successfully");
            Ok(Self { engine })
        }

        /// Create a recognizer using the default model cache directory.
        pub fn with_defaults() -> Result<Self, FlickwerkError> {
            Self::new(OcrConfig::default())
        }

        fn recognize_lines(
            &self,
            image: &DynamicImage,
        ) -> Result<Vec<RecognizedLine>, FlickwerkError> {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();

            let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
                FlickwerkError::OcrError(format!(
                    "failed to create image source ({}x{}): {}",
                    width, height, err
                ))
            })?;

            let input = self.engine.prepare_input(source).map_err(|err| {
                FlickwerkError::OcrError(format!("OCR preprocessing failed: {}", err))
            })?;

            // Step 1: Detect word bounding boxes.
            let word_rects = self
                .engine
                .detect_words(&input)
                .map_err(|err| FlickwerkError::OcrError(format!("word detection failed: {}", err)))?;
            debug!(word_count = word_rects.len(), "Words detected");

            // Step 2: Group words into text lines.
            let line_rects = self.engine.find_text_lines(&input, &word_rects);
            debug!(line_count = line_rects.len(), "Text lines found");

            // Step 3: Recognise characters within each line.
            let line_texts = self
                .engine
                .recognize_text(&input, &line_rects)
                .map_err(|err| {
                    FlickwerkError::OcrError(format!("line recognition failed: {}", err))
                })?;

            let mut results = Vec::with_capacity(line_texts.len());
            for line in line_texts.iter().flatten() {
                let text = line.to_string();
                if text.trim().is_empty() {
                    continue;
                }

                let rect = line.rotated_rect().bounding_rect();
                let bounds = RelativeRect::new(
                    rect.left() as f32 / width as f32,
                    rect.top() as f32 / height as f32,
                    rect.width() as f32 / width as f32,
                    rect.height() as f32 / height as f32,
                );
                results.push(RecognizedLine { text, bounds });
            }

            debug!(recognized_lines = results.len(), "OCR complete");
            Ok(results)
        }
    }

    impl TextRecognizer for OcrsRecognizer {
        #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
        fn recognize(&self, image: &DynamicImage, hints: &[LanguageHint]) -> Vec<RecognizedLine> {
            if hints.iter().any(|h| *h != LanguageHint::Latin) {
                // The bundled ocrs models are Latin-centric; other scripts
                // degrade to best-effort rather than failing the session.
                warn!(?hints, "non-Latin hints requested; recognition is best-effort");
            }

            match self.recognize_lines(image) {
                Ok(lines) => lines,
                Err(err) => {
                    warn!(%err, "recognition failed; returning empty result");
                    Vec::new()
                }
            }
        }
    }

    /// Check whether OCR model files exist in the default cache location.
    pub fn models_available() -> bool {
        let config = OcrConfig::default();
        config.detection_model_path.exists() && config.recognition_model_path.exists()
    }

}
