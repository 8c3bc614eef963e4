//! Statically linked Tesseract engine
//!
//! Uses tesseract-static, so no system Tesseract is needed. Traineddata for
//! each language is downloaded into the user cache directory on first use,
//! unless a tessdata directory is configured.

use crate::config::Config;
use crate::engine::{EngineFactory, OcrResult, RecognitionEngine};
use crate::error::OcrError;
use crate::language::Language;
use crate::preprocessing::ProcessedImage;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tesseract_static::tesseract::Tesseract;

pub const NAME: &str = "leptess";

pub struct LeptessEngineFactory {
    /// Configured tessdata directory; `None` means download into the cache
    tessdata_path: Option<String>,
}

impl LeptessEngineFactory {
    /// Validates the setup by loading the default language once
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let factory = Self {
            tessdata_path: config.tessdata_path.clone(),
        };

        let tessdata = factory.tessdata_for(config.default_language)?;
        let test_tess = Tesseract::new(Some(&tessdata), Some(config.default_language.tag()))
            .map_err(|e| {
                OcrError::EngineUnavailable(format!("Failed to initialize Tesseract: {}", e))
            })?;
        drop(test_tess);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata,
            config.default_language
        );

        Ok(factory)
    }

    fn tessdata_for(&self, language: Language) -> Result<String, OcrError> {
        match &self.tessdata_path {
            Some(path) => Ok(path.clone()),
            None => ensure_tessdata_available(language),
        }
    }
}

impl EngineFactory for LeptessEngineFactory {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Statically linked Tesseract, tessdata downloaded on first use"
    }

    fn acquire(&self, language: Language) -> Result<Box<dyn RecognitionEngine>, OcrError> {
        let tessdata = self.tessdata_for(language)?;
        let tess = Tesseract::new(Some(&tessdata), Some(language.tag())).map_err(|e| {
            OcrError::EngineUnavailable(format!("Failed to create Tesseract: {}", e))
        })?;

        Ok(Box::new(LeptessEngine { tess: Some(tess) }))
    }
}

pub struct LeptessEngine {
    tess: Option<Tesseract>,
}

impl RecognitionEngine for LeptessEngine {
    fn recognize(&mut self, image: &ProcessedImage) -> Result<OcrResult, OcrError> {
        let tess = self
            .tess
            .take()
            .ok_or_else(|| OcrError::Recognition("Engine already terminated".to_string()))?;

        // BMP is always supported by the bundled leptonica
        let bmp_data = image.to_bmp()?;

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            image.width(),
            image.height(),
            bmp_data.len()
        );

        let tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            OcrError::Recognition(format!(
                "Failed to set image ({}x{}, {} bytes): {}",
                image.width(),
                image.height(),
                bmp_data.len(),
                e
            ))
        })?;

        let mut tess = tess
            .recognize()
            .map_err(|e| OcrError::Recognition(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::Recognition(format!("Failed to get text: {}", e)))?;

        // 0-100 scale
        let confidence = tess.mean_text_conf() as f32 / 100.0;

        self.tess = Some(tess);

        Ok(OcrResult {
            text: text.trim().to_string(),
            confidence: Some(confidence),
        })
    }

    fn terminate(&mut self) {
        self.tess = None;
    }
}

// ============================================================================
// Tessdata download helpers
// ============================================================================

fn tessdata_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("snaptext-ocr")
        .join("tessdata")
}

/// Ensure tessdata for `language` is cached, downloading if needed
fn ensure_tessdata_available(language: Language) -> Result<String, OcrError> {
    let cache_dir = tessdata_cache_dir();

    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to create tessdata directory: {}", e))
    })?;

    let traineddata_path = cache_dir.join(format!("{}.traineddata", language.tag()));

    if !traineddata_path.exists() {
        tracing::info!(
            "Downloading tessdata for '{}' (this may take a moment)...",
            language
        );
        download_file(&tessdata_url(language), &traineddata_path)?;
        tracing::info!("Downloaded tessdata to {:?}", traineddata_path);
    }

    // Tesseract expects the directory, not the file
    cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| OcrError::EngineUnavailable("Invalid tessdata path".to_string()))
}

/// tessdata_fast keeps downloads small
fn tessdata_url(language: Language) -> String {
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language.tag()
    )
}

fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url).call().map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to download tessdata: {}", e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to read tessdata response: {}", e))
    })?;

    // Write to a sibling file first so a partial download never looks cached
    let partial = path.with_extension("partial");
    let mut file = File::create(&partial).map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to create tessdata file: {}", e))
    })?;
    file.write_all(&buffer).map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to write tessdata file: {}", e))
    })?;
    std::fs::rename(&partial, path).map_err(|e| {
        OcrError::EngineUnavailable(format!("Failed to move tessdata into place: {}", e))
    })?;

    Ok(())
}
