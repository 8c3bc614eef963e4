use crate::error::OcrError;
use crate::image_loader::SourceImage;
use image::{ImageFormat, RgbaImage};
use serde::Serialize;
use std::io::Cursor;
use std::time::Instant;

use super::steps;

/// The single per-pixel transform applied to an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Grayscale plus a fixed 1.5x contrast stretch
    #[default]
    Contrast,
    /// Grayscale plus a hard threshold at 128
    Binarize,
}

impl Filter {
    pub fn from_binarize(binarize: bool) -> Self {
        if binarize {
            Self::Binarize
        } else {
            Self::Contrast
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contrast => "contrast",
            Self::Binarize => "binarize",
        }
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Filtered copy of a [`SourceImage`], owned by the request that produced it
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pixels: RgbaImage,
    png: Vec<u8>,
    filter: Filter,
    total_time_ms: u64,
    steps: Vec<StepTiming>,
}

impl ProcessedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// PNG re-encoding handed to the recognition engine
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn total_time_ms(&self) -> u64 {
        self.total_time_ms
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    /// BMP re-encoding for engines whose image readers lack PNG support
    #[cfg_attr(not(feature = "engine-leptess"), allow(dead_code))]
    pub fn to_bmp(&self) -> Result<Vec<u8>, OcrError> {
        // BMP writer wants RGB8
        let rgb = image::DynamicImage::ImageRgba8(self.pixels.clone()).into_rgb8();
        let mut out = Cursor::new(Vec::new());
        rgb.write_to(&mut out, ImageFormat::Bmp)
            .map_err(|e| OcrError::RasterEncode(format!("Failed to convert to BMP: {}", e)))?;
        Ok(out.into_inner())
    }
}

/// Preprocessing pipeline: rasterize, filter, re-encode
pub struct Pipeline {
    filter: Filter,
}

impl Pipeline {
    pub fn new(filter: Filter) -> Self {
        Self { filter }
    }

    /// Process an image according to the configured filter.
    ///
    /// Pure and deterministic: the source is never modified.
    pub fn process(&self, source: &SourceImage) -> Result<ProcessedImage, OcrError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let img = self.run_step("rasterize", source, &mut steps_timing, rasterize)?;

        let img = match self.filter {
            Filter::Contrast => {
                self.run_step("contrast", img, &mut steps_timing, steps::contrast::apply)?
            }
            Filter::Binarize => {
                self.run_step("threshold", img, &mut steps_timing, steps::threshold::apply)?
            }
        };

        let png = self.run_step("encode", &img, &mut steps_timing, encode_png)?;

        Ok(ProcessedImage {
            pixels: img,
            png,
            filter: self.filter,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    fn run_step<I, O, F>(
        &self,
        name: &str,
        input: I,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<O, OcrError>
    where
        F: FnOnce(I) -> Result<O, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(input)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}

/// Copy the decoded pixels into a fresh RGBA raster of the same shape
fn rasterize(source: &SourceImage) -> Result<RgbaImage, OcrError> {
    let (width, height) = (source.width(), source.height());
    let raw = source.pixels().as_raw().clone();
    let expected = width as usize * height as usize * 4;

    if raw.len() != expected {
        return Err(OcrError::ImageDecode(format!(
            "Pixel buffer has {} bytes, expected {} for {}x{} RGBA",
            raw.len(),
            expected,
            width,
            height
        )));
    }

    RgbaImage::from_raw(width, height, raw)
        .ok_or_else(|| OcrError::ImageDecode("Invalid RGBA pixel buffer".to_string()))
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, OcrError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| OcrError::RasterEncode(format!("Failed to encode PNG: {}", e)))?;
    Ok(out.into_inner())
}
