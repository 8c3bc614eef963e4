//! Decoding of uploaded files into RGBA pixel buffers

use crate::error::OcrError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};

/// An uploaded image, decoded once and never mutated afterwards
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Original upload as a `data:` URI, suitable for an `<img src>` preview
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}

/// Recover the upload bytes from a `data:<mime>;base64,...` URI, as produced
/// by [`SourceImage::data_uri`]
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, OcrError> {
    let payload = uri
        .trim()
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| OcrError::UnreadableFile("Expected a base64 data URI".to_string()))?;

    STANDARD
        .decode(payload)
        .map_err(|e| OcrError::UnreadableFile(format!("Invalid base64 image data: {}", e)))
}

/// Decode raw upload bytes.
///
/// Only the decoder decides what is acceptable; there is no extra type or
/// size validation here.
pub fn load(bytes: Vec<u8>) -> Result<SourceImage, OcrError> {
    let format = image::guess_format(&bytes)
        .map_err(|e| OcrError::UnreadableFile(format!("Unrecognized image format: {}", e)))?;

    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| OcrError::UnreadableFile(format!("Failed to decode image: {}", e)))?;

    let pixels = decoded.into_rgba8();

    tracing::debug!(
        "Loaded {:?} image: {}x{}, {} bytes",
        format,
        pixels.width(),
        pixels.height(),
        bytes.len()
    );

    Ok(SourceImage {
        bytes,
        format,
        pixels,
    })
}

/// Decode on the blocking pool; awaiting the returned future is the only
/// suspension point of the load step.
pub async fn load_async(bytes: Vec<u8>) -> Result<SourceImage, OcrError> {
    tokio::task::spawn_blocking(move || load(bytes))
        .await
        .map_err(|e| OcrError::ImageDecode(format!("Decode task failed: {}", e)))?
}

#[cfg(test)]
pub(crate) fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}
