use super::luminance::{gray_pixel, luminance_milli, SCALE};
use crate::error::OcrError;
use image::{Rgba, RgbaImage};
use imageproc::map::map_colors;

/// Fixed binarization cutoff on the 0-255 luminance scale
pub const THRESHOLD: u32 = 128;

/// Hard global threshold: luminance strictly above 128 becomes white,
/// everything else black. Alpha is untouched.
pub fn apply(image: RgbaImage) -> Result<RgbaImage, OcrError> {
    Ok(map_colors(&image, |pixel: Rgba<u8>| binarize_pixel(&pixel)))
}

fn binarize_pixel(pixel: &Rgba<u8>) -> Rgba<u8> {
    let value = if luminance_milli(pixel) > THRESHOLD * SCALE {
        255
    } else {
        0
    };
    gray_pixel(value, pixel)
}
