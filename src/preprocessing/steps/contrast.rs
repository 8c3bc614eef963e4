use super::luminance::{gray_pixel, luminance};
use crate::error::OcrError;
use image::{Rgba, RgbaImage};
use imageproc::map::map_colors;

/// Contrast factor (1.0 = no change)
pub const CONTRAST: f64 = 1.5;
/// Luminance value left unchanged by the stretch
pub const MIDPOINT: f64 = 128.0;

/// Grayscale conversion followed by a fixed linear contrast stretch around
/// the midpoint: `gray * 1.5 - 64`.
///
/// Results are rounded half to even and clamped to 0..=255, the way a clamped
/// byte array stores them, so bright inputs saturate at white instead of
/// wrapping.
pub fn apply(image: RgbaImage) -> Result<RgbaImage, OcrError> {
    Ok(map_colors(&image, |pixel: Rgba<u8>| {
        gray_pixel(stretch(luminance(&pixel)), &pixel)
    }))
}

/// Map a 0.0..=255.0 luminance to an output channel value
pub fn stretch(gray: f64) -> u8 {
    let value = gray * CONTRAST + MIDPOINT * (1.0 - CONTRAST);
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_known_values() {
        assert_eq!(stretch(100.0), 86);
        assert_eq!(stretch(128.0), 128);
        assert_eq!(stretch(0.0), 0);
    }

    #[test]
    fn test_contrast_halves_round_to_even() {
        // Odd gray levels land exactly on .5
        let cases = [(43, 0), (45, 4), (47, 6), (51, 12), (127, 126), (129, 130)];
        for (gray, expected) in cases {
            let img = RgbaImage::from_pixel(1, 1, Rgba([gray, gray, gray, 255]));
            let result = apply(img).unwrap();
            assert_eq!(result.get_pixel(0, 0).0[0], expected, "gray {}", gray);
        }
    }

    #[test]
    fn test_contrast_clamps_bright_pixels() {
        // 255 * 1.5 - 64 = 318.5
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let result = apply(img).unwrap();
        assert_eq!(result.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_contrast_gray_pixel_scenario() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 77]));
        let result = apply(img).unwrap();
        assert_eq!(result.get_pixel(0, 0), &Rgba([86, 86, 86, 77]));
    }

    #[test]
    fn test_contrast_output_is_colorless() {
        let img = RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([(x * 16) as u8, (y * 16) as u8, 255 - (x * 8) as u8, 255])
        });

        for pixel in apply(img).unwrap().pixels() {
            let [r, g, b, _] = pixel.0;
            assert_eq!(r, g);
            assert_eq!(g, b);
        }
    }

    #[test]
    fn test_contrast_is_monotonic_in_luminance() {
        let mut pixels: Vec<Rgba<u8>> = (0..=255u8)
            .flat_map(|r| [Rgba([r, 0, 0, 255]), Rgba([r, r / 2, 255 - r, 255])])
            .collect();
        pixels.sort_by_key(super::super::luminance::luminance_milli);

        let outputs: Vec<u8> = pixels.iter().map(|p| stretch(luminance(p))).collect();
        assert!(outputs.windows(2).all(|w| w[0] <= w[1]));
    }
}
