use image::Rgba;

/// Fixed-point scale of the luminance weights (0.299, 0.587, 0.114)
pub const SCALE: u32 = 1000;

const WEIGHT_R: u32 = 299;
const WEIGHT_G: u32 = 587;
const WEIGHT_B: u32 = 114;

/// Rec. 601 luminance in thousandths, exact for every 8-bit input.
/// Ranges over `0..=255 * SCALE`.
pub fn luminance_milli(pixel: &Rgba<u8>) -> u32 {
    let [r, g, b, _] = pixel.0;
    WEIGHT_R * r as u32 + WEIGHT_G * g as u32 + WEIGHT_B * b as u32
}

/// Rec. 601 luminance on the 0.0..=255.0 scale
pub fn luminance(pixel: &Rgba<u8>) -> f64 {
    luminance_milli(pixel) as f64 / SCALE as f64
}

/// Write `value` to the color channels, keeping alpha
pub fn gray_pixel(value: u8, source: &Rgba<u8>) -> Rgba<u8> {
    Rgba([value, value, value, source.0[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_of_gray_is_identity() {
        for v in [0u8, 1, 100, 128, 200, 255] {
            assert_eq!(luminance_milli(&Rgba([v, v, v, 255])), v as u32 * SCALE);
        }
    }

    #[test]
    fn test_luminance_weights_green_highest() {
        let red = luminance(&Rgba([255, 0, 0, 255]));
        let green = luminance(&Rgba([0, 255, 0, 255]));
        let blue = luminance(&Rgba([0, 0, 255, 255]));

        assert!(green > red && red > blue);
        assert!((red - 76.245).abs() < 1e-9);
    }

    #[test]
    fn test_gray_pixel_keeps_alpha() {
        assert_eq!(gray_pixel(7, &Rgba([1, 2, 3, 42])), Rgba([7, 7, 7, 42]));
    }
}
