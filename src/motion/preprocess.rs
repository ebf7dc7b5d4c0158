//! Frame preprocessing shared by both producer modes

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use imageproc::filter::gaussian_blur_f32;

/// Sigma equivalent to a 7x7 Gaussian kernel with automatic sigma
pub const BLUR_SIGMA: f32 = 1.4;

/// Largest accepted working width
pub const MAX_WORKING_WIDTH: u32 = 8192;

/// Resize to `width`, keeping the aspect ratio (nearest-neighbour)
///
/// Returns the input unchanged when it already has the requested width.
pub fn resize_to_width(image: RgbImage, width: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if width == 0 || w == width || w == 0 {
        return image;
    }

    let height = scaled_height(w, h, width);
    imageops::resize(&image, width, height, FilterType::Nearest)
}

/// Height of a `w` x `h` frame scaled to `width`, rounded, saturating at `u32::MAX`
fn scaled_height(w: u32, h: u32, width: u32) -> u32 {
    let height = (u64::from(h) * u64::from(width) + u64::from(w) / 2) / u64::from(w.max(1));
    u32::try_from(height.max(1)).unwrap_or(u32::MAX)
}

/// Single-channel, blurred copy used for background modelling
pub fn blurred_gray(image: &RgbImage) -> GrayImage {
    let gray = imageops::grayscale(image);
    gaussian_blur_f32(&gray, BLUR_SIGMA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_resize_keeps_aspect_ratio() {
        let image = RgbImage::new(1600, 900);
        let resized = resize_to_width(image, 800);
        assert_eq!(resized.dimensions(), (800, 450));
    }

    #[test]
    fn test_resize_upscales() {
        let image = RgbImage::new(400, 300);
        let resized = resize_to_width(image, 800);
        assert_eq!(resized.dimensions(), (800, 600));
    }

    #[test]
    fn test_resize_same_width_is_noop() {
        let image = RgbImage::from_pixel(800, 10, Rgb([1, 2, 3]));
        let resized = resize_to_width(image, 800);
        assert_eq!(resized.dimensions(), (800, 10));
        assert_eq!(resized.get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_scaled_height_saturates() {
        assert_eq!(scaled_height(1600, 900, 800), 450);
        assert_eq!(scaled_height(1000, 1, 10), 1);
        assert_eq!(scaled_height(1, u32::MAX, 4), u32::MAX);
    }

    #[test]
    fn test_blurred_gray_of_flat_image_is_flat() {
        let image = RgbImage::from_pixel(32, 32, Rgb([100, 100, 100]));
        let gray = blurred_gray(&image);
        assert_eq!(gray.dimensions(), (32, 32));
        let Luma([value]) = *gray.get_pixel(16, 16);
        assert!((99..=101).contains(&value), "value = {value}");
    }
}
