//! Running-average background model
//!
//! The model keeps a per-pixel weighted average of past gray frames. A frame
//! is compared against it by absolute difference, thresholded, cleaned up with
//! an erode/dilate pass, and the bounding box of the remaining pixels is
//! reported as the motion region.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};
use serde::Serialize;

/// Background model tuning
#[derive(Debug, Clone, PartialEq)]
pub struct MotionConfig {
    /// Weight of the newest frame in the running average (0..=1)
    pub accum_weight: f32,

    /// Minimum absolute difference for a pixel to count as changed
    pub threshold: u8,

    /// Radius of the erode/dilate cleanup (0 disables it)
    pub cleanup_radius: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            accum_weight: 0.1,
            threshold: 25,
            cleanup_radius: 2,
        }
    }
}

impl MotionConfig {
    /// Set the running-average weight (clamped to 0..=1)
    pub fn accum_weight(mut self, weight: f32) -> Self {
        self.accum_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Set the difference threshold
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the cleanup radius
    pub fn cleanup_radius(mut self, radius: u8) -> Self {
        self.cleanup_radius = radius;
        self
    }
}

/// Bounding box of detected motion (inclusive pixel coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotionRegion {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    /// Number of changed pixels after cleanup
    pub changed_pixels: u32,
}

impl MotionRegion {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Per-pixel running average of past frames
///
/// Owned by the producer thread for the lifetime of the process.
#[derive(Debug)]
pub struct BackgroundModel {
    config: MotionConfig,
    width: u32,
    height: u32,
    average: Option<Vec<f32>>,
    frames: u64,
}

impl BackgroundModel {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            width: 0,
            height: 0,
            average: None,
            frames: 0,
        }
    }

    /// Number of frames folded into the average
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Fold `gray` into the running average
    ///
    /// The first frame (or a frame of a different size) seeds the model.
    pub fn update(&mut self, gray: &GrayImage) {
        let (width, height) = gray.dimensions();
        let weight = self.config.accum_weight;

        match self.average.as_mut() {
            Some(average) if self.width == width && self.height == height => {
                for (avg, px) in average.iter_mut().zip(gray.as_raw()) {
                    *avg = (1.0 - weight) * *avg + weight * f32::from(*px);
                }
            }
            _ => {
                if self.average.is_some() {
                    tracing::debug!(width, height, "Frame size changed, reseeding background");
                }
                self.width = width;
                self.height = height;
                self.average = Some(gray.as_raw().iter().map(|&px| f32::from(px)).collect());
            }
        }

        self.frames += 1;
    }

    /// Compare `gray` against the model
    ///
    /// Returns `None` before the first `update`, on a size mismatch, or when
    /// no pixel survives thresholding.
    pub fn detect(&self, gray: &GrayImage) -> Option<MotionRegion> {
        let average = self.average.as_ref()?;
        if gray.dimensions() != (self.width, self.height) {
            return None;
        }

        let mask = self.threshold_mask(average, gray);
        let mask = if self.config.cleanup_radius > 0 {
            let eroded = erode(&mask, Norm::LInf, self.config.cleanup_radius);
            dilate(&eroded, Norm::LInf, self.config.cleanup_radius)
        } else {
            mask
        };

        bounding_box(&mask)
    }

    fn threshold_mask(&self, average: &[f32], gray: &GrayImage) -> GrayImage {
        let threshold = self.config.threshold;
        let mut mask = GrayImage::new(self.width, self.height);

        for ((out, avg), px) in mask.pixels_mut().zip(average).zip(gray.as_raw()) {
            let background = avg.round().clamp(0.0, 255.0) as u8;
            let delta = background.abs_diff(*px);
            *out = Luma([if delta > threshold { 255 } else { 0 }]);
        }

        mask
    }
}

/// Bounding box of all non-zero mask pixels
fn bounding_box(mask: &GrayImage) -> Option<MotionRegion> {
    let mut region: Option<MotionRegion> = None;

    for (x, y, px) in mask.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }

        let r = region.get_or_insert(MotionRegion {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            changed_pixels: 0,
        });
        r.min_x = r.min_x.min(x);
        r.min_y = r.min_y.min(y);
        r.max_x = r.max_x.max(x);
        r.max_y = r.max_y.max(y);
        r.changed_pixels += 1;
    }

    region
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(value: u8) -> GrayImage {
        GrayImage::from_pixel(64, 48, Luma([value]))
    }

    fn with_square(base: u8, value: u8, x0: u32, y0: u32, size: u32) -> GrayImage {
        let mut image = flat(base);
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                image.put_pixel(x, y, Luma([value]));
            }
        }
        image
    }

    #[test]
    fn test_detect_before_update_is_none() {
        let model = BackgroundModel::new(MotionConfig::default());
        assert!(model.detect(&flat(10)).is_none());
    }

    #[test]
    fn test_static_scene_has_no_motion() {
        let mut model = BackgroundModel::new(MotionConfig::default());
        for _ in 0..10 {
            model.update(&flat(80));
        }
        assert!(model.detect(&flat(80)).is_none());
        assert_eq!(model.frames(), 10);
    }

    #[test]
    fn test_bright_object_is_boxed() {
        let mut model = BackgroundModel::new(MotionConfig::default());
        for _ in 0..10 {
            model.update(&flat(40));
        }

        let region = model
            .detect(&with_square(40, 220, 20, 10, 12))
            .expect("motion expected");

        assert_eq!((region.min_x, region.min_y), (20, 10));
        assert_eq!((region.max_x, region.max_y), (31, 21));
        assert_eq!(region.width(), 12);
        assert_eq!(region.height(), 12);
        assert_eq!(region.changed_pixels, 144);
    }

    #[test]
    fn test_cleanup_removes_speckles() {
        let mut model = BackgroundModel::new(MotionConfig::default());
        model.update(&flat(40));

        let mut noisy = flat(40);
        noisy.put_pixel(5, 5, Luma([255]));
        noisy.put_pixel(40, 30, Luma([255]));

        assert!(model.detect(&noisy).is_none());
    }

    #[test]
    fn test_small_differences_below_threshold() {
        let mut model = BackgroundModel::new(MotionConfig::default().cleanup_radius(0));
        model.update(&flat(100));
        assert!(model.detect(&flat(120)).is_none());
        assert!(model.detect(&flat(130)).is_some());
    }

    #[test]
    fn test_running_average_converges() {
        let mut model = BackgroundModel::new(MotionConfig::default().cleanup_radius(0));
        model.update(&flat(0));
        for _ in 0..100 {
            model.update(&flat(200));
        }
        // Background has absorbed the new level
        assert!(model.detect(&flat(200)).is_none());
    }

    #[test]
    fn test_size_change_reseeds() {
        let mut model = BackgroundModel::new(MotionConfig::default());
        model.update(&flat(10));

        let bigger = GrayImage::from_pixel(128, 96, Luma([10]));
        assert!(model.detect(&bigger).is_none());

        model.update(&bigger);
        assert!(model.detect(&bigger).is_none());
        assert_eq!(model.frames(), 2);
    }

    #[test]
    fn test_config_builder() {
        let config = MotionConfig::default()
            .accum_weight(2.0)
            .threshold(10)
            .cleanup_radius(1);

        assert_eq!(config.accum_weight, 1.0);
        assert_eq!(config.threshold, 10);
        assert_eq!(config.cleanup_radius, 1);
    }
}
