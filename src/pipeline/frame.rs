//! Frame type shared between the producer and the stream emitters

use std::time::Instant;

use image::RgbImage;

use crate::motion::MotionRegion;

/// A processed frame ready for encoding
///
/// Published into the [`FrameCell`](super::FrameCell) behind an `Arc`, so
/// readers share one immutable allocation.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Color image (possibly annotated)
    pub image: RgbImage,
    /// When the frame was captured
    pub captured_at: Instant,
    /// Motion region found in this frame, if detection ran
    pub motion: Option<MotionRegion>,
}

impl Frame {
    /// Create a frame captured now
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Instant::now(),
            motion: None,
        }
    }

    /// Attach a detected motion region
    pub fn with_motion(mut self, motion: Option<MotionRegion>) -> Self {
        self.motion = motion;
        self
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
