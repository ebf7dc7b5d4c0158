//! Generated test pattern
//!
//! A static gradient background with a bright square bouncing across it, so
//! the motion detector has something to find without a camera attached.

use image::{Rgb, RgbImage};

use super::{CaptureError, FrameSource};

/// Synthetic camera
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    object_size: u32,
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
}

impl SyntheticSource {
    /// Create a source producing `width` x `height` frames
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let object_size = (width.min(height) / 8).max(1);

        Self {
            width,
            height,
            object_size,
            x: 0,
            y: 0,
            dx: (width as i64 / 64).max(1),
            dy: (height as i64 / 64).max(1),
        }
    }

    /// Frame size
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Top-left corner of the moving object in the next frame
    pub fn object_position(&self) -> (u32, u32) {
        (self.x as u32, self.y as u32)
    }

    fn step(&mut self) {
        let max_x = (self.width - self.object_size) as i64;
        let max_y = (self.height - self.object_size) as i64;

        self.x += self.dx;
        if self.x < 0 || self.x > max_x {
            self.dx = -self.dx;
            self.x = self.x.clamp(0, max_x);
        }

        self.y += self.dy;
        if self.y < 0 || self.y > max_y {
            self.dy = -self.dy;
            self.y = self.y.clamp(0, max_y);
        }
    }
}

impl FrameSource for SyntheticSource {
    fn read(&mut self) -> Result<RgbImage, CaptureError> {
        let (ox, oy) = self.object_position();
        let size = self.object_size;
        let (w, h) = (self.width, self.height);

        let frame = RgbImage::from_fn(w, h, |px, py| {
            if px >= ox && px < ox + size && py >= oy && py < oy + size {
                Rgb([240, 240, 240])
            } else {
                let r = (px * 64 / w) as u8 + 32;
                let b = (py * 64 / h) as u8 + 32;
                Rgb([r, 48, b])
            }
        });

        self.step();
        Ok(frame)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
