//! Image-directory replay
//!
//! Loops over the still images in a directory in file-name order, decoding
//! one per read. Useful for demos and for replaying recorded footage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;

use super::{CaptureError, FrameSource};

const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Replays a directory of images forever
#[derive(Debug)]
pub struct ReplaySource {
    label: String,
    files: Vec<PathBuf>,
    next: usize,
    frame_interval: Option<Duration>,
}

impl ReplaySource {
    /// Scan `dir` for `.jpg`, `.jpeg` and `.png` files
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let dir = dir.as_ref();
        let mut files = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);

            if is_image && path.is_file() {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(CaptureError::Exhausted(dir.display().to_string()));
        }

        files.sort();
        tracing::info!(dir = %dir.display(), frames = files.len(), "Replay source opened");

        Ok(Self {
            label: format!("replay:{}", dir.display()),
            files,
            next: 0,
            frame_interval: None,
        })
    }

    /// Sleep this long before returning each frame (simulates a camera rate)
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    /// Number of images in the loop
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false; `open` rejects empty directories
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ReplaySource {
    fn read(&mut self) -> Result<RgbImage, CaptureError> {
        let path = &self.files[self.next];
        self.next = (self.next + 1) % self.files.len();

        if let Some(interval) = self.frame_interval {
            std::thread::sleep(interval);
        }

        Ok(image::open(path)?.to_rgb8())
    }

    fn name(&self) -> &str {
        &self.label
    }
}
