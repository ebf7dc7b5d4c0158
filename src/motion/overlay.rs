//! Debug overlay: capture timestamp and motion bounding box

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use chrono::{DateTime, Local};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use super::detector::MotionRegion;
use crate::error::{Error, Result};

/// Overlay color (red)
pub const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Timestamp format, e.g. `Friday 16 October 2026 09:41:07AM`
pub const TIMESTAMP_FORMAT: &str = "%A %d %B %Y %I:%M:%S%p";

/// DejaVu Sans Mono, used unless another font is loaded
static BUILTIN_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

/// Draws debug annotations onto outgoing frames
#[derive(Clone)]
pub struct DebugOverlay {
    font: Option<FontArc>,
    scale: PxScale,
    box_thickness: u32,
}

impl DebugOverlay {
    /// Overlay using the bundled font
    pub fn new() -> Self {
        let font = match FontArc::try_from_slice(BUILTIN_FONT) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::error!(error = %e, "Bundled overlay font is unreadable");
                None
            }
        };

        Self {
            font,
            ..Self::without_font()
        }
    }

    /// Overlay that draws the motion box only
    pub fn without_font() -> Self {
        Self {
            font: None,
            scale: PxScale::from(14.0),
            box_thickness: 2,
        }
    }

    /// Use a TrueType/OpenType font file for the timestamp instead
    pub fn with_font_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| Error::Font {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Self {
            font: Some(font),
            ..Self::without_font()
        })
    }

    /// Whether the timestamp will be drawn
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Annotate `image` in place
    pub fn draw(&self, image: &mut RgbImage, motion: Option<&MotionRegion>, now: DateTime<Local>) {
        if let Some(font) = &self.font {
            let text = now.format(TIMESTAMP_FORMAT).to_string();
            let y = image.height() as i32 - 10 - self.scale.y as i32;
            draw_text_mut(image, OVERLAY_COLOR, 10, y.max(0), self.scale, font, &text);
        }

        if let Some(region) = motion {
            self.draw_region(image, region);
        }
    }

    fn draw_region(&self, image: &mut RgbImage, region: &MotionRegion) {
        for inset in 0..self.box_thickness {
            let width = region.width().saturating_sub(2 * inset);
            let height = region.height().saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }

            let rect = Rect::at((region.min_x + inset) as i32, (region.min_y + inset) as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(image, rect, OVERLAY_COLOR);
        }
    }
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DebugOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugOverlay")
            .field("has_font", &self.has_font())
            .field("box_thickness", &self.box_thickness)
            .finish()
    }
}
