//! Frame encoders

use bytes::Bytes;

use crate::error::EncodeError;
use crate::pipeline::Frame;

/// Default JPEG quality for streamed frames
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Turns a published frame into the payload of one multipart part
///
/// Encoders run on the blocking pool and are shared by every stream.
pub trait FrameEncoder: Send + Sync + 'static {
    fn encode(&self, frame: &Frame) -> Result<Bytes, EncodeError>;

    /// MIME type of the encoded payload
    fn content_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Baseline JPEG encoder
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// Create an encoder; quality is clamped to 1..=100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&self, frame: &Frame) -> Result<Bytes, EncodeError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(EncodeError::Empty);
        }

        let mut jpeg = Vec::with_capacity(frame.image.as_raw().len() / 8);
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, self.quality);
        encoder.encode_image(&frame.image)?;

        Ok(Bytes::from(jpeg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_jpeg_has_soi_and_eoi_markers() {
        let frame = Frame::new(RgbImage::from_pixel(32, 24, Rgb([200, 10, 10])));
        let jpeg = JpegEncoder::default().encode(&frame).unwrap();

        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_jpeg_decodes_to_same_dimensions() {
        let frame = Frame::new(RgbImage::from_pixel(40, 30, Rgb([0, 128, 255])));
        let jpeg = JpegEncoder::new(90).encode(&frame).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let frame = Frame::new(RgbImage::new(0, 0));
        assert!(matches!(
            JpegEncoder::default().encode(&frame),
            Err(EncodeError::Empty)
        ));
    }

    #[test]
    fn test_quality_clamped() {
        assert_eq!(JpegEncoder::new(0).quality(), 1);
        assert_eq!(JpegEncoder::new(255).quality(), 100);
    }
}
