//! MJPEG stream output
//!
//! Turns the frame cell into the body of a `/video_feed` response.

pub mod emitter;
pub mod encoder;
pub mod multipart;

pub use emitter::{StreamEmitter, DEFAULT_IDLE_BACKOFF};
pub use encoder::{FrameEncoder, JpegEncoder, DEFAULT_JPEG_QUALITY};
