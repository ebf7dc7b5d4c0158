//! Frame sources
//!
//! The producer owns exactly one [`FrameSource`] and calls [`FrameSource::read`]
//! once per iteration. Device drivers live behind this trait; the crate ships
//! with:
//! - [`SyntheticSource`]: generated test pattern with a moving object
//! - [`ReplaySource`]: loops over the images in a directory
//! - [`FnSource`]: wraps a closure (handy for tests and custom devices)

pub mod replay;
pub mod synthetic;

use image::RgbImage;

pub use crate::error::CaptureError;
pub use replay::ReplaySource;
pub use synthetic::SyntheticSource;

/// Something that produces raw color frames
pub trait FrameSource: Send + 'static {
    /// Block until the next frame is available
    fn read(&mut self) -> Result<RgbImage, CaptureError>;

    /// Human-readable name for logs
    fn name(&self) -> &str {
        "source"
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> Result<RgbImage, CaptureError> {
        (**self).read()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Closure-backed frame source
pub struct FnSource<F> {
    read: F,
}

/// Create a source that calls `read` for every frame
pub fn from_fn<F>(read: F) -> FnSource<F>
where
    F: FnMut() -> Result<RgbImage, CaptureError> + Send + 'static,
{
    FnSource { read }
}

impl<F> FrameSource for FnSource<F>
where
    F: FnMut() -> Result<RgbImage, CaptureError> + Send + 'static,
{
    fn read(&mut self) -> Result<RgbImage, CaptureError> {
        (self.read)()
    }

    fn name(&self) -> &str {
        "fn"
    }
}
