//! Crate error types

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame source failure
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// Frame encoding failure
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// Page data file failure
    #[error("page data error: {0}")]
    Page(#[from] PageError),

    /// The overlay font could not be loaded
    #[error("cannot load font {path}: {message}")]
    Font { path: PathBuf, message: String },
}

/// Errors raised by a [`FrameSource`](crate::capture::FrameSource)
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device or file could not be read
    #[error("device read failed: {0}")]
    Read(#[from] std::io::Error),

    /// The captured bytes could not be decoded into an image
    #[error("frame decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// The source has nothing to offer (e.g. empty replay directory)
    #[error("no frames available from {0}")]
    Exhausted(String),
}

/// Errors raised while turning a frame into wire bytes
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The frame has no pixels
    #[error("frame is empty")]
    Empty,

    /// The image codec rejected the frame
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    /// The encoding task was cancelled or panicked
    #[error("encoder task failed: {0}")]
    Task(String),
}

/// Errors raised while loading the page data file
#[derive(Debug, Error)]
pub enum PageError {
    /// The data file is missing or unreadable
    #[error("cannot read data file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data file is not valid JSON (comments allowed)
    #[error("malformed data file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
