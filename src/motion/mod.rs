//! Motion detection
//!
//! This module provides:
//! - Frame preprocessing (resize, grayscale, blur)
//! - A running-average background model that reports the bounding box of
//!   pixels that differ from it
//! - The debug overlay (timestamp, motion box)

pub mod detector;
pub mod overlay;
pub mod preprocess;

pub use detector::{BackgroundModel, MotionConfig, MotionRegion};
pub use overlay::DebugOverlay;
pub use preprocess::{blurred_gray, resize_to_width, MAX_WORKING_WIDTH};
