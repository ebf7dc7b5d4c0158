//! Producer configuration

use std::time::Duration;

use crate::motion::{DebugOverlay, MotionConfig, MAX_WORKING_WIDTH};

/// Default working width frames are resized to
pub const DEFAULT_WORKING_WIDTH: u32 = 800;

/// Default number of frames used to build the background model
pub const DEFAULT_WARMUP_FRAMES: u64 = 32;

/// What the producer does with each captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerMode {
    /// Blur, background-model and optionally annotate every frame
    Detection,
    /// Resize and publish, capped at `direct_interval`
    Direct,
}

impl std::fmt::Display for ProducerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProducerMode::Detection => write!(f, "detection"),
            ProducerMode::Direct => write!(f, "direct"),
        }
    }
}

/// Producer configuration options
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Processing mode (fixed for the lifetime of the worker)
    pub mode: ProducerMode,

    /// Width frames are resized to before processing
    pub working_width: u32,

    /// Detection is skipped until more than this many frames were processed
    pub warmup_frames: u64,

    /// Draw the debug overlay onto published frames
    pub debug: bool,

    /// Overlay used when `debug` is set
    pub overlay: DebugOverlay,

    /// Background model tuning
    pub motion: MotionConfig,

    /// Pause after each publish in direct mode
    pub direct_interval: Duration,

    /// First retry delay after a capture failure
    pub retry_initial: Duration,

    /// Upper bound of the retry delay
    pub retry_max: Duration,

    /// Consecutive capture failures tolerated before the worker stops (0 = unlimited)
    pub max_capture_failures: u32,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            mode: ProducerMode::Detection,
            working_width: DEFAULT_WORKING_WIDTH,
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            debug: false,
            overlay: DebugOverlay::new(),
            motion: MotionConfig::default(),
            direct_interval: Duration::from_secs(1) / 30,
            retry_initial: Duration::from_millis(100),
            retry_max: Duration::from_secs(5),
            max_capture_failures: 0, // Unlimited
        }
    }
}

impl ProducerConfig {
    /// Detection mode with defaults
    pub fn detection() -> Self {
        Self::default()
    }

    /// Direct-stream mode with defaults
    pub fn direct() -> Self {
        Self {
            mode: ProducerMode::Direct,
            ..Default::default()
        }
    }

    /// Set the processing mode
    pub fn mode(mut self, mode: ProducerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the working width (1 to `MAX_WORKING_WIDTH` pixels)
    pub fn working_width(mut self, width: u32) -> Self {
        self.working_width = width.clamp(1, MAX_WORKING_WIDTH);
        self
    }

    /// Set the warm-up frame count
    pub fn warmup_frames(mut self, frames: u64) -> Self {
        self.warmup_frames = frames;
        self
    }

    /// Enable or disable the debug overlay
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the overlay used in debug mode
    pub fn overlay(mut self, overlay: DebugOverlay) -> Self {
        self.overlay = overlay;
        self
    }

    /// Set background model tuning
    pub fn motion(mut self, motion: MotionConfig) -> Self {
        self.motion = motion;
        self
    }

    /// Set the direct-mode pacing interval
    pub fn direct_interval(mut self, interval: Duration) -> Self {
        self.direct_interval = interval;
        self
    }

    /// Set the capture retry backoff bounds
    pub fn retry_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.retry_initial = initial;
        self.retry_max = max.max(initial);
        self
    }

    /// Stop the worker after this many consecutive capture failures
    pub fn max_capture_failures(mut self, max: u32) -> Self {
        self.max_capture_failures = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProducerConfig::default();

        assert_eq!(config.mode, ProducerMode::Detection);
        assert_eq!(config.working_width, 800);
        assert_eq!(config.warmup_frames, 32);
        assert!(!config.debug);
        assert_eq!(config.direct_interval, Duration::from_nanos(33_333_333));
        assert_eq!(config.max_capture_failures, 0);
    }

    #[test]
    fn test_direct_preset() {
        let config = ProducerConfig::direct();
        assert_eq!(config.mode, ProducerMode::Direct);
        assert_eq!(config.working_width, DEFAULT_WORKING_WIDTH);
    }

    #[test]
    fn test_builder_working_width_bounds() {
        assert_eq!(ProducerConfig::default().working_width(0).working_width, 1);
        assert_eq!(
            ProducerConfig::default().working_width(u32::MAX).working_width,
            MAX_WORKING_WIDTH
        );
    }

    #[test]
    fn test_builder_retry_backoff_orders_bounds() {
        let config = ProducerConfig::default()
            .retry_backoff(Duration::from_secs(2), Duration::from_millis(500));

        assert_eq!(config.retry_initial, Duration::from_secs(2));
        assert_eq!(config.retry_max, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_chaining() {
        let config = ProducerConfig::default()
            .mode(ProducerMode::Direct)
            .working_width(320)
            .warmup_frames(5)
            .debug(true)
            .motion(MotionConfig::default().threshold(40))
            .direct_interval(Duration::from_millis(10))
            .max_capture_failures(3);

        assert_eq!(config.mode, ProducerMode::Direct);
        assert_eq!(config.working_width, 320);
        assert_eq!(config.warmup_frames, 5);
        assert!(config.debug);
        assert_eq!(config.motion.threshold, 40);
        assert_eq!(config.direct_interval, Duration::from_millis(10));
        assert_eq!(config.max_capture_failures, 3);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(ProducerMode::Detection.to_string(), "detection");
        assert_eq!(ProducerMode::Direct.to_string(), "direct");
    }
}
