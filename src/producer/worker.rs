//! Producer thread
//!
//! One dedicated OS thread per process. Each iteration takes the activity
//! gate, captures and processes one frame, publishes it, and releases the
//! gate so the next iteration can start while viewers remain.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Local;

use crate::capture::{CaptureError, FrameSource};
use crate::error::Result;
use crate::motion::{blurred_gray, resize_to_width, BackgroundModel};
use crate::pipeline::{Frame, Pipeline};

use super::config::{ProducerConfig, ProducerMode};

/// Handle to the running producer thread
///
/// Dropping the handle shuts the worker down.
pub struct ProducerHandle {
    pipeline: Arc<Pipeline>,
    thread: Option<JoinHandle<()>>,
}

impl ProducerHandle {
    /// Whether the worker has exited (fault limit reached or shut down)
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Stop the worker and wait for it to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.pipeline.gate().shutdown();

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Producer thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for ProducerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Drop for ProducerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the producer thread
pub fn spawn<S: FrameSource>(
    pipeline: Arc<Pipeline>,
    source: S,
    config: ProducerConfig,
) -> Result<ProducerHandle> {
    let worker = Producer::new(Arc::clone(&pipeline), source, config);

    let thread = std::thread::Builder::new()
        .name("frame-producer".into())
        .spawn(move || worker.run())?;

    Ok(ProducerHandle {
        pipeline,
        thread: Some(thread),
    })
}

struct Producer<S> {
    pipeline: Arc<Pipeline>,
    source: S,
    config: ProducerConfig,
    model: BackgroundModel,
    /// Frames processed in detection mode
    total: u64,
    consecutive_failures: u32,
    backoff: Duration,
}

impl<S: FrameSource> Producer<S> {
    fn new(pipeline: Arc<Pipeline>, source: S, config: ProducerConfig) -> Self {
        let model = BackgroundModel::new(config.motion.clone());
        let backoff = config.retry_initial;

        Self {
            pipeline,
            source,
            config,
            model,
            total: 0,
            consecutive_failures: 0,
            backoff,
        }
    }

    fn run(mut self) {
        let pipeline = Arc::clone(&self.pipeline);
        let stats = pipeline.stats();
        stats.set_producer_running(true);

        tracing::info!(
            mode = %self.config.mode,
            source = self.source.name(),
            width = self.config.working_width,
            warmup_frames = self.config.warmup_frames,
            debug = self.config.debug,
            "Producer started"
        );

        while pipeline.gate().wait_and_close() {
            stats.record_iteration();

            let outcome = match self.config.mode {
                ProducerMode::Detection => self.detect_iteration(),
                ProducerMode::Direct => self.direct_iteration(),
            };

            pipeline.gate().release();

            match outcome {
                Ok(()) => {
                    if self.consecutive_failures > 0 {
                        tracing::info!(
                            failures = self.consecutive_failures,
                            "Capture recovered"
                        );
                    }
                    self.consecutive_failures = 0;
                    self.backoff = self.config.retry_initial;
                }
                Err(e) => {
                    if !self.on_capture_failure(e) {
                        break;
                    }
                }
            }
        }

        stats.set_producer_running(false);
        tracing::info!(iterations = stats.snapshot().iterations, "Producer stopped");
    }

    /// Returns `false` when the worker should stop
    fn on_capture_failure(&mut self, error: CaptureError) -> bool {
        self.pipeline.stats().record_capture_failure();
        self.consecutive_failures += 1;

        let limit = self.config.max_capture_failures;
        if limit > 0 && self.consecutive_failures >= limit {
            tracing::error!(
                error = %error,
                failures = self.consecutive_failures,
                "Capture failed too many times, producer giving up"
            );
            return false;
        }

        tracing::warn!(
            error = %error,
            failures = self.consecutive_failures,
            retry_in_ms = u64::try_from(self.backoff.as_millis()).unwrap_or(u64::MAX),
            "Capture failed"
        );

        let keep_running = self.pipeline.gate().sleep(self.backoff);
        self.backoff = self.backoff.saturating_mul(2).min(self.config.retry_max);
        keep_running
    }

    fn detect_iteration(&mut self) -> std::result::Result<(), CaptureError> {
        let raw = self.source.read()?;
        let mut image = resize_to_width(raw, self.config.working_width);
        let gray = blurred_gray(&image);

        let motion = if self.total > self.config.warmup_frames {
            self.model.detect(&gray)
        } else {
            None
        };

        if let Some(region) = &motion {
            self.pipeline.stats().record_motion();
            tracing::trace!(?region, "Motion detected");
        }

        if self.config.debug {
            self.config.overlay.draw(&mut image, motion.as_ref(), Local::now());
        }

        self.model.update(&gray);
        self.total += 1;

        self.publish(Frame::new(image).with_motion(motion));
        Ok(())
    }

    fn direct_iteration(&mut self) -> std::result::Result<(), CaptureError> {
        let raw = self.source.read()?;
        let image = resize_to_width(raw, self.config.working_width);

        self.publish(Frame::new(image));
        self.pipeline.gate().sleep(self.config.direct_interval);
        Ok(())
    }

    fn publish(&self, frame: Frame) {
        let sequence = self.pipeline.cell().publish(frame);
        self.pipeline.stats().record_publish();
        tracing::trace!(sequence, "Frame published");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{from_fn, SyntheticSource};
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    fn counting_source(reads: Arc<AtomicUsize>) -> impl FrameSource {
        from_fn(move || {
            reads.fetch_add(1, Ordering::SeqCst);
            Ok(RgbImage::from_pixel(64, 48, Rgb([10, 20, 30])))
        })
    }

    fn fast_config() -> ProducerConfig {
        ProducerConfig::default()
            .working_width(64)
            .direct_interval(Duration::from_millis(2))
            .retry_backoff(Duration::from_millis(1), Duration::from_millis(4))
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        let pipeline = Arc::new(Pipeline::new());
        // Shut down first so the backoff sleeps return at once
        pipeline.gate().shutdown();

        let mut worker = Producer::new(
            Arc::clone(&pipeline),
            SyntheticSource::new(8, 8),
            fast_config(),
        );
        assert!(!worker.on_capture_failure(CaptureError::Exhausted("gone".into())));
        assert_eq!(worker.backoff, Duration::from_millis(2));

        let huge = Duration::from_secs(u64::MAX / 2 + 1);
        let mut worker = Producer::new(
            Arc::clone(&pipeline),
            SyntheticSource::new(8, 8),
            fast_config().retry_backoff(huge, Duration::MAX),
        );
        worker.on_capture_failure(CaptureError::Exhausted("gone".into()));
        assert_eq!(worker.backoff, Duration::MAX);
        worker.on_capture_failure(CaptureError::Exhausted("gone".into()));
        assert_eq!(worker.backoff, Duration::MAX);
        assert_eq!(pipeline.stats().snapshot().capture_failures, 3);
    }

    #[test]
    fn test_no_capture_without_viewers() {
        let pipeline = Arc::new(Pipeline::new());
        let reads = Arc::new(AtomicUsize::new(0));
        let handle = spawn(
            Arc::clone(&pipeline),
            counting_source(Arc::clone(&reads)),
            fast_config(),
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(100));

        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert!(pipeline.cell().is_empty());
        handle.shutdown();
    }

    #[test]
    fn test_viewer_starts_and_stops_capture() {
        let pipeline = Arc::new(Pipeline::new());
        let reads = Arc::new(AtomicUsize::new(0));
        let handle = spawn(
            Arc::clone(&pipeline),
            counting_source(Arc::clone(&reads)),
            fast_config().mode(ProducerMode::Direct),
        )
        .unwrap();

        pipeline.viewers().on_connect();
        assert!(wait_until(Duration::from_secs(2), || pipeline.cell().sequence() >= 3));

        pipeline.viewers().on_disconnect();
        // Let any in-flight iteration finish
        std::thread::sleep(Duration::from_millis(50));
        let settled = reads.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));

        assert_eq!(reads.load(Ordering::SeqCst), settled);
        assert!(!pipeline.gate().is_held());
        handle.shutdown();
    }

    #[test]
    fn test_detection_mode_finds_motion_after_warmup() {
        let pipeline = Arc::new(Pipeline::new());
        let handle = spawn(
            Arc::clone(&pipeline),
            SyntheticSource::new(160, 120),
            fast_config().working_width(160).warmup_frames(3),
        )
        .unwrap();

        pipeline.viewers().on_connect();
        assert!(wait_until(Duration::from_secs(5), || {
            pipeline.stats().snapshot().motion_frames > 0
        }));

        let snapshot = pipeline.cell().snapshot().unwrap();
        assert_eq!(snapshot.frame.width(), 160);
        handle.shutdown();
    }

    #[test]
    fn test_frames_resized_to_working_width() {
        let pipeline = Arc::new(Pipeline::new());
        let handle = spawn(
            Arc::clone(&pipeline),
            SyntheticSource::new(320, 240),
            fast_config().working_width(80),
        )
        .unwrap();

        pipeline.viewers().on_connect();
        assert!(wait_until(Duration::from_secs(2), || !pipeline.cell().is_empty()));

        let snapshot = pipeline.cell().snapshot().unwrap();
        assert_eq!((snapshot.frame.width(), snapshot.frame.height()), (80, 60));
        handle.shutdown();
    }

    #[test]
    fn test_capture_failures_are_retried() {
        let pipeline = Arc::new(Pipeline::new());
        let mut calls = 0;
        let source = from_fn(move || {
            calls += 1;
            if calls <= 2 {
                Err(CaptureError::Exhausted("flaky".into()))
            } else {
                Ok(RgbImage::new(64, 48))
            }
        });
        let handle = spawn(Arc::clone(&pipeline), source, fast_config()).unwrap();

        pipeline.viewers().on_connect();
        assert!(wait_until(Duration::from_secs(2), || !pipeline.cell().is_empty()));

        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.capture_failures, 2);
        assert!(stats.producer_running);
        handle.shutdown();
        assert!(!pipeline.stats().producer_running());
    }

    #[test]
    fn test_failure_limit_stops_producer() {
        let pipeline = Arc::new(Pipeline::new());
        let source = from_fn(|| Err(CaptureError::Exhausted("dead".into())));
        let handle = spawn(
            Arc::clone(&pipeline),
            source,
            fast_config().max_capture_failures(3),
        )
        .unwrap();

        pipeline.viewers().on_connect();
        assert!(wait_until(Duration::from_secs(2), || handle.is_finished()));

        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.capture_failures, 3);
        assert!(!stats.producer_running);
        // The gate is not left held by the dead worker
        assert!(!pipeline.gate().is_held());
    }

    #[test]
    fn test_shutdown_while_paused() {
        let pipeline = Arc::new(Pipeline::new());
        let handle = spawn(
            Arc::clone(&pipeline),
            SyntheticSource::new(32, 24),
            fast_config(),
        )
        .unwrap();

        assert!(wait_until(Duration::from_secs(1), || {
            pipeline.stats().producer_running()
        }));
        handle.shutdown();
        assert!(!pipeline.stats().producer_running());
    }
}
