//! Statistics and metrics for the frame pipeline

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Live pipeline counters
///
/// Updated from the producer thread and the stream tasks without locking.
#[derive(Debug)]
pub struct PipelineStats {
    started_at: Instant,
    /// Producer iterations started
    iterations: AtomicU64,
    /// Frames published into the cell
    frames_published: AtomicU64,
    /// Failed capture attempts
    capture_failures: AtomicU64,
    /// Frames in which motion was found
    motion_frames: AtomicU64,
    /// Whether the producer thread is alive
    producer_running: AtomicBool,
    /// Multipart chunks written to clients
    chunks_sent: AtomicU64,
    /// JPEG bytes written to clients
    bytes_sent: AtomicU64,
    /// Frames the emitters failed to encode
    encode_failures: AtomicU64,
    /// Streams ever opened
    streams_opened: AtomicU64,
    /// Streams currently open
    active_streams: AtomicU64,
}

impl PipelineStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            iterations: AtomicU64::new(0),
            frames_published: AtomicU64::new(0),
            capture_failures: AtomicU64::new(0),
            motion_frames: AtomicU64::new(0),
            producer_running: AtomicBool::new(false),
            chunks_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            streams_opened: AtomicU64::new(0),
            active_streams: AtomicU64::new(0),
        }
    }

    pub fn record_iteration(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_publish(&self) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture_failure(&self) {
        self.capture_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_motion(&self) {
        self.motion_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_producer_running(&self, running: bool) {
        self.producer_running.store(running, Ordering::Release);
    }

    pub fn record_chunk(&self, bytes: usize) {
        self.chunks_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stream_opened(&self) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
        self.active_streams.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stream_closed(&self) {
        let _ = self
            .active_streams
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Whether the producer thread is alive
    pub fn producer_running(&self) -> bool {
        self.producer_running.load(Ordering::Acquire)
    }

    /// Time since the pipeline was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        let uptime = self.uptime();
        let frames_published = self.frames_published.load(Ordering::Relaxed);

        StatsSnapshot {
            uptime_secs: uptime.as_secs(),
            iterations: self.iterations.load(Ordering::Relaxed),
            frames_published,
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            motion_frames: self.motion_frames.load(Ordering::Relaxed),
            producer_running: self.producer_running(),
            chunks_sent: self.chunks_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            active_streams: self.active_streams.load(Ordering::Relaxed),
            average_fps: average_rate(frames_published, uptime),
        }
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable copy of [`PipelineStats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub iterations: u64,
    pub frames_published: u64,
    pub capture_failures: u64,
    pub motion_frames: u64,
    pub producer_running: bool,
    pub chunks_sent: u64,
    pub bytes_sent: u64,
    pub encode_failures: u64,
    pub streams_opened: u64,
    pub active_streams: u64,
    /// Published frames per second since startup
    pub average_fps: f64,
}

/// Events per second over `elapsed`
fn average_rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}
