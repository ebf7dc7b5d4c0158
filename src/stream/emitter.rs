//! Per-client stream emitter
//!
//! Each `/video_feed` request owns one emitter. The emitter holds a viewer
//! lease for as long as it lives, so the producer keeps running while the
//! client is connected and pauses once the response body is dropped.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;

use crate::error::EncodeError;
use crate::pipeline::{Frame, Pipeline, ViewerLease};

use super::encoder::FrameEncoder;
use super::multipart;

/// Default pause between polls of an empty or unchanged cell
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Reads the frame cell and produces multipart chunks
pub struct StreamEmitter {
    pipeline: Arc<Pipeline>,
    encoder: Arc<dyn FrameEncoder>,
    idle_backoff: Duration,
    lease: ViewerLease,
    /// Sequence of the last frame actually sent (0 = none)
    sent: u64,
}

impl StreamEmitter {
    /// Register a new viewer and create its emitter
    pub fn new(
        pipeline: Arc<Pipeline>,
        encoder: Arc<dyn FrameEncoder>,
        idle_backoff: Duration,
    ) -> Self {
        let lease = pipeline.viewers().lease();
        pipeline.stats().stream_opened();

        tracing::info!(lease = lease.id(), "Stream opened");

        Self {
            pipeline,
            encoder,
            idle_backoff,
            lease,
            sent: 0,
        }
    }

    /// Wait for the next chunk
    ///
    /// Never returns a partial chunk: empty cells, frames already sent and
    /// frames that fail to encode are skipped after the idle backoff.
    /// Returns `None` once the pipeline has been shut down.
    pub async fn next_chunk(&mut self) -> Option<Bytes> {
        loop {
            if self.pipeline.gate().is_shutdown() {
                return None;
            }

            if let Some(snapshot) = self.pipeline.cell().snapshot() {
                if snapshot.sequence != self.sent {
                    match self.encode(snapshot.frame).await {
                        Ok(payload) => {
                            self.sent = snapshot.sequence;
                            self.pipeline.stats().record_chunk(payload.len());
                            return Some(multipart::part(
                                self.encoder.content_type(),
                                &payload,
                            ));
                        }
                        Err(e) => {
                            self.pipeline.stats().record_encode_failure();
                            tracing::warn!(
                                lease = self.lease.id(),
                                sequence = snapshot.sequence,
                                error = %e,
                                "Frame encode failed, skipping"
                            );
                        }
                    }
                }
            }

            tokio::time::sleep(self.idle_backoff).await;
        }
    }

    async fn encode(&self, frame: Arc<Frame>) -> Result<Bytes, EncodeError> {
        let encoder = Arc::clone(&self.encoder);

        tokio::task::spawn_blocking(move || encoder.encode(&frame))
            .await
            .map_err(|e| EncodeError::Task(e.to_string()))?
    }

    /// Turn the emitter into a body stream that ends only on shutdown
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> + Send {
        futures_util::stream::unfold(self, |mut emitter| async move {
            let chunk = emitter.next_chunk().await?;
            Some((Ok(chunk), emitter))
        })
    }

    /// Lease id (for logging)
    pub fn id(&self) -> u64 {
        self.lease.id()
    }
}

impl Drop for StreamEmitter {
    fn drop(&mut self) {
        self.pipeline.stats().stream_closed();
        tracing::info!(lease = self.lease.id(), "Stream closed");
    }
}

impl std::fmt::Debug for StreamEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEmitter")
            .field("lease", &self.lease)
            .field("sent", &self.sent)
            .finish()
    }
}
