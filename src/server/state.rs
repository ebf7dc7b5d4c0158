//! Shared handler state

use std::sync::Arc;

use tokio::sync::watch;

use crate::pipeline::Pipeline;
use crate::stream::FrameEncoder;

use super::config::ServerConfig;

/// State handed to every axum handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub encoder: Arc<dyn FrameEncoder>,
    pub config: Arc<ServerConfig>,
    /// Flips to `true` when the server starts shutting down
    pub shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<Pipeline>,
        encoder: Arc<dyn FrameEncoder>,
        config: ServerConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            pipeline,
            encoder,
            config: Arc::new(config),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Stop the pipeline and tell long-lived sessions to end
    pub fn begin_shutdown(&self) {
        self.pipeline.gate().shutdown();
        self.shutdown.send_replace(true);
    }
}
