//! HTTP server listener
//!
//! Binds the TCP listener and serves the router until shut down.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::server::config::ServerConfig;
use crate::server::routes;
use crate::server::state::AppState;
use crate::stream::{FrameEncoder, JpegEncoder};

/// Web front end of the pipeline
pub struct WebServer {
    state: AppState,
}

impl WebServer {
    /// Create a server streaming JPEG at the configured quality
    pub fn new(config: ServerConfig, pipeline: Arc<Pipeline>) -> Self {
        let encoder = Arc::new(JpegEncoder::new(config.jpeg_quality));
        Self::with_encoder(config, pipeline, encoder)
    }

    /// Create a server with a custom frame encoder
    pub fn with_encoder(
        config: ServerConfig,
        pipeline: Arc<Pipeline>,
        encoder: Arc<dyn FrameEncoder>,
    ) -> Self {
        Self {
            state: AppState::new(pipeline, encoder, config),
        }
    }

    /// Get a reference to the pipeline
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.state.pipeline
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Build the router (useful for in-process testing)
    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    ///
    /// When `shutdown` resolves the pipeline is shut down, open streams and
    /// event sessions end, and the call returns once connections drain.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(addr = %addr, "HTTP server listening");

        let state = self.state.clone();
        let signal = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");
            state.begin_shutdown();
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!(addr = %addr, "HTTP server stopped");
        Ok(())
    }
}
