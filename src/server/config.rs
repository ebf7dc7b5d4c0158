//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::stream::{DEFAULT_IDLE_BACKOFF, DEFAULT_JPEG_QUALITY};

/// Default location of the page data file
pub const DEFAULT_DATA_FILE: &str = "data/data.jsonc";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Page data file, read on every `GET /`
    pub data_file: PathBuf,

    /// Pause between polls of an empty or unchanged frame cell
    pub idle_backoff: Duration,

    /// JPEG quality for streamed frames (1-100)
    pub jpeg_quality: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the page data file
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    /// Set the stream idle backoff (at least 1ms)
    pub fn idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff.max(Duration::from_millis(1));
        self
    }

    /// Set JPEG quality
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}
