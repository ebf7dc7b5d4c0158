//! Viewer-gated MJPEG streaming with background motion detection
//!
//! A single producer thread captures frames, optionally runs them through a
//! running-average motion detector, and publishes the newest frame into a
//! shared cell. Any number of HTTP clients stream that cell as
//! `multipart/x-mixed-replace` JPEG chunks. The producer only runs while at
//! least one viewer is connected.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use motion_stream::capture::SyntheticSource;
//! use motion_stream::{Pipeline, ProducerConfig, ServerConfig, WebServer};
//!
//! # async fn example() -> motion_stream::Result<()> {
//! let pipeline = Arc::new(Pipeline::new());
//! let producer = motion_stream::producer::spawn(
//!     Arc::clone(&pipeline),
//!     SyntheticSource::new(640, 480),
//!     ProducerConfig::default(),
//! )?;
//!
//! let server = WebServer::new(ServerConfig::default(), pipeline);
//! server.run().await?;
//! producer.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod error;
pub mod motion;
pub mod pipeline;
pub mod producer;
pub mod server;
pub mod stats;
pub mod stream;

pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use producer::{ProducerConfig, ProducerHandle, ProducerMode};
pub use server::{ServerConfig, WebServer};
