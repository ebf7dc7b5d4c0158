//! Frame producer
//!
//! The single background worker that captures, processes and publishes
//! frames while the pipeline is watched.

pub mod config;
pub mod worker;

pub use config::{ProducerConfig, ProducerMode};
pub use worker::{spawn, ProducerHandle};
