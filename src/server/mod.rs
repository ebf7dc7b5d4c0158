//! HTTP front end
//!
//! Serves the index page, the MJPEG feed, the event channel and the status
//! endpoints for one [`Pipeline`](crate::Pipeline).

pub mod config;
pub mod events;
pub mod listener;
pub mod page;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use listener::WebServer;
pub use page::{InfoItem, PageData};
pub use state::AppState;
