//! HTTP routes

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::error::PageError;
use crate::pipeline::GateState;
use crate::stats::StatsSnapshot;
use crate::stream::{multipart, StreamEmitter};

use super::events::ws_handler;
use super::page::PageData;
use super::state::AppState;

/// Client script for the index page
pub const APP_JS: &str = include_str!("../../static/app.js");

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/video_feed", get(video_feed))
        .route("/static/app.js", get(app_js))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let data = PageData::load(&state.config.data_file).await?;
    Ok(Html(data.render()))
}

async fn video_feed(State(state): State<AppState>) -> Response {
    let emitter = StreamEmitter::new(
        Arc::clone(&state.pipeline),
        Arc::clone(&state.encoder),
        state.config.idle_backoff,
    );

    (
        [
            (header::CONTENT_TYPE, multipart::CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Body::from_stream(emitter.into_stream()),
    )
        .into_response()
}

async fn app_js() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
}

/// `GET /health` body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the producer is not running
    pub status: &'static str,
    pub viewers: usize,
    pub producer_running: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let producer_running = state.pipeline.stats().producer_running();

    Json(HealthResponse {
        status: if producer_running { "ok" } else { "degraded" },
        viewers: state.pipeline.viewers().count(),
        producer_running,
    })
}

/// `GET /stats` body
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub viewers: usize,
    /// `active` or `paused`; always `paused` once the producer has stopped
    pub gate: &'static str,
    pub latest_sequence: u64,
    #[serde(flatten)]
    pub pipeline: StatsSnapshot,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let pipeline = &state.pipeline;
    let producing =
        pipeline.stats().producer_running() && pipeline.gate().state() == GateState::Active;

    Json(StatsResponse {
        viewers: pipeline.viewers().count(),
        gate: if producing { "active" } else { "paused" },
        latest_sequence: pipeline.cell().sequence(),
        pipeline: pipeline.stats().snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Frame, Pipeline};
    use crate::server::ServerConfig;
    use crate::stream::JpegEncoder;
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use futures_util::StreamExt;
    use image::{Rgb, RgbImage};
    use std::io::Write;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state(config: ServerConfig) -> AppState {
        AppState::new(
            Arc::new(Pipeline::new()),
            Arc::new(JpegEncoder::default()),
            config,
        )
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_data_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "pageTitle": "Cam", "pageHeader": "Lobby", // comment
                 "styleSheet": "/style.css", "info": [] }}"#
        )
        .unwrap();

        let app = router(state(ServerConfig::default().data_file(file.path())));
        let response = app.oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<h1>Lobby</h1>"));
    }

    #[tokio::test]
    async fn test_index_missing_data_file_is_500() {
        let app = router(state(
            ServerConfig::default().data_file("/nonexistent/data.jsonc"),
        ));
        let response = app.oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_index_malformed_data_file_is_500() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ pageTitle: ").unwrap();

        let app = router(state(ServerConfig::default().data_file(file.path())));
        let response = app.oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_app_js_served() {
        let response = router(state(ServerConfig::default()))
            .oneshot(get("/static/app.js"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/javascript; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("count_change"));
    }

    #[tokio::test]
    async fn test_health_reports_degraded_without_producer() {
        let response = router(state(ServerConfig::default()))
            .oneshot(get("/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "status": "degraded", "viewers": 0, "producer_running": false })
        );
    }

    #[tokio::test]
    async fn test_stats_payload() {
        let state = state(ServerConfig::default());
        state.pipeline.stats().set_producer_running(true);

        let response = router(state).oneshot(get("/stats")).await.unwrap();
        let json = body_json(response).await;

        assert_eq!(json["viewers"], 0);
        assert_eq!(json["gate"], "paused");
        assert_eq!(json["producer_running"], true);
        assert_eq!(json["frames_published"], 0);
    }

    #[tokio::test]
    async fn test_stats_reports_paused_without_producer() {
        let state = state(ServerConfig::default());
        state.pipeline.viewers().on_connect();

        let response = router(state.clone()).oneshot(get("/stats")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["viewers"], 1);
        assert_eq!(json["gate"], "paused");
        assert_eq!(json["producer_running"], false);

        state.pipeline.stats().set_producer_running(true);
        let response = router(state).oneshot(get("/stats")).await.unwrap();
        assert_eq!(body_json(response).await["gate"], "active");
    }

    #[tokio::test]
    async fn test_video_feed_streams_chunks_while_connected() {
        let state = state(ServerConfig::default().idle_backoff(Duration::from_millis(1)));
        let pipeline = Arc::clone(&state.pipeline);
        pipeline
            .cell()
            .publish(Frame::new(RgbImage::from_pixel(8, 8, Rgb([9, 9, 9]))));

        let response = router(state).oneshot(get("/video_feed")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "multipart/x-mixed-replace; boundary=frame"
        );
        assert_eq!(pipeline.viewers().count(), 1);

        let mut body = response.into_body().into_data_stream();
        let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(chunk.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n"));

        drop(body);
        assert_eq!(pipeline.viewers().count(), 0);
    }
}
