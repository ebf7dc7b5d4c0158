//! Real-time event channel
//!
//! WebSocket sessions observe the viewer count without being viewers
//! themselves; only `/video_feed` streams hold leases. A session receives
//! the current count when it opens, then
//! `{"event":"count_change","data":{"data":N}}` after each change.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::pipeline::CountChange;

use super::state::AppState;

/// Name of the outbound count event
pub const COUNT_CHANGE: &str = "count_change";

#[derive(Debug, Serialize)]
struct EventMessage<T> {
    event: &'static str,
    data: T,
}

/// Serialize a count change as a text frame payload
pub fn count_change_message(change: CountChange) -> serde_json::Result<String> {
    serde_json::to_string(&EventMessage {
        event: COUNT_CHANGE,
        data: change,
    })
}

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session(socket, state))
}

async fn session(socket: WebSocket, state: AppState) {
    let viewers = state.pipeline.viewers();
    // Subscribe before reading the count so no change is missed in between
    let mut events = viewers.subscribe();
    let mut shutdown = state.shutdown.subscribe();

    let (mut sender, mut receiver) = socket.split();
    tracing::debug!(subscribers = viewers.subscriber_count(), "Event session opened");

    let mut pending = Some(CountChange {
        data: viewers.count(),
    });

    loop {
        let change = match pending.take() {
            Some(change) => change,
            None => tokio::select! {
                event = events.recv() => match event {
                    Ok(change) => change,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Event session lagged");
                        CountChange { data: viewers.count() }
                    }
                    Err(RecvError::Closed) => break,
                },
                msg = receiver.next() => match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound messages carry no meaning beyond keeping the socket alive
                    Some(Ok(_)) => continue,
                },
                _ = shutdown.wait_for(|stopping| *stopping) => break,
            },
        };

        let text = match count_change_message(change) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize count change");
                continue;
            }
        };

        if sender.send(Message::Text(text)).await.is_err() {
            break;
        }
    }

    let _ = sender.close().await;
    tracing::debug!("Event session closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_change_message_shape() {
        let text = count_change_message(CountChange { data: 3 }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "event": "count_change", "data": { "data": 3 } })
        );
    }
}
