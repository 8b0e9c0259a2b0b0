use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Only forward events for this analysis. Default: all events.
    analysis_id: Option<Uuid>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    if state.ws_tx.is_none() {
        tracing::warn!("WebSocket requested but broadcast channel is disabled");
        return (StatusCode::SERVICE_UNAVAILABLE, "Event stream unavailable").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, query.analysis_id))
}

/// True when `msg` should reach a subscriber filtering on `filter`.
fn wants_message(msg: &str, filter: Option<Uuid>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    serde_json::from_str::<serde_json::Value>(msg)
        .ok()
        .and_then(|v| v.get("analysis_id").and_then(|id| id.as_str()).map(str::to_string))
        .map_or(false, |id| id == filter.to_string())
}

async fn handle_socket(socket: WebSocket, state: AppState, filter: Option<Uuid>) {
    let Some(mut rx) = state.ws_tx.as_ref().map(|tx| tx.subscribe()) else {
        return;
    };
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(analysis_id = ?filter, "WebSocket connection established");

    // Forward broadcast events to this client
    let mut send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            if !wants_message(&msg, filter) {
                continue;
            }
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Drain client frames until it goes away
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tracing::debug!(message = %text, "WebSocket message received");
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(analysis_id = ?filter, "WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter_passes_everything() {
        assert!(wants_message("not even json", None));
    }

    #[test]
    fn test_filter_matches_analysis_id() {
        let id = Uuid::new_v4();
        let msg = serde_json::json!({"type": "analysis_progress", "analysis_id": id}).to_string();
        assert!(wants_message(&msg, Some(id)));
        assert!(!wants_message(&msg, Some(Uuid::new_v4())));
        assert!(!wants_message("{}", Some(id)));
    }
}
