/// WebSocket transport for room events
use super::events::ClientEvent;
use super::handlers::RoomEvents;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use jukebox_core::ConnectionId;
use std::sync::Arc;

/// GET /ws - Upgrade to the room event socket
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let events = Arc::clone(&state.events);
    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

async fn handle_socket(socket: WebSocket, events: Arc<RoomEvents>) {
    let connection = ConnectionId::generate();
    let mut outbound = events.hub().connect(connection.clone()).await;
    let (mut sink, mut stream) = socket.split();

    tracing::debug!(connection = %connection, "Socket connected");

    let writer_connection = connection.clone();
    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(connection = %writer_connection, "Failed to encode event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => events.handle(&connection, event).await,
                Err(e) => {
                    tracing::warn!(connection = %connection, "Ignoring malformed event: {}", e);
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection = %connection, "Socket error: {}", e);
                break;
            }
        }
    }

    events.disconnect(&connection).await;
    writer.abort();
    tracing::debug!(connection = %connection, "Socket closed");
}
