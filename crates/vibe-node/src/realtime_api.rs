//! Real-time delivery endpoints.
//!
//! - `/api/stream` - push stream (`text/event-stream`) of chat events
//! - `/ws` - WebSocket receiving the same events
//! - `/api/realtime/stats` - statistics about real-time connections
//!
//! Both transports carry the same JSON envelope:
//!
//! ```json
//! {"type": "new_message", "chat_id": "...", "message_id": "...", "preview": "hello"}
//! ```
//!
//! Idle push streams get a `: keep-alive` comment frame. Frames sent by
//! WebSocket clients are read and discarded; they only keep the connection
//! open until the peer closes it.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
    routing::get,
    Json, Router,
};
use futures::Stream;
use futures_util::{SinkExt, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vibe_realtime::{Dispatcher, Frame};

use crate::api::{ApiError, AppState};

/// Create the real-time API routes.
pub fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stream", get(stream_handler))
        .route("/ws", get(ws_handler))
        .route("/api/realtime/stats", get(get_stats))
}

/// Maps a push frame onto a server-sent event.
fn to_event(frame: Frame) -> Event {
    match frame {
        Frame::Data(payload) => Event::default().data(&*payload),
        Frame::KeepAlive => Event::default().comment("keep-alive"),
    }
}

/// Push-stream handler.
///
/// The subscription lives inside the response stream. When the client goes
/// away the stream is dropped and the subscription unregisters itself.
async fn stream_handler(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let subscription = state.realtime.push().subscribe()?;
    info!(subscriber_id = %subscription.id(), "Push stream opened");

    let stream = subscription
        .into_stream()
        .map(|frame| Ok::<_, Infallible>(to_event(frame)));

    Ok(Sse::new(stream))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.realtime.clone()))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, realtime: Arc<Dispatcher>) {
    let sockets = realtime.sockets().clone();
    let (connection_id, mut outbox) = match sockets.connect_channel() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Rejected WebSocket connection");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward queued envelopes to the peer. A write error kills the socket.
    let writer = sockets.clone();
    let send_task = tokio::spawn(async move {
        while let Some(payload) = outbox.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(payload.to_string().into())).await {
                debug!(connection_id = %connection_id, error = %e, "WebSocket write failed");
                writer.disconnect(connection_id);
                return;
            }
        }
        // The broadcaster let go of this socket: pruned or shut down.
        let _ = ws_sender.close().await;
        debug!(connection_id = %connection_id, "Send task ended");
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => {
                debug!(connection_id = %connection_id, "WebSocket close received");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    send_task.abort();
    sockets.disconnect(connection_id);
}

/// Get real-time connection statistics.
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.realtime.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibe_realtime::RealtimeStats;

    #[test]
    fn test_stats_serialization() {
        let stats = RealtimeStats {
            push_subscribers: 2,
            socket_connections: 3,
            events_published: 10,
            ..RealtimeStats::default()
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"push_subscribers\":2"));
        assert!(json.contains("\"events_published\":10"));
    }
}
