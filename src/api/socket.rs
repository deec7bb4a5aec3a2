//! Realtime session status over WebSocket.
//!
//! Server -> client frames are `{"event": "<name>", "data": "<string>"}`.
//! Client frames are read and dropped.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use wagate_channels::{Relay, SocketEvent, Subscription};

use super::ApiState;

/// `GET /ws`: upgrade and attach a relay subscriber.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

async fn handle_socket(socket: WebSocket, relay: Relay) {
    let ws_id = uuid::Uuid::new_v4().to_string();
    let Subscription { replay, mut events } = relay.subscribe().await;
    let (mut sender, mut receiver) = socket.split();
    debug!("subscriber {ws_id} connected ({} total)", relay.subscriber_count());

    for event in &replay {
        if push(&mut sender, event).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if push(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("subscriber {ws_id} lagged, {skipped} events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            frame = receiver.next() => match frame {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("subscriber {ws_id} disconnected");
}

async fn push(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &SocketEvent,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to encode socket event: {e}");
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await
}
