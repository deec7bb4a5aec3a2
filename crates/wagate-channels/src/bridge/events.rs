use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info, warn};
use wagate_core::message::ClientEvent;

/// Pause between event stream reconnection attempts.
pub(super) const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Decode one bridge frame. Unknown or malformed frames yield `None`.
pub(super) fn parse_frame(text: &str) -> Option<ClientEvent> {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("skipping bridge frame: {e}");
            None
        }
    }
}

/// Read bridge events into `tx`, reconnecting until the receiver is dropped.
pub(super) async fn read_events(url: String, tx: mpsc::Sender<ClientEvent>) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                info!("bridge event stream connected");
                let (mut write, mut read) = stream.split();

                while let Some(frame) = read.next().await {
                    let text = match frame {
                        Ok(WsMessage::Text(t)) => t,
                        Ok(WsMessage::Ping(data)) => {
                            let _ = write.send(WsMessage::Pong(data)).await;
                            continue;
                        }
                        Ok(WsMessage::Close(_)) => break,
                        Ok(_) => continue,
                        Err(e) => {
                            warn!("bridge event stream error: {e}");
                            break;
                        }
                    };

                    if let Some(event) = parse_frame(&text) {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
                warn!("bridge event stream closed");
            }
            Err(e) => warn!("bridge event stream connect failed: {e}"),
        }

        if tx.is_closed() {
            return;
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}
