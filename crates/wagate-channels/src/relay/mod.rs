//! Session event relay. Drives the lifecycle state machine from client
//! events and pushes status updates to realtime subscribers.
//!
//! The last QR image and status line are cached so that a subscriber joining
//! late still learns where the session is.

#[cfg(test)]
mod tests;

use crate::qr::{generate_qr_terminal, qr_data_url};
use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};
use wagate_core::{
    message::{ClientEvent, InboundMessage},
    traits::MessagingClient,
};

pub const STATUS_CONNECTING: &str = "Connecting...";
pub const STATUS_QR_RECEIVED: &str = "QR code received, please scan it!";
pub const STATUS_AUTHENTICATED: &str = "WhatsApp is authenticated!";
pub const STATUS_READY: &str = "WhatsApp is ready!";
pub const STATUS_AUTH_FAILURE: &str = "Authentication failed!";
pub const STATUS_AUTH_FAILURE_RESTARTING: &str = "Authentication failed, restarting...";
pub const STATUS_DISCONNECTED: &str = "WhatsApp disconnected!";

/// Buffered events per subscriber before it starts lagging.
const SUBSCRIBER_BUFFER: usize = 32;

/// Server-to-client push on the realtime channel.
///
/// Serialized as `{"event": "<name>", "data": "<string>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SocketEvent {
    /// Human-readable status line.
    Message(String),
    /// QR image as a PNG data URL.
    Qr(String),
    Ready(String),
    Authenticated(String),
}

/// A realtime subscription: cached events to send first, then live events.
pub struct Subscription {
    pub replay: Vec<SocketEvent>,
    pub events: broadcast::Receiver<SocketEvent>,
}

#[derive(Debug, Default)]
struct Snapshot {
    state: SessionState,
    last_qr: Option<String>,
    last_status: Option<String>,
}

/// Relays client lifecycle events to subscribers, one per process.
#[derive(Clone)]
pub struct Relay {
    client: Arc<dyn MessagingClient>,
    tx: broadcast::Sender<SocketEvent>,
    snapshot: Arc<RwLock<Snapshot>>,
    restart_on_auth_fail: bool,
    inbound_tx: Option<mpsc::Sender<InboundMessage>>,
}

impl Relay {
    pub fn new(client: Arc<dyn MessagingClient>) -> Self {
        let (tx, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        Self {
            client,
            tx,
            snapshot: Arc::new(RwLock::new(Snapshot::default())),
            restart_on_auth_fail: false,
            inbound_tx: None,
        }
    }

    /// Reinitialize the client after an authentication failure.
    pub fn with_restart_on_auth_fail(mut self, restart: bool) -> Self {
        self.restart_on_auth_fail = restart;
        self
    }

    /// Forward inbound messages to `tx`.
    pub fn with_inbound(mut self, tx: mpsc::Sender<InboundMessage>) -> Self {
        self.inbound_tx = Some(tx);
        self
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        self.snapshot.read().await.state
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Register a new subscriber.
    ///
    /// The replay starts with a "connecting" status, followed by the pending
    /// QR image (only while pairing) and the last status line.
    pub async fn subscribe(&self) -> Subscription {
        let snap = self.snapshot.read().await;
        let events = self.tx.subscribe();

        let mut replay = vec![SocketEvent::Message(STATUS_CONNECTING.to_string())];
        if snap.state == SessionState::QrPending {
            if let Some(ref url) = snap.last_qr {
                replay.push(SocketEvent::Qr(url.clone()));
            }
        }
        if let Some(ref status) = snap.last_status {
            replay.push(SocketEvent::Message(status.clone()));
        }

        Subscription { replay, events }
    }

    /// Consume client events until the sender side closes.
    pub async fn run(self, mut events: mpsc::Receiver<ClientEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!("client event stream closed, relay stopped");
    }

    /// Apply one client event.
    pub async fn handle_event(&self, event: ClientEvent) {
        if let ClientEvent::Message { message } = event {
            self.forward_inbound(message).await;
            return;
        }

        let reconnect = {
            let mut snap = self.snapshot.write().await;
            let Some(next) = snap.state.on(&event) else {
                warn!(
                    "ignoring '{}' event in state {}",
                    event.name(),
                    snap.state
                );
                return;
            };
            info!("session {} -> {} ({})", snap.state, next, event.name());
            snap.state = next;

            match event {
                ClientEvent::Qr { code } => {
                    match generate_qr_terminal(&code) {
                        Ok(term) => info!("QR received, scan to pair:\n{term}"),
                        Err(e) => warn!("terminal QR rendering failed: {e}"),
                    }
                    match qr_data_url(&code) {
                        Ok(url) => {
                            snap.last_qr = Some(url.clone());
                            self.broadcast(SocketEvent::Qr(url));
                        }
                        Err(e) => error!("QR image generation failed: {e}"),
                    }
                    self.set_status(&mut snap, STATUS_QR_RECEIVED);
                    false
                }
                ClientEvent::Authenticated => {
                    snap.last_qr = None;
                    self.broadcast(SocketEvent::Authenticated(STATUS_AUTHENTICATED.to_string()));
                    self.set_status(&mut snap, STATUS_AUTHENTICATED);
                    false
                }
                ClientEvent::Ready => {
                    self.broadcast(SocketEvent::Ready(STATUS_READY.to_string()));
                    self.set_status(&mut snap, STATUS_READY);
                    false
                }
                ClientEvent::AuthFailure { reason } => {
                    warn!("authentication failed: {reason}");
                    snap.last_qr = None;
                    if self.restart_on_auth_fail {
                        self.set_status(&mut snap, STATUS_AUTH_FAILURE_RESTARTING);
                        true
                    } else {
                        self.set_status(&mut snap, STATUS_AUTH_FAILURE);
                        false
                    }
                }
                ClientEvent::Disconnected { reason } => {
                    warn!("client disconnected: {reason}");
                    self.set_status(&mut snap, STATUS_DISCONNECTED);
                    true
                }
                ClientEvent::Message { .. } => false,
            }
        };

        if reconnect {
            self.reconnect().await;
        }
    }

    /// Full teardown and reinitialization of the client.
    async fn reconnect(&self) {
        info!("reinitializing {} client", self.client.name());
        if let Err(e) = self.client.destroy().await {
            warn!("client teardown failed: {e}");
        }
        {
            let mut snap = self.snapshot.write().await;
            snap.state = SessionState::Uninitialized;
            snap.last_qr = None;
        }
        if let Err(e) = self.client.initialize().await {
            error!("client reinitialization failed: {e}");
        }
    }

    async fn forward_inbound(&self, message: InboundMessage) {
        debug!("inbound message {} from {}", message.id, message.from);
        if let Some(ref tx) = self.inbound_tx {
            if tx.send(message).await.is_err() {
                warn!("inbound message receiver dropped");
            }
        }
    }

    fn set_status(&self, snap: &mut Snapshot, status: &str) {
        snap.last_status = Some(status.to_string());
        self.broadcast(SocketEvent::Message(status.to_string()));
    }

    fn broadcast(&self, event: SocketEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}
