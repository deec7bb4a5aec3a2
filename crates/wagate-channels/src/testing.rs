//! In-memory [`MessagingClient`] for tests.

use async_trait::async_trait;
use serde_json::Map;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use wagate_core::{
    error::GatewayError,
    message::{Chat, ClientEvent, OutgoingContent, SentMessage},
    traits::MessagingClient,
};

/// A fake client that records every call for assertion.
///
/// Calls are recorded as `"op"` or `"op:argument"` strings, in order.
#[derive(Default)]
pub struct FakeClient {
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<(String, OutgoingContent)>>,
    registered: Mutex<HashSet<String>>,
    chats: Mutex<Vec<Chat>>,
    fail_send: AtomicBool,
    fail_clear: AtomicBool,
    next_id: AtomicUsize,
    events_tx: Mutex<Option<mpsc::Sender<ClientEvent>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark chat ids as registered accounts.
    pub fn with_registered(self, ids: &[&str]) -> Self {
        self.registered
            .lock()
            .unwrap()
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_chats(self, chats: Vec<Chat>) -> Self {
        *self.chats.lock().unwrap() = chats;
        self
    }

    /// Make every `send_message` fail.
    pub fn failing_sends(self) -> Self {
        self.fail_send.store(true, Ordering::SeqCst);
        self
    }

    /// Make every `clear_messages` fail.
    pub fn failing_clears(self) -> Self {
        self.fail_clear.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls to `op`, whatever the argument.
    pub fn count_calls(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == op || c.starts_with(&format!("{op}:")))
            .count()
    }

    pub fn sent(&self) -> Vec<(String, OutgoingContent)> {
        self.sent.lock().unwrap().clone()
    }

    /// Push an event as if the session emitted it. Requires `start()` first.
    pub async fn emit(&self, event: ClientEvent) {
        let tx = self.events_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl MessagingClient for FakeClient {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start(&self) -> Result<mpsc::Receiver<ClientEvent>, GatewayError> {
        self.record("start");
        let (tx, rx) = mpsc::channel(16);
        *self.events_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn initialize(&self) -> Result<(), GatewayError> {
        self.record("initialize");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), GatewayError> {
        self.record("destroy");
        Ok(())
    }

    async fn is_registered_user(&self, id: &str) -> Result<bool, GatewayError> {
        self.record(format!("is_registered_user:{id}"));
        Ok(self.registered.lock().unwrap().contains(id))
    }

    async fn send_message(
        &self,
        to: &str,
        content: OutgoingContent,
    ) -> Result<SentMessage, GatewayError> {
        self.record(format!("send_message:{to}"));
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(GatewayError::Client("Evaluation failed: send".into()));
        }
        self.sent.lock().unwrap().push((to.to_string(), content));
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(SentMessage {
            id: format!("true_{to}_{n}"),
            to: to.to_string(),
            timestamp: Some(1_700_000_000),
            extra: Map::new(),
        })
    }

    async fn get_chats(&self) -> Result<Vec<Chat>, GatewayError> {
        self.record("get_chats");
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn get_chat_by_id(&self, id: &str) -> Result<Chat, GatewayError> {
        self.record(format!("get_chat_by_id:{id}"));
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap_or_else(|| Chat {
                id: id.to_string(),
                name: String::new(),
                is_group: false,
            }))
    }

    async fn clear_messages(&self, chat_id: &str) -> Result<bool, GatewayError> {
        self.record(format!("clear_messages:{chat_id}"));
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(GatewayError::Client("Evaluation failed: clear".into()));
        }
        Ok(true)
    }

    async fn stop(&self) -> Result<(), GatewayError> {
        self.record("stop");
        *self.events_tx.lock().unwrap() = None;
        Ok(())
    }
}
