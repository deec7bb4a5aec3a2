//! Automation bridge client.
//!
//! The browser automation session runs in a separate bridge process. Commands
//! go over its HTTP API; lifecycle and inbound-message events arrive on its
//! `/events` WebSocket.

mod events;


use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use wagate_core::{
    config::ClientConfig,
    error::GatewayError,
    message::{Chat, ClientEvent, OutgoingContent, SentMessage},
    traits::MessagingClient,
};

/// Fallback filename for media sent without one.
pub const DEFAULT_MEDIA_FILENAME: &str = "Media";

#[derive(Deserialize)]
struct RegisteredResponse {
    registered: bool,
}

#[derive(Deserialize)]
struct ClearedResponse {
    cleared: bool,
}

#[derive(Deserialize)]
struct BridgeErrorBody {
    error: String,
}

/// `MessagingClient` backed by an external automation bridge.
pub struct BridgeClient {
    base_url: String,
    http: reqwest::Client,
    /// Event reader task, set by `start()`.
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl BridgeClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            reader: Mutex::new(None),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self::new(http, &config.bridge_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// WebSocket URL of the bridge event stream.
    pub fn events_url(&self) -> String {
        let ws = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws}/events")
    }

    /// Probe the bridge; returns its health payload.
    pub async fn health(&self) -> Result<Value, GatewayError> {
        let resp = self
            .http
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| GatewayError::Client(format!("bridge unreachable: {e}")))?;
        Self::parse(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn chat_url(&self, id: &str, suffix: &str) -> String {
        self.url(&format!("/chats/{}{suffix}", urlencoding::encode(id)))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, GatewayError> {
        let resp = self
            .http
            .post(path)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Client(format!("bridge request failed: {e}")))?;
        Self::parse(resp).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let resp = self
            .http
            .get(path)
            .send()
            .await
            .map_err(|e| GatewayError::Client(format!("bridge request failed: {e}")))?;
        Self::parse(resp).await
    }

    /// Turn a bridge response into `T`, surfacing `{"error": "..."}` bodies.
    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayError> {
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GatewayError::Client(format!("bridge response read failed: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<BridgeErrorBody>(&bytes)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(GatewayError::Client(format!("bridge returned {status}: {detail}")));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::Client(format!("unexpected bridge response: {e}")))
    }
}

/// JSON body for `POST /messages`.
fn message_body(to: &str, content: &OutgoingContent) -> Value {
    match content {
        OutgoingContent::Text(text) => json!({ "to": to, "text": text }),
        OutgoingContent::Media { media, caption } => {
            let filename = if media.filename.is_empty() {
                DEFAULT_MEDIA_FILENAME
            } else {
                media.filename.as_str()
            };
            json!({
                "to": to,
                "media": {
                    "mimetype": media.mimetype,
                    "data": BASE64.encode(&media.data),
                    "filename": filename,
                },
                "caption": caption,
            })
        }
    }
}

#[async_trait]
impl MessagingClient for BridgeClient {
    fn name(&self) -> &str {
        "bridge"
    }

    async fn start(&self) -> Result<mpsc::Receiver<ClientEvent>, GatewayError> {
        let (tx, rx) = mpsc::channel(64);
        let url = self.events_url();
        info!("listening for bridge events on {url}");

        let handle = tokio::spawn(events::read_events(url, tx));
        if let Some(old) = self.reader.lock().await.replace(handle) {
            old.abort();
        }
        Ok(rx)
    }

    async fn initialize(&self) -> Result<(), GatewayError> {
        let _: Value = self.post_json(&self.url("/initialize"), &json!({})).await?;
        info!("bridge session initializing");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), GatewayError> {
        let _: Value = self.post_json(&self.url("/destroy"), &json!({})).await?;
        info!("bridge session destroyed");
        Ok(())
    }

    async fn is_registered_user(&self, id: &str) -> Result<bool, GatewayError> {
        let url = self.url(&format!(
            "/contacts/{}/registered",
            urlencoding::encode(id)
        ));
        let resp: RegisteredResponse = self.get_json(&url).await?;
        debug!("{id} registered: {}", resp.registered);
        Ok(resp.registered)
    }

    async fn send_message(
        &self,
        to: &str,
        content: OutgoingContent,
    ) -> Result<SentMessage, GatewayError> {
        let body = message_body(to, &content);
        self.post_json(&self.url("/messages"), &body).await
    }

    async fn get_chats(&self) -> Result<Vec<Chat>, GatewayError> {
        self.get_json(&self.url("/chats")).await
    }

    async fn get_chat_by_id(&self, id: &str) -> Result<Chat, GatewayError> {
        self.get_json(&self.chat_url(id, "")).await
    }

    async fn clear_messages(&self, chat_id: &str) -> Result<bool, GatewayError> {
        let resp: ClearedResponse = self
            .post_json(&self.chat_url(chat_id, "/clear"), &json!({}))
            .await?;
        Ok(resp.cleared)
    }

    async fn stop(&self) -> Result<(), GatewayError> {
        if let Some(handle) = self.reader.lock().await.take() {
            handle.abort();
        }
        info!("bridge client stopped");
        Ok(())
    }
}
