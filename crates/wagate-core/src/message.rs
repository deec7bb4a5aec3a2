use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A media attachment fetched at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    /// MIME type as reported by the remote server (e.g. `image/png`).
    pub mimetype: String,
    pub data: Vec<u8>,
    pub filename: String,
}

/// What to send to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingContent {
    Text(String),
    Media {
        media: MediaPayload,
        caption: Option<String>,
    },
}

/// The client's acknowledgement of a sent message.
///
/// Fields the gateway does not interpret are kept in `extra` and passed
/// through to HTTP callers untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: String,
    pub to: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A chat as listed by the messaging client.
///
/// Client payloads are camelCase (`isGroup`); snake_case keys are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "is_group")]
    pub is_group: bool,
}

/// A message received by the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub id: String,
    /// Chat id of the sender.
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Whether the account itself authored this message.
    #[serde(default, alias = "from_me")]
    pub from_me: bool,
    #[serde(default, alias = "has_media")]
    pub has_media: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event emitted by the messaging client.
///
/// Everything except `Message` is a session lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A fresh pairing QR payload (rotates periodically until scanned).
    Qr { code: String },
    Authenticated,
    Ready,
    AuthFailure {
        #[serde(default)]
        reason: String,
    },
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    Message { message: InboundMessage },
}

impl ClientEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Qr { .. } => "qr",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::AuthFailure { .. } => "auth_failure",
            Self::Disconnected { .. } => "disconnected",
            Self::Message { .. } => "message",
        }
    }
}
