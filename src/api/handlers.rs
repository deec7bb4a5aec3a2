use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;
use wagate_channels::groups::resolve_group;
use wagate_core::{
    error::GatewayError,
    formatter::Recipient,
    message::{OutgoingContent, SentMessage},
};

use super::error::{success, ApiError, INVALID_VALUE};
use super::extract::{lenient_string, non_empty, JsonOrForm};
use super::media::fetch_media;
use super::ApiState;

/// Validation message when a group request names neither `id` nor `name`.
pub const GROUP_TARGET_REQUIRED: &str = "Invalid value, you can use `id` or `name`";

#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendMediaRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    caption: Option<String>,
    /// URL of the file to attach.
    #[serde(default, deserialize_with = "lenient_string")]
    file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendGroupMessageRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearMessageRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    number: Option<String>,
}

/// Collects per-field validation failures.
#[derive(Default)]
struct Validator(BTreeMap<&'static str, String>);

impl Validator {
    fn require<'a>(&mut self, name: &'static str, field: &'a Option<String>) -> Option<&'a str> {
        let value = non_empty(field);
        if value.is_none() {
            self.0.insert(name, INVALID_VALUE.to_string());
        }
        value
    }

    fn fail(&mut self, name: &'static str, message: &str) {
        self.0.insert(name, message.to_string());
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

/// Format `raw` and confirm it is a registered account.
async fn registered_recipient(state: &ApiState, raw: &str) -> Result<Recipient, GatewayError> {
    let recipient = Recipient::individual(raw, &state.country_code)?;
    if !state.client.is_registered_user(recipient.id()).await? {
        return Err(GatewayError::NotRegistered(recipient.id().to_string()));
    }
    Ok(recipient)
}

fn sent_response(sent: SentMessage) -> Result<Json<Value>, ApiError> {
    let value = serde_json::to_value(sent).map_err(GatewayError::from)?;
    Ok(success(value))
}

/// `POST /send-message`: text to an individual number.
pub async fn send_message(
    State(state): State<ApiState>,
    JsonOrForm(req): JsonOrForm<SendMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::default();
    let number = v.require("number", &req.number).unwrap_or_default();
    v.require("message", &req.message);
    v.finish()?;

    let recipient = registered_recipient(&state, number).await?;
    // Message text is sent as given, not trimmed.
    let text = req.message.clone().unwrap_or_default();
    let sent = state
        .client
        .send_message(recipient.id(), OutgoingContent::Text(text))
        .await?;

    info!("sent text to {}", recipient.id());
    sent_response(sent)
}

/// `POST /send-media`: a remote file, with optional caption, to an
/// individual number.
pub async fn send_media(
    State(state): State<ApiState>,
    JsonOrForm(req): JsonOrForm<SendMediaRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::default();
    let number = v.require("number", &req.number).unwrap_or_default();
    let file = v.require("file", &req.file).unwrap_or_default();
    v.finish()?;

    let recipient = registered_recipient(&state, number).await?;
    let media = fetch_media(&state.http, file).await?;
    let caption = non_empty(&req.caption).map(str::to_string);

    let sent = state
        .client
        .send_message(recipient.id(), OutgoingContent::Media { media, caption })
        .await?;

    info!("sent media to {}", recipient.id());
    sent_response(sent)
}

/// `POST /send-group-message`: text to a group by id or by name.
pub async fn send_group_message(
    State(state): State<ApiState>,
    JsonOrForm(req): JsonOrForm<SendGroupMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::default();
    let id = non_empty(&req.id);
    let name = non_empty(&req.name);
    if id.is_none() && name.is_none() {
        v.fail("id", GROUP_TARGET_REQUIRED);
    }
    v.require("message", &req.message);
    v.finish()?;

    let recipient = resolve_group(state.client.as_ref(), id, name).await?;
    let text = req.message.clone().unwrap_or_default();
    let sent = state
        .client
        .send_message(recipient.id(), OutgoingContent::Text(text))
        .await?;

    info!("sent text to group {}", recipient.id());
    sent_response(sent)
}

/// `POST /clear-message`: wipe the history of a chat with a number.
pub async fn clear_message(
    State(state): State<ApiState>,
    JsonOrForm(req): JsonOrForm<ClearMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::default();
    let number = v.require("number", &req.number).unwrap_or_default();
    v.finish()?;

    let recipient = registered_recipient(&state, number).await?;
    let chat = state.client.get_chat_by_id(recipient.id()).await?;
    let cleared = state.client.clear_messages(&chat.id).await?;

    info!("cleared chat {}", chat.id);
    Ok(success(Value::Bool(cleared)))
}
