use crate::{
    error::GatewayError,
    message::{Chat, ClientEvent, OutgoingContent, SentMessage},
};
use async_trait::async_trait;

/// Messaging client trait: the adapter to the automation session.
///
/// One instance is constructed at startup and shared (as `Arc<dyn _>`) by the
/// HTTP layer and the event relay. Tests substitute a fake.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Human-readable client name.
    fn name(&self) -> &str;

    /// Start listening for client events.
    /// Returns a receiver that yields lifecycle and inbound-message events.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<ClientEvent>, GatewayError>;

    /// Boot the session (emits `qr` or `authenticated` events afterwards).
    async fn initialize(&self) -> Result<(), GatewayError>;

    /// Tear the session down.
    async fn destroy(&self) -> Result<(), GatewayError>;

    /// Whether `id` belongs to an account on the messaging network.
    async fn is_registered_user(&self, id: &str) -> Result<bool, GatewayError>;

    /// Send text or media to a chat.
    async fn send_message(
        &self,
        to: &str,
        content: OutgoingContent,
    ) -> Result<SentMessage, GatewayError>;

    /// List every chat the account participates in.
    async fn get_chats(&self) -> Result<Vec<Chat>, GatewayError>;

    /// Fetch a single chat.
    async fn get_chat_by_id(&self, id: &str) -> Result<Chat, GatewayError>;

    /// Clear the message history of a chat.
    async fn clear_messages(&self, chat_id: &str) -> Result<bool, GatewayError>;

    /// Stop listening for events.
    async fn stop(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
