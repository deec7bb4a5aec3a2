//! Inbound message handling: webhook forwarding and keyword auto-reply.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wagate_channels::WebhookForwarder;
use wagate_core::{
    error::GatewayError,
    message::{InboundMessage, OutgoingContent},
    traits::MessagingClient,
};
use wagate_memory::KeywordStore;

/// Answers inbound messages whose body matches a stored keyword.
#[derive(Clone)]
pub struct AutoReplier {
    client: Arc<dyn MessagingClient>,
    store: KeywordStore,
}

impl AutoReplier {
    pub fn new(client: Arc<dyn MessagingClient>, store: KeywordStore) -> Self {
        Self { client, store }
    }

    /// Reply to `msg` if its lower-cased body has a stored reply.
    /// Returns whether a reply was sent.
    pub async fn reply(&self, msg: &InboundMessage) -> Result<bool, GatewayError> {
        if msg.from_me || msg.body.trim().is_empty() {
            return Ok(false);
        }

        let keyword = msg.body.to_lowercase();
        let Some(reply) = self.store.get_reply(&keyword).await? else {
            return Ok(false);
        };

        self.client
            .send_message(&msg.from, OutgoingContent::Text(reply))
            .await?;
        info!("auto-replied to {}", msg.from);
        Ok(true)
    }
}

/// Fan-out for every message the account receives.
#[derive(Default)]
pub struct InboundHandler {
    webhook: Option<WebhookForwarder>,
    replier: Option<AutoReplier>,
}

impl InboundHandler {
    pub fn new(webhook: Option<WebhookForwarder>, replier: Option<AutoReplier>) -> Self {
        Self { webhook, replier }
    }

    pub async fn handle(&self, msg: InboundMessage) {
        debug!("inbound message {} from {}", msg.id, msg.from);

        if let Some(ref replier) = self.replier {
            if let Err(e) = replier.reply(&msg).await {
                warn!("auto-reply to {} failed: {e}", msg.from);
            }
        }
        if let Some(ref webhook) = self.webhook {
            webhook.spawn_forward(msg);
        }
    }

    /// Handle messages until the relay drops its sender.
    pub async fn run(self, mut rx: mpsc::Receiver<InboundMessage>) {
        while let Some(msg) = rx.recv().await {
            self.handle(msg).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wagate_channels::testing::FakeClient;
    use wagate_core::config::DatabaseConfig;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_with(rows: &[(&str, &str)]) -> KeywordStore {
        let config = DatabaseConfig {
            url: Some("sqlite::memory:".into()),
            max_connections: 1,
            ..Default::default()
        };
        let store = KeywordStore::connect(&config).await.unwrap();
        sqlx::query("CREATE TABLE message (keyword TEXT, message TEXT)")
            .execute(store.pool())
            .await
            .unwrap();
        for (keyword, message) in rows {
            sqlx::query("INSERT INTO message (keyword, message) VALUES (?, ?)")
                .bind(*keyword)
                .bind(*message)
                .execute(store.pool())
                .await
                .unwrap();
        }
        store
    }

    fn inbound(body: &str, from_me: bool) -> InboundMessage {
        serde_json::from_value(json!({
            "id": "m1",
            "from": "5511999887766@c.us",
            "body": body,
            "fromMe": from_me,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_keyword_hit_replies_to_sender() {
        let client = Arc::new(FakeClient::new());
        let replier = AutoReplier::new(client.clone(), store_with(&[("price", "R$ 10")]).await);

        assert!(replier.reply(&inbound("PRICE", false)).await.unwrap());
        assert_eq!(
            client.sent(),
            vec![(
                "5511999887766@c.us".to_string(),
                OutgoingContent::Text("R$ 10".into())
            )]
        );
    }

    #[tokio::test]
    async fn test_keyword_miss_sends_nothing() {
        let client = Arc::new(FakeClient::new());
        let replier = AutoReplier::new(client.clone(), store_with(&[("price", "R$ 10")]).await);

        assert!(!replier.reply(&inbound("hours?", false)).await.unwrap());
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn test_own_messages_are_ignored() {
        let client = Arc::new(FakeClient::new());
        let replier = AutoReplier::new(client.clone(), store_with(&[("price", "R$ 10")]).await);

        assert!(!replier.reply(&inbound("price", true)).await.unwrap());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_handler_forwards_to_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"msg": {"body": "hello"}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let webhook = WebhookForwarder::new(reqwest::Client::new(), server.uri());
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(InboundHandler::new(Some(webhook), None).run(rx));

        tx.send(inbound("hello", false)).await.unwrap();
        drop(tx);
        task.await.unwrap();

        // Delivery is spawned; give it a moment before the mock verifies.
        for _ in 0..50 {
            if !server.received_requests().await.unwrap_or_default().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    }
}
