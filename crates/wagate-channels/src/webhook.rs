//! Outbound webhook for inbound messages. Fire-and-forget, no retry.

use serde_json::json;
use tracing::{debug, warn};
use wagate_core::{config::WebhookConfig, error::GatewayError, message::InboundMessage};

/// Posts every inbound message to a configured URL as `{"msg": <message>}`.
#[derive(Clone)]
pub struct WebhookForwarder {
    http: reqwest::Client,
    url: String,
}

impl WebhookForwarder {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Build a forwarder if the webhook is enabled.
    pub fn from_config(http: reqwest::Client, config: &WebhookConfig) -> Option<Self> {
        (config.enabled && !config.url.trim().is_empty())
            .then(|| Self::new(http, config.url.trim()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver one message. The response body is ignored.
    pub async fn forward(&self, msg: &InboundMessage) -> Result<(), GatewayError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&json!({ "msg": msg }))
            .send()
            .await
            .map_err(|e| GatewayError::Client(format!("webhook delivery failed: {e}")))?;

        debug!("webhook {} answered {}", self.url, resp.status());
        Ok(())
    }

    /// Deliver in the background; failures are logged and dropped.
    pub fn spawn_forward(&self, msg: InboundMessage) {
        let forwarder = self.clone();
        tokio::spawn(async move {
            if let Err(e) = forwarder.forward(&msg).await {
                warn!("{e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn inbound() -> InboundMessage {
        serde_json::from_value(json!({
            "id": "m1",
            "from": "5511999887766@c.us",
            "body": "oi"
        }))
        .unwrap()
    }

    #[test]
    fn test_disabled_config_builds_nothing() {
        let cfg = WebhookConfig {
            enabled: false,
            url: "http://x".into(),
        };
        assert!(WebhookForwarder::from_config(reqwest::Client::new(), &cfg).is_none());

        let cfg = WebhookConfig {
            enabled: true,
            url: "  ".into(),
        };
        assert!(WebhookForwarder::from_config(reqwest::Client::new(), &cfg).is_none());
    }

    #[tokio::test]
    async fn test_forward_posts_msg_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({"msg": {"id": "m1", "body": "oi"}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let fwd = WebhookForwarder::new(reqwest::Client::new(), format!("{}/hook", server.uri()));
        fwd.forward(&inbound()).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fwd = WebhookForwarder::new(reqwest::Client::new(), server.uri());
        assert!(fwd.forward(&inbound()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_target_errors() {
        let fwd = WebhookForwarder::new(reqwest::Client::new(), "http://127.0.0.1:1/hook");
        assert!(matches!(
            fwd.forward(&inbound()).await,
            Err(GatewayError::Client(_))
        ));
    }
}
