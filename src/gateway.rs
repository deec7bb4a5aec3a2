//! Gateway: wires the messaging client, the session relay, inbound handling
//! and the HTTP API together, and owns graceful shutdown.

use crate::api::{self, ApiState};
use crate::inbound::{AutoReplier, InboundHandler};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use wagate_channels::{Relay, WebhookForwarder};
use wagate_core::{config::Config, traits::MessagingClient};
use wagate_memory::KeywordStore;

/// Queue depth between the relay and the inbound handler.
const INBOUND_BUFFER: usize = 64;

pub struct Gateway {
    config: Config,
    client: Arc<dyn MessagingClient>,
    store: Option<KeywordStore>,
    http: reqwest::Client,
}

impl Gateway {
    pub fn new(
        config: Config,
        client: Arc<dyn MessagingClient>,
        store: Option<KeywordStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            config,
            client,
            store,
            http,
        }
    }

    /// Run until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        let relay = Relay::new(self.client.clone())
            .with_restart_on_auth_fail(self.config.client.restart_on_auth_fail)
            .with_inbound(inbound_tx);

        let events = self.client.start().await?;
        let relay_handle = tokio::spawn(relay.clone().run(events));
        let inbound_handle = tokio::spawn(self.inbound_handler().run(inbound_rx));

        // The API stays up while the session comes up or fails.
        if let Err(e) = self.client.initialize().await {
            error!("{} client initialization failed: {e}", self.client.name());
        }

        let state = ApiState::new(
            self.client.clone(),
            relay,
            self.http.clone(),
            self.config.formatter.default_country_code.clone(),
        );
        let app = api::build_router(state, self.config.gateway.static_dir.as_deref());
        let addr = format!("{}:{}", self.config.gateway.host, self.config.gateway.port);
        let served = api::serve(app, &addr, shutdown_signal()).await;

        self.shutdown(&relay_handle, &inbound_handle).await;
        served.map_err(Into::into)
    }

    fn inbound_handler(&self) -> InboundHandler {
        let webhook = WebhookForwarder::from_config(self.http.clone(), &self.config.webhook);
        if let Some(ref w) = webhook {
            info!("forwarding inbound messages to {}", w.url());
        }

        let replier = match (self.config.autoreply.enabled, &self.store) {
            (true, Some(store)) => {
                info!("keyword auto-reply enabled");
                Some(AutoReplier::new(self.client.clone(), store.clone()))
            }
            (true, None) => {
                warn!("autoreply is enabled but no keyword store is connected");
                None
            }
            (false, _) => None,
        };

        InboundHandler::new(webhook, replier)
    }

    async fn shutdown(
        &self,
        relay_handle: &tokio::task::JoinHandle<()>,
        inbound_handle: &tokio::task::JoinHandle<()>,
    ) {
        info!("Shutting down...");
        if let Err(e) = self.client.stop().await {
            warn!("failed to stop {} client: {e}", self.client.name());
        }
        relay_handle.abort();
        inbound_handle.abort();
        if let Some(ref store) = self.store {
            store.close().await;
        }
        info!("Shutdown complete.");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
