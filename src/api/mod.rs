//! HTTP API and realtime channel.
//!
//! `POST /send-message`, `/send-media`, `/send-group-message` and
//! `/clear-message` accept JSON or form-encoded bodies and answer
//! `{status, response}` on success or `{status, kind, message|response}` on
//! failure. `GET /ws` streams session status to browsers; `GET /` serves the
//! pairing page.

mod error;
mod extract;
mod handlers;
mod media;
mod socket;


use axum::{extract::DefaultBodyLimit, response::Html, routing::get, routing::post, Router};
use std::future::Future;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use wagate_channels::Relay;
use wagate_core::{error::GatewayError, traits::MessagingClient};

/// Built-in pairing page.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Request body cap. Media is fetched by URL, so bodies stay small.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    client: Arc<dyn MessagingClient>,
    relay: Relay,
    http: reqwest::Client,
    country_code: String,
}

impl ApiState {
    pub fn new(
        client: Arc<dyn MessagingClient>,
        relay: Relay,
        http: reqwest::Client,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            client,
            relay,
            http,
            country_code: country_code.into(),
        }
    }
}

/// `GET /`: built-in landing page.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Build the axum router. `static_dir` replaces the built-in landing page.
pub fn build_router(state: ApiState, static_dir: Option<&str>) -> Router {
    let router = Router::new()
        .route("/ws", get(socket::ws_handler))
        .route("/send-message", post(handlers::send_message))
        .route("/send-media", post(handlers::send_media))
        .route("/send-group-message", post(handlers::send_group_message))
        .route("/clear-message", post(handlers::clear_message));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.route("/", get(index)),
    };

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on `addr` until `shutdown` resolves.
pub async fn serve<F>(app: Router, addr: &str, shutdown: F) -> Result<(), GatewayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("API server stopped");
    Ok(())
}
